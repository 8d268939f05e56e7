//! # Camera Equipment Communications Module

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;

use base64::DecodeError;
use chrono::{serde::ts_milliseconds, DateTime, Utc};
use image::{Bgr, ImageBuffer};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// Decoded image buffer in BGR order with 8 bits per channel.
pub type BgrImage = ImageBuffer<Bgr<u8>, Vec<u8>>;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A raw frame from the vehicle's camera, as sent over the network.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CamFrame {
    /// UTC timestamp at which the frame was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Width of the image in pixels
    pub width: u32,

    /// Height of the image in pixels
    pub height: u32,

    /// Pixel layout of the raw data
    pub encoding: PixelEncoding,

    /// The raw pixel data (row major, 3 bytes per pixel) encoded in base64.
    pub b64_data: String,
}

/// A decoded camera frame.
#[derive(Debug, Clone)]
pub struct CamImage {
    /// UTC timestamp at which the frame was acquired
    pub timestamp: DateTime<Utc>,

    /// The image itself
    pub image: BgrImage,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Pixel layouts the camera stream may use.
#[derive(Debug, Serialize, Deserialize, Copy, Clone, Eq, PartialEq)]
pub enum PixelEncoding {
    /// 8 bit blue, green, red
    Bgr8,

    /// 8 bit red, green, blue
    Rgb8,
}

#[derive(Debug, thiserror::Error, Clone)]
pub enum CamError {
    #[error("Failed to decode camera frame from base64: {0}")]
    FrameDecodeError(DecodeError),

    #[error("The frame data was the wrong size for a {0}x{1} image ({2} bytes)")]
    FrameWrongSize(u32, u32, usize),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TryFrom<&CamFrame> for CamImage {
    type Error = CamError;

    fn try_from(frame: &CamFrame) -> Result<Self, Self::Error> {
        let mut bytes = base64::decode(&frame.b64_data).map_err(CamError::FrameDecodeError)?;
        let num_bytes = bytes.len();

        // Image buffers accept oversized data, so check for an exact fit here
        if num_bytes != frame.width as usize * frame.height as usize * 3 {
            return Err(CamError::FrameWrongSize(frame.width, frame.height, num_bytes));
        }

        // Reorder into BGR if needed
        if frame.encoding == PixelEncoding::Rgb8 {
            for pixel in bytes.chunks_exact_mut(3) {
                pixel.swap(0, 2);
            }
        }

        let image = ImageBuffer::from_raw(frame.width, frame.height, bytes)
            .ok_or(CamError::FrameWrongSize(frame.width, frame.height, num_bytes))?;

        Ok(Self {
            timestamp: frame.timestamp,
            image,
        })
    }
}

impl CamImage {
    /// Convert this camera image into a frame which can be sent over the network.
    pub fn to_cam_frame(&self) -> CamFrame {
        CamFrame {
            timestamp: self.timestamp,
            width: self.image.width(),
            height: self.image.height(),
            encoding: PixelEncoding::Bgr8,
            b64_data: base64::encode(self.image.as_raw()),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn frame(encoding: PixelEncoding, data: &[u8], width: u32, height: u32) -> CamFrame {
        CamFrame {
            timestamp: Utc::now(),
            width,
            height,
            encoding,
            b64_data: base64::encode(data),
        }
    }

    #[test]
    fn test_decode_bgr() -> Result<(), CamError> {
        let data = [10, 20, 30, 40, 50, 60];
        let image = CamImage::try_from(&frame(PixelEncoding::Bgr8, &data, 2, 1))?;

        assert_eq!(image.image.dimensions(), (2, 1));
        assert_eq!(image.image.get_pixel(0, 0), &Bgr([10, 20, 30]));
        assert_eq!(image.image.get_pixel(1, 0), &Bgr([40, 50, 60]));

        Ok(())
    }

    #[test]
    fn test_decode_rgb() -> Result<(), CamError> {
        let data = [255, 0, 0, 0, 0, 255];
        let image = CamImage::try_from(&frame(PixelEncoding::Rgb8, &data, 1, 2))?;

        assert_eq!(image.image.get_pixel(0, 0), &Bgr([0, 0, 255]));
        assert_eq!(image.image.get_pixel(0, 1), &Bgr([255, 0, 0]));

        Ok(())
    }

    #[test]
    fn test_wrong_size() {
        let data = [1, 2, 3];
        assert!(matches!(
            CamImage::try_from(&frame(PixelEncoding::Bgr8, &data, 2, 2)),
            Err(CamError::FrameWrongSize(2, 2, 3))
        ));
    }

    #[test]
    fn test_bad_base64() {
        let mut f = frame(PixelEncoding::Bgr8, &[0, 0, 0], 1, 1);
        f.b64_data = String::from("not*base64");

        assert!(matches!(
            CamImage::try_from(&f),
            Err(CamError::FrameDecodeError(_))
        ));
    }

    #[test]
    fn test_to_cam_frame() -> Result<(), CamError> {
        let data = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12];
        let original = frame(PixelEncoding::Bgr8, &data, 2, 2);
        let image = CamImage::try_from(&original)?;

        let sent = image.to_cam_frame();
        assert_eq!(sent.encoding, PixelEncoding::Bgr8);
        assert_eq!((sent.width, sent.height), (2, 2));
        assert_eq!(sent.b64_data, original.b64_data);

        Ok(())
    }
}
