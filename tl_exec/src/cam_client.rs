//! # Camera Client
//!
//! The camera client receives frames from the vehicle's camera stream. Frames are returned in the
//! order they arrive. Only the newest frame is queued by the socket, so a slow consumer skips
//! stale frames rather than falling behind.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::convert::TryFrom;

use comms_if::{
    eqpt::cam::*,
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The camera client
pub struct CamClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CamClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not recieve a message from the camera stream: {0}")]
    RecvError(zmq::Error),

    #[error("Could not deserialize the frame: {0}")]
    DeserializeError(serde_json::Error),

    #[error("Could not decode the frame: {0}")]
    FrameError(CamError),

    #[error("The camera stream sent a message which was not valid UTF-8")]
    NonUtf8Message,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CamClient {
    /// Create a new instance of the camera client.
    ///
    /// This function will not block until the stream connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, CamClientError> {
        // Create the socket options
        let socket_options = SocketOptions {
            conflate: true,
            ..SocketOptions::subscriber(100)
        };

        // Connect the socket
        let socket = MonitoredSocket::new(ctx, zmq::SUB, socket_options, &params.cam_endpoint)
            .map_err(CamClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// Receive the next frame from the stream.
    ///
    /// Returns `None` if no frame arrived within the client's `recv_timeout`.
    pub fn recieve_frame(&mut self) -> Result<Option<CamFrame>, CamClientError> {
        let msg = match self.socket.recv_string(0) {
            // Valid message
            Ok(Ok(s)) => s,
            // Invalid message
            Ok(Err(_)) => return Err(CamClientError::NonUtf8Message),
            // No message
            Err(zmq::Error::EAGAIN) => return Ok(None),
            // Recv error
            Err(e) => return Err(CamClientError::RecvError(e)),
        };

        serde_json::from_str(&msg)
            .map(Some)
            .map_err(CamClientError::DeserializeError)
    }

    /// Receive and decode the next frame from the stream.
    ///
    /// Returns `None` if no frame arrived within the client's `recv_timeout`.
    pub fn recieve_image(&mut self) -> Result<Option<CamImage>, CamClientError> {
        let frame = match self.recieve_frame()? {
            Some(f) => f,
            None => return Ok(None),
        };

        CamImage::try_from(&frame)
            .map(Some)
            .map_err(CamClientError::FrameError)
    }

    /// Return if the stream is connected or not.
    pub fn is_connected(&self) -> bool {
        self.socket.connected()
    }
}
