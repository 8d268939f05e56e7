//! # Light Classifier Communications Module
//!
//! Requests sent to, and responses received from, an external traffic light classification
//! server.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::cam::CamFrame;
use crate::veh::LightState;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Request to classify the state of one light in a camera frame.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClassifyRequest {
    /// Name of the classifier the server should use
    pub classifier_name: String,

    /// The frame to classify
    pub frame: CamFrame,

    /// Approximate position of the light in the map frame
    pub light_position_m: Vector3<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Response from the classifier server
#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum ClassifyResponse {
    /// The classified state of the light
    State(LightState),

    /// The server couldn't classify the frame
    Error(String),
}
