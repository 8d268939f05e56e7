//! # Network Module
//!
//! ZeroMQ sockets wrapped with connection monitoring, the option sets the executables use for
//! them, and the endpoints they connect to.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod options;
mod socket;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use options::SocketOptions;
pub use socket::{MonitoredSocket, MonitoredSocketError};

// Export zmq
pub use zmq;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network endpoints used by the traffic light detector.
#[derive(Debug, Clone, Deserialize)]
pub struct NetParams {
    /// Vehicle state stream (poses and traffic light arrays), SUB
    pub veh_state_endpoint: String,

    /// Camera frame stream, SUB
    pub cam_endpoint: String,

    /// Base waypoints stream, SUB
    pub base_waypoints_endpoint: String,

    /// Light classifier server, REQ
    pub classifier_endpoint: String,

    /// Traffic waypoint output, PUB (bound)
    pub traffic_wp_endpoint: String,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
