//! # Traffic Waypoint Server
//!
//! Publishes the traffic waypoint to the planner. Only the latest value matters, so the socket
//! keeps a single message queued and drops anything older.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    veh::TrafficWaypoint,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Traffic waypoint server
pub struct TrafficWpServer {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrafficWpServerError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not send the traffic waypoint: {0}")]
    SendError(zmq::Error),

    #[error("Could not serialize the traffic waypoint: {0}")]
    SerializationError(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TrafficWpServer {
    /// Create a new instance of the server.
    ///
    /// This function will not block until a subscriber connects.
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, TrafficWpServerError> {
        // Create the socket options
        let socket_options = SocketOptions {
            conflate: true,
            ..SocketOptions::publisher()
        };

        // Bind the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::PUB,
            socket_options,
            &params.traffic_wp_endpoint,
        )
        .map_err(TrafficWpServerError::SocketError)?;

        Ok(Self { socket })
    }

    /// Publish a traffic waypoint.
    pub fn send(&mut self, traffic_wp: TrafficWaypoint) -> Result<(), TrafficWpServerError> {
        let msg =
            serde_json::to_string(&traffic_wp).map_err(TrafficWpServerError::SerializationError)?;

        self.socket
            .send(msg.as_str(), 0)
            .map_err(TrafficWpServerError::SendError)
    }
}
