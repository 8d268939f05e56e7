//! # Waypoint Client
//!
//! Receives the base path from the path planner. The path is only needed once, at startup, and
//! the planner republishes it periodically so late subscribers still receive it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::time::{Duration, Instant};

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    veh::Lane,
};
use log::{info, warn};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// How often to log that the client is still waiting
const WAIT_LOG_PERIOD: Duration = Duration::from_secs(5);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct WaypointClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WaypointClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not recieve a message from the planner: {0}")]
    RecvError(zmq::Error),

    #[error("No path was received within {0:?}")]
    Timeout(Duration),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WaypointClient {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, WaypointClientError> {
        // Create the socket options
        let socket_options = SocketOptions::subscriber(100);

        // Connect the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            socket_options,
            &params.base_waypoints_endpoint,
        )
        .map_err(WaypointClientError::SocketError)?;

        Ok(Self { socket })
    }

    /// Block until the path is received.
    ///
    /// If `timeout` is `None` this waits forever. Malformed messages are logged and skipped.
    pub fn wait_for_lane(&mut self, timeout: Option<Duration>) -> Result<Lane, WaypointClientError> {
        let start = Instant::now();
        let mut last_log = start;

        loop {
            let now = Instant::now();

            if let Some(t) = timeout {
                if now.duration_since(start) > t {
                    return Err(WaypointClientError::Timeout(t));
                }
            }

            if now.duration_since(last_log) > WAIT_LOG_PERIOD {
                info!(
                    "Still waiting for the base path ({:.0} s)",
                    now.duration_since(start).as_secs_f64()
                );
                last_log = now;
            }

            let msg = match self.socket.recv_string(0) {
                Ok(Ok(s)) => s,
                Ok(Err(_)) => {
                    warn!("Non UTF-8 message from the planner");
                    continue;
                }
                Err(zmq::Error::EAGAIN) => continue,
                Err(e) => return Err(WaypointClientError::RecvError(e)),
            };

            match serde_json::from_str::<Lane>(&msg) {
                Ok(lane) => return Ok(lane),
                Err(e) => warn!("Could not deserialize the base path: {}", e),
            }
        }
    }
}
