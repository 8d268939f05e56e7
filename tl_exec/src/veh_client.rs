//! # Vehicle Client
//!
//! The VehClient receives data about the vehicle from the vehicle interface. It currently
//! provides:
//!
//! - The vehicle pose in the map frame.
//! - The set of traffic lights the vehicle can currently see.
//!
//! The vehicle interface publishes as frequently as it can. A background thread receives each
//! message and writes it into the detector's input registers, replacing whatever was there.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
};

use comms_if::{
    net::{zmq, MonitoredSocket, MonitoredSocketError, NetParams, SocketOptions},
    veh::VehData,
};
use log::{error, trace, warn};

use crate::tl_detector::InputRegisters;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct VehClient {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum VehClientError {
    #[error("Socket error: {0}")]
    SocketError(MonitoredSocketError),

    #[error("Could not start the background thread: {0}")]
    ThreadError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl VehClient {
    /// Connect to the vehicle state stream and start writing into `registers`.
    pub fn new(
        ctx: &zmq::Context,
        params: &NetParams,
        registers: InputRegisters,
    ) -> Result<Self, VehClientError> {
        // Create the socket options
        let socket_options = SocketOptions::subscriber(10);

        // Connect the socket
        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            socket_options,
            &params.veh_state_endpoint,
        )
        .map_err(VehClientError::SocketError)?;

        let bg_run = Arc::new(AtomicBool::new(true));
        let bg_run_clone = bg_run.clone();

        // Start BG thread
        let bg_jh = thread::Builder::new()
            .name(String::from("veh_client"))
            .spawn(move || bg_thread(socket, bg_run_clone, registers))
            .map_err(VehClientError::ThreadError)?;

        Ok(Self {
            bg_jh: Some(bg_jh),
            bg_run,
        })
    }

    /// True while the background thread is still receiving
    pub fn is_running(&self) -> bool {
        self.bg_run.load(Ordering::Relaxed)
    }
}

impl Drop for VehClient {
    fn drop(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("VehClient background thread panicked");
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Background thread, updates the registers when the vehicle interface publishes something new.
fn bg_thread(socket: MonitoredSocket, run: Arc<AtomicBool>, registers: InputRegisters) {
    // While instructed to run
    while run.load(Ordering::Relaxed) {
        // Read string from the socket
        let msg = match socket.recv_string(0) {
            Ok(Ok(s)) => s,
            Ok(Err(_)) => {
                warn!("Non UTF-8 message from the vehicle interface");
                continue;
            }
            Err(zmq::Error::EAGAIN) => continue,
            Err(e) => {
                error!("Error receiving message from the vehicle interface: {:?}", e);
                break;
            }
        };

        // Deserialize the message
        let data: VehData = match serde_json::from_str(&msg) {
            Ok(d) => d,
            Err(e) => {
                warn!("Error deserialising message from the vehicle interface: {:?}", e);
                continue;
            }
        };

        match data {
            VehData::Pose(pose) => registers.set_pose(pose),
            VehData::TrafficLights(lights) => {
                trace!("{} traffic lights observed", lights.len());
                registers.set_lights(lights)
            }
        }
    }

    run.store(false, Ordering::Relaxed);
}
