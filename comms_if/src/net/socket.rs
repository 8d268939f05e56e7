//! Monitored sockets

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

use log::{debug, trace, warn};
use zmq::{Context, Socket, SocketEvent, SocketType};

use super::SocketOptions;

// ------------------------------------------------------------------------------------------------
// STATICS
// ------------------------------------------------------------------------------------------------

/// Counter used to give each monitor a unique inproc endpoint
static NEXT_MONITOR_ID: AtomicUsize = AtomicUsize::new(0);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A zmq socket paired with a monitor which tracks whether it is connected.
///
/// The monitor runs on its own thread and ends when the socket is closed. The socket itself is
/// reached through `Deref`.
pub struct MonitoredSocket {
    socket: Socket,

    monitor_endpoint: String,

    monitor_jh: Option<thread::JoinHandle<()>>,

    shutdown: Arc<AtomicBool>,

    connected: Arc<AtomicBool>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum MonitoredSocketError {
    #[error("Error creating the socket: {0}")]
    CreateSocketError(zmq::Error),

    #[error("Error enabling monitoring for the socket: {0}")]
    MonitoringEnableError(zmq::Error),

    #[error("Could not connect the socket: {0:?}")]
    CouldNotConnect(Option<zmq::Error>),

    #[error("Could not read event from monitor socket: {0}")]
    EventReadError(zmq::Error),

    #[error("Could not set the {0} socket option: {1}")]
    SocketOptionError(String, zmq::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MonitoredSocket {
    /// Create a socket of type `socket_type`, apply `options` and connect (or bind) it to
    /// `endpoint`, for example `"tcp://localhost:5030"`.
    ///
    /// If `options.block_on_first_connect` is set this waits for the first connection.
    pub fn new(
        ctx: &Context,
        socket_type: SocketType,
        options: SocketOptions,
        endpoint: &str,
    ) -> Result<Self, MonitoredSocketError> {
        let socket = ctx
            .socket(socket_type)
            .map_err(MonitoredSocketError::CreateSocketError)?;

        // The monitor is attached before connecting so no events are missed
        let monitor_endpoint = format!(
            "inproc://monitor_{}",
            NEXT_MONITOR_ID.fetch_add(1, Ordering::Relaxed)
        );
        socket
            .monitor(&monitor_endpoint, SocketEvent::ALL as i32)
            .map_err(MonitoredSocketError::MonitoringEnableError)?;
        let monitor = ctx
            .socket(zmq::PAIR)
            .map_err(MonitoredSocketError::CreateSocketError)?;
        monitor
            .connect(&monitor_endpoint)
            .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        options.set(&socket)?;

        if options.bind {
            socket.bind(endpoint)
        } else {
            socket.connect(endpoint)
        }
        .map_err(|e| MonitoredSocketError::CouldNotConnect(Some(e)))?;

        let connected = Arc::new(AtomicBool::new(false));
        if options.block_on_first_connect {
            wait_for_connection(&monitor)?;
            connected.store(true, Ordering::Relaxed);
        }

        let shutdown = Arc::new(AtomicBool::new(false));

        let monitor_jh = {
            let shutdown = shutdown.clone();
            let connected = connected.clone();
            let endpoint = monitor_endpoint.clone();
            thread::spawn(move || monitor_thread(monitor, endpoint, shutdown, connected))
        };

        debug!("Socket {:?} on {} monitored by {}", socket_type, endpoint, monitor_endpoint);

        Ok(Self {
            socket,
            monitor_endpoint,
            monitor_jh: Some(monitor_jh),
            shutdown,
            connected,
        })
    }

    /// True if the socket currently has a connected peer.
    pub fn connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

impl Drop for MonitoredSocket {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The monitor may be blocked waiting for an event, so it's left to end on its own once
        // the socket closes
        if self.monitor_jh.take().is_some() {
            trace!("Detached monitor {}", self.monitor_endpoint);
        }
    }
}

impl std::ops::Deref for MonitoredSocket {
    type Target = Socket;

    fn deref(&self) -> &Self::Target {
        &self.socket
    }
}

impl std::ops::DerefMut for MonitoredSocket {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.socket
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Block until the monitor reports the socket connected.
fn wait_for_connection(monitor: &Socket) -> Result<(), MonitoredSocketError> {
    loop {
        match read_event(monitor).map_err(MonitoredSocketError::EventReadError)? {
            SocketEvent::CONNECTED => return Ok(()),
            SocketEvent::CONNECT_DELAYED => continue,
            _ => return Err(MonitoredSocketError::CouldNotConnect(None)),
        }
    }
}

/// Read one event from a monitor.
///
/// Events are two frames: the event id and value, then the peer address which isn't needed.
fn read_event(monitor: &Socket) -> Result<SocketEvent, zmq::Error> {
    let msg = monitor.recv_msg(0)?;

    if msg.len() < 2 {
        return Err(zmq::Error::EINVAL);
    }
    let event = u16::from_ne_bytes([msg[0], msg[1]]);

    if monitor.get_rcvmore()? {
        monitor.recv_msg(0)?;
    }

    Ok(SocketEvent::from_raw(event))
}

/// Track connection events until shutdown or the monitor stops.
fn monitor_thread(
    monitor: Socket,
    endpoint: String,
    shutdown: Arc<AtomicBool>,
    connected: Arc<AtomicBool>,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match read_event(&monitor) {
            Ok(SocketEvent::CONNECTED) => connected.store(true, Ordering::Relaxed),
            Ok(SocketEvent::DISCONNECTED) => connected.store(false, Ordering::Relaxed),
            Ok(SocketEvent::MONITOR_STOPPED) => break,
            Ok(_) => (),
            Err(e) => {
                warn!("Error reading event from monitor {}: {}", endpoint, e);
                break;
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
