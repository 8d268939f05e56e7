//! Socket options

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use zmq::{Socket, SocketType};

use super::MonitoredSocketError;

// ------------------------------------------------------------------------------------------------
// MACROS
// ------------------------------------------------------------------------------------------------

/// Call each setter on the socket, naming the option in any error.
macro_rules! set_sockopts {
    ($socket:expr, $(($opt:ident, $val:expr)),+) => {
        $(
            $socket.$opt($val)
                .map_err(|e| MonitoredSocketError::SocketOptionError(stringify!($opt).into(), e))?;
        )+
    };
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Options applied to a [`super::MonitoredSocket`].
///
/// Times are in milliseconds. Fields named after a `ZMQ_*` option are passed straight to
/// [`zmq_setsockopt`](http://api.zeromq.org/4-2:zmq-setsockopt), the rest control how the socket
/// is set up.
#[derive(Debug, Clone)]
pub struct SocketOptions {
    /// Bind to the endpoint instead of connecting to it. Default `false`.
    pub bind: bool,

    /// Wait in `MonitoredSocket::new` until the first connection is made, failing if it isn't
    /// made within `connect_timeout`. Default `true`.
    pub block_on_first_connect: bool,

    /// `ZMQ_CONNECT_TIMEOUT`
    pub connect_timeout: i32,

    /// `ZMQ_HEARTBEAT_IVL`
    pub heartbeat_ivl: i32,

    /// `ZMQ_HEARTBEAT_TIMEOUT`
    pub heartbeat_timeout: i32,

    /// `ZMQ_HEARTBEAT_TTL`
    pub heartbeat_ttl: i32,

    /// `ZMQ_LINGER`
    pub linger: i32,

    /// `ZMQ_RECONNECT_IVL`
    pub reconnect_ivl: i32,

    /// `ZMQ_RECONNECT_IVL_MAX`
    pub reconnect_ivl_max: i32,

    /// `ZMQ_RCVTIMEO`, -1 blocks forever. A timed out receive returns `EAGAIN`.
    pub recv_timeout: i32,

    /// `ZMQ_SNDTIMEO`
    pub send_timeout: i32,

    /// `ZMQ_REQ_CORRELATE`, REQ sockets only
    pub req_correlate: bool,

    /// `ZMQ_REQ_RELAXED`, REQ sockets only
    pub req_relaxed: bool,

    /// `ZMQ_CONFLATE`, only the newest message is queued
    pub conflate: bool,

    /// `ZMQ_SUBSCRIBE`, SUB sockets only. The empty prefix receives everything.
    pub subscribe: Vec<u8>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SocketOptions {
    /// Options for a client subscribing to a stream.
    ///
    /// The publisher may start after the client, so construction doesn't wait for it. Receives
    /// time out after `recv_timeout` ms.
    pub fn subscriber(recv_timeout: i32) -> Self {
        Self {
            block_on_first_connect: false,
            recv_timeout,
            ..Self::client()
        }
    }

    /// Options for a bound publisher.
    pub fn publisher() -> Self {
        Self {
            bind: true,
            block_on_first_connect: false,
            ..Self::client()
        }
    }

    /// Options for a client making requests, waiting at most `recv_timeout` ms for each reply.
    ///
    /// A new request may be sent after a reply times out, and late replies to old requests are
    /// discarded.
    pub fn requester(recv_timeout: i32) -> Self {
        Self {
            block_on_first_connect: false,
            recv_timeout,
            req_correlate: true,
            req_relaxed: true,
            ..Self::client()
        }
    }

    /// Shared heartbeat and timeout settings.
    fn client() -> Self {
        Self {
            connect_timeout: 1000,
            heartbeat_ivl: 500,
            heartbeat_ttl: 1000,
            heartbeat_timeout: 1000,
            linger: 1,
            recv_timeout: 10,
            send_timeout: 10,
            ..Default::default()
        }
    }

    /// Apply the options to `socket`. Must be called before it connects or binds.
    pub fn set(&self, socket: &Socket) -> Result<(), MonitoredSocketError> {
        set_sockopts!(
            socket,
            (set_connect_timeout, self.connect_timeout),
            (set_heartbeat_ivl, self.heartbeat_ivl),
            (set_heartbeat_timeout, self.heartbeat_timeout),
            (set_heartbeat_ttl, self.heartbeat_ttl),
            (set_linger, self.linger),
            (set_reconnect_ivl, self.reconnect_ivl),
            (set_reconnect_ivl_max, self.reconnect_ivl_max),
            (set_rcvtimeo, self.recv_timeout),
            (set_sndtimeo, self.send_timeout)
        );

        if self.conflate {
            set_sockopts!(socket, (set_conflate, true));
        }

        match socket.get_socket_type() {
            Ok(SocketType::REQ) => {
                set_sockopts!(
                    socket,
                    (set_req_correlate, self.req_correlate),
                    (set_req_relaxed, self.req_relaxed)
                );
            }
            Ok(SocketType::SUB) => {
                set_sockopts!(socket, (set_subscribe, &self.subscribe));
            }
            _ => (),
        }

        Ok(())
    }
}

impl Default for SocketOptions {
    /// libzmq's own defaults, see http://api.zeromq.org/4-2:zmq-setsockopt
    fn default() -> Self {
        Self {
            bind: false,
            block_on_first_connect: true,
            connect_timeout: 0,
            heartbeat_ivl: 0,
            heartbeat_timeout: 0,
            heartbeat_ttl: 0,
            linger: 30_000,
            reconnect_ivl: 100,
            reconnect_ivl_max: 0,
            recv_timeout: -1,
            send_timeout: -1,
            req_correlate: false,
            req_relaxed: false,
            conflate: false,
            subscribe: Vec::new(),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_presets() {
        let sub = SocketOptions::subscriber(100);
        assert!(!sub.bind);
        assert!(!sub.block_on_first_connect);
        assert_eq!(sub.recv_timeout, 100);
        assert!(sub.subscribe.is_empty());

        let publ = SocketOptions::publisher();
        assert!(publ.bind);
        assert!(!publ.block_on_first_connect);

        let req = SocketOptions::requester(500);
        assert!(req.req_correlate && req.req_relaxed);
        assert_eq!(req.recv_timeout, 500);
    }

    #[test]
    fn test_set_on_sockets() -> Result<(), MonitoredSocketError> {
        let ctx = zmq::Context::new();

        for (socket_type, opts) in vec![
            (zmq::SUB, SocketOptions::subscriber(10)),
            (zmq::REQ, SocketOptions::requester(10)),
            (
                zmq::PUB,
                SocketOptions {
                    conflate: true,
                    ..SocketOptions::publisher()
                },
            ),
        ] {
            let socket = ctx
                .socket(socket_type)
                .map_err(MonitoredSocketError::CreateSocketError)?;
            opts.set(&socket)?;

            assert_eq!(socket.get_rcvtimeo().unwrap(), 10);
            assert_eq!(socket.get_linger().unwrap(), 1);
        }

        Ok(())
    }
}
