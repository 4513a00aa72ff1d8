//! # MQTT Session Abstraction
//!
//! This module defines the `MqttSession` trait, the seam between the link and
//! the MQTT protocol library that actually talks to the broker. Packet
//! encoding, QoS bookkeeping and the TCP/TLS socket all live behind it, which
//! keeps the link independent of any particular client implementation.
//!
//! With the Rust 2024 Edition, this trait uses native `async fn`, removing the
//! need for the `#[async_trait]` macro.

use core::fmt;

/// The connection state code reported by the underlying MQTT client.
///
/// Negative codes describe transport-level conditions detected by the client
/// itself, positive codes mirror the `CONNACK` return codes sent by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// The broker did not answer within the client's keep-alive window.
    ConnectionTimeout,
    /// The network connection was broken.
    ConnectionLost,
    /// The network connection could not be opened.
    ConnectFailed,
    /// The client is cleanly disconnected.
    Disconnected,
    /// The client is connected.
    Connected,
    /// The broker does not support the requested protocol version.
    BadProtocol,
    /// The broker rejected the client identifier.
    BadClientId,
    /// The broker is unable to accept the connection.
    Unavailable,
    /// The username or password was rejected.
    BadCredentials,
    /// The client is not authorized to connect.
    Unauthorized,
    /// A code the client library reported that has no known meaning.
    Other(i8),
}

impl SessionState {
    /// Returns the raw state code.
    pub fn code(self) -> i8 {
        match self {
            Self::ConnectionTimeout => -4,
            Self::ConnectionLost => -3,
            Self::ConnectFailed => -2,
            Self::Disconnected => -1,
            Self::Connected => 0,
            Self::BadProtocol => 1,
            Self::BadClientId => 2,
            Self::Unavailable => 3,
            Self::BadCredentials => 4,
            Self::Unauthorized => 5,
            Self::Other(code) => code,
        }
    }

    /// Returns a short human-readable description of the state.
    pub fn reason(self) -> &'static str {
        match self {
            Self::ConnectionTimeout => "connection timeout",
            Self::ConnectionLost => "connection lost",
            Self::ConnectFailed => "connect failed",
            Self::Disconnected => "disconnected",
            Self::Connected => "connected",
            Self::BadProtocol => "connect bad protocol",
            Self::BadClientId => "connect bad client id",
            Self::Unavailable => "server unavailable",
            Self::BadCredentials => "connect bad credentials",
            Self::Unauthorized => "connect unauthorized",
            Self::Other(_) => "unknown state",
        }
    }
}

impl From<i8> for SessionState {
    fn from(code: i8) -> Self {
        match code {
            -4 => Self::ConnectionTimeout,
            -3 => Self::ConnectionLost,
            -2 => Self::ConnectFailed,
            -1 => Self::Disconnected,
            0 => Self::Connected,
            1 => Self::BadProtocol,
            2 => Self::BadClientId,
            3 => Self::Unavailable,
            4 => Self::BadCredentials,
            5 => Self::Unauthorized,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.reason(), self.code())
    }
}

/// Parameters of a single connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectRequest<'a> {
    /// Client identifier presented to the broker.
    pub client_id: &'a str,
    /// Username, `None` when the broker is used anonymously.
    pub username: Option<&'a str>,
    /// Password, only meaningful together with a username.
    pub password: Option<&'a str>,
}

/// An application message delivered by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InboundMessage<'a> {
    /// The topic the message was published to.
    pub topic: &'a str,
    /// The raw payload bytes.
    pub payload: &'a [u8],
}

/// The MQTT client the link drives.
///
/// Implementations wrap a concrete protocol library together with its network
/// transport. All methods report failures through `Self::Error`; the detailed
/// reason for a refused connection is read back through [`state`].
///
/// [`state`]: MqttSession::state
#[allow(async_fn_in_trait)]
pub trait MqttSession {
    /// The error type returned by the session.
    type Error: core::fmt::Debug;

    /// Sets the broker the next `connect` call will reach.
    fn set_server(&mut self, host: &str, port: u16);

    /// Opens the connection and performs the MQTT handshake.
    async fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), Self::Error>;

    /// Closes the connection.
    async fn disconnect(&mut self);

    /// Returns `true` while the client believes it is connected.
    fn is_connected(&self) -> bool;

    /// Returns the last state code observed by the client.
    fn state(&self) -> SessionState;

    /// Subscribes to a topic filter.
    async fn subscribe(&mut self, topic: &str) -> Result<(), Self::Error>;

    /// Publishes a payload to a topic.
    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), Self::Error>;

    /// Services the connection and returns the next inbound message, if any.
    ///
    /// Returning `Ok(None)` right away when nothing is pending is fine;
    /// `MqttLink::run` yields to the executor before polling again.
    ///
    /// The future must be cancel-safe: `MqttLink::run` drops it whenever the
    /// supervisor ticker fires first.
    async fn poll(&mut self) -> Result<Option<InboundMessage<'_>>, Self::Error>;
}
