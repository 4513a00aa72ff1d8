//! # Error Types
//!
//! This module defines the error types used throughout the link, from topic
//! table overflows to configuration values that do not fit their buffers and
//! failures reported by the underlying MQTT session.

use core::fmt;

/// Reasons a topic registration or main topic update was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RouterError {
    /// Every slot of the routing table is taken by a different suffix.
    TableFull,
    /// The suffix was empty.
    EmptySuffix,
    /// The suffix does not fit the suffix key buffer.
    SuffixTooLong,
    /// The main topic plus the suffix does not fit the topic buffer.
    TopicTooLong,
    /// The main topic does not fit its buffer.
    MainTopicTooLong,
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouterError::TableFull => write!(f, "topic table full"),
            RouterError::EmptySuffix => write!(f, "empty topic suffix"),
            RouterError::SuffixTooLong => write!(f, "topic suffix too long"),
            RouterError::TopicTooLong => write!(f, "full topic too long"),
            RouterError::MainTopicTooLong => write!(f, "main topic too long"),
        }
    }
}

/// Identifies a configuration field in [`ConfigError::FieldTooLong`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigField {
    Host,
    Username,
    Password,
    ClientId,
    StatusTopic,
    BootPayload,
}

impl ConfigField {
    /// Returns the field name as used in JSON settings.
    pub fn name(self) -> &'static str {
        match self {
            ConfigField::Host => "host",
            ConfigField::Username => "username",
            ConfigField::Password => "password",
            ConfigField::ClientId => "client_id",
            ConfigField::StatusTopic => "status_topic",
            ConfigField::BootPayload => "boot_payload",
        }
    }
}

/// Errors produced while building an `MqttConfig`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A value does not fit the buffer reserved for the field.
    FieldTooLong(ConfigField),
    /// The JSON settings document could not be parsed.
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FieldTooLong(field) => write!(f, "{} too long", field.name()),
            ConfigError::Parse => write!(f, "invalid settings document"),
        }
    }
}

/// The primary error enum for link operations.
///
/// It is generic over the session error type `E`, so failures reported by the
/// MQTT library are passed through unchanged.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError<E> {
    /// The routing table refused the request.
    Router(RouterError),
    /// A configuration value was rejected.
    Config(ConfigError),
    /// The MQTT session reported an error.
    Session(E),
}

impl<E> From<RouterError> for LinkError<E> {
    fn from(err: RouterError) -> Self {
        LinkError::Router(err)
    }
}

impl<E> From<ConfigError> for LinkError<E> {
    fn from(err: ConfigError) -> Self {
        LinkError::Config(err)
    }
}

impl<E: fmt::Debug> fmt::Display for LinkError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::Router(e) => write!(f, "router error: {}", e),
            LinkError::Config(e) => write!(f, "config error: {}", e),
            LinkError::Session(e) => write!(f, "session error: {:?}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_the_field() {
        let err = ConfigError::FieldTooLong(ConfigField::ClientId);
        assert_eq!(err.to_string(), "client_id too long");
    }

    #[test]
    fn link_error_wraps_router_and_session_errors() {
        let err: LinkError<&str> = RouterError::TableFull.into();
        assert_eq!(err.to_string(), "router error: topic table full");

        let err: LinkError<&str> = LinkError::Session("socket closed");
        assert_eq!(err.to_string(), "session error: \"socket closed\"");
    }
}
