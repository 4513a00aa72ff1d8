//! Broker and link configuration.
//!
//! `MqttConfig` keeps every value in fixed-size `heapless` buffers so a link
//! can be configured without an allocator. Values are validated when they are
//! set; anything that does not fit is rejected instead of being truncated.
//!
//! Settings stored as JSON (for example written by a provisioning page into
//! flash) can be loaded with [`MqttConfig::from_json`].

use embassy_time::Duration;
use heapless::String;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigField};
use crate::session::ConnectRequest;

pub const MAX_HOST_LEN: usize = 64;
pub const MAX_USERNAME_LEN: usize = 32;
pub const MAX_PASSWORD_LEN: usize = 64;
pub const MAX_CLIENT_ID_LEN: usize = 32;
pub const MAX_STATUS_TOPIC_LEN: usize = 128;
pub const MAX_BOOT_PAYLOAD_LEN: usize = 32;

/// Standard unencrypted MQTT port.
pub const DEFAULT_PORT: u16 = 1883;
pub const DEFAULT_CLIENT_ID: &str = "SmartHomeLight";
/// Topic the boot announcement is published to after every connect.
pub const DEFAULT_STATUS_TOPIC: &str = "sss/shs/5C:CF:7F:68:13:FB/info";
pub const DEFAULT_BOOT_PAYLOAD: &str = "boot";
/// Number of failed connect attempts tolerated before the link gives up.
pub const DEFAULT_RETRY_BUDGET: u8 = 10;
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(5);

fn bounded<const N: usize>(value: &str, field: ConfigField) -> Result<String<N>, ConfigError> {
    let mut s = String::new();
    s.push_str(value)
        .map_err(|_| ConfigError::FieldTooLong(field))?;
    Ok(s)
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() { None } else { Some(value) }
}

/// Connection settings for an `MqttLink`.
///
/// # Example
///
/// ```ignore
/// let config = MqttConfig::new("broker.local")?
///     .with_port(1883)
///     .with_credentials("light", "secret")?
///     .with_retry_budget(10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MqttConfig {
    host: String<MAX_HOST_LEN>,
    port: u16,
    username: String<MAX_USERNAME_LEN>,
    password: String<MAX_PASSWORD_LEN>,
    client_id: String<MAX_CLIENT_ID_LEN>,
    status_topic: String<MAX_STATUS_TOPIC_LEN>,
    boot_payload: String<MAX_BOOT_PAYLOAD_LEN>,
    retry_budget: u8,
    tick_interval: Duration,
}

impl MqttConfig {
    /// Create a configuration for `host` with default settings.
    pub fn new(host: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            host: bounded(host, ConfigField::Host)?,
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            client_id: bounded(DEFAULT_CLIENT_ID, ConfigField::ClientId)?,
            status_topic: bounded(DEFAULT_STATUS_TOPIC, ConfigField::StatusTopic)?,
            boot_payload: bounded(DEFAULT_BOOT_PAYLOAD, ConfigField::BootPayload)?,
            retry_budget: DEFAULT_RETRY_BUDGET,
            tick_interval: DEFAULT_TICK_INTERVAL,
        })
    }

    /// Parse a JSON settings document and build a configuration from it.
    pub fn from_json(json: &[u8]) -> Result<Self, ConfigError> {
        let settings = BrokerSettings::parse(json)?;
        Self::from_settings(&settings)
    }

    /// Build a configuration from already parsed settings.
    ///
    /// `main_topic` is not part of the configuration, it belongs to the router.
    pub fn from_settings(settings: &BrokerSettings<'_>) -> Result<Self, ConfigError> {
        let mut config = Self::new(settings.host)?;
        if let Some(port) = settings.port {
            config.port = port;
        }
        if let Some(username) = settings.username {
            config.set_username(username)?;
        }
        if let Some(password) = settings.password {
            config.set_password(password)?;
        }
        if let Some(client_id) = settings.client_id {
            config.client_id = bounded(client_id, ConfigField::ClientId)?;
        }
        if let Some(status_topic) = settings.status_topic {
            config.status_topic = bounded(status_topic, ConfigField::StatusTopic)?;
        }
        if let Some(boot_payload) = settings.boot_payload {
            config.boot_payload = bounded(boot_payload, ConfigField::BootPayload)?;
        }
        if let Some(retry_budget) = settings.retry_budget {
            config.retry_budget = retry_budget;
        }
        if let Some(secs) = settings.tick_interval_secs {
            config.tick_interval = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Sets the broker port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the username and password sent on connect.
    pub fn with_credentials(mut self, username: &str, password: &str) -> Result<Self, ConfigError> {
        self.set_username(username)?;
        self.set_password(password)?;
        Ok(self)
    }

    /// Sets the client identifier.
    pub fn with_client_id(mut self, client_id: &str) -> Result<Self, ConfigError> {
        self.client_id = bounded(client_id, ConfigField::ClientId)?;
        Ok(self)
    }

    /// Sets the topic the boot announcement goes to.
    pub fn with_status_topic(mut self, topic: &str) -> Result<Self, ConfigError> {
        self.status_topic = bounded(topic, ConfigField::StatusTopic)?;
        Ok(self)
    }

    /// Sets the boot announcement payload.
    pub fn with_boot_payload(mut self, payload: &str) -> Result<Self, ConfigError> {
        self.boot_payload = bounded(payload, ConfigField::BootPayload)?;
        Ok(self)
    }

    /// Sets how many failed connect attempts are tolerated.
    pub fn with_retry_budget(mut self, retry_budget: u8) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    /// Sets the interval `MqttLink::run` ticks the supervisor at.
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn set_host(&mut self, host: &str) -> Result<(), ConfigError> {
        self.host = bounded(host, ConfigField::Host)?;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    pub fn set_username(&mut self, username: &str) -> Result<(), ConfigError> {
        self.username = bounded(username, ConfigField::Username)?;
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> Result<(), ConfigError> {
        self.password = bounded(password, ConfigField::Password)?;
        Ok(())
    }

    pub fn host(&self) -> &str {
        self.host.as_str()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// The username, or `None` for anonymous access.
    pub fn username(&self) -> Option<&str> {
        non_empty(self.username.as_str())
    }

    pub fn password(&self) -> Option<&str> {
        non_empty(self.password.as_str())
    }

    pub fn client_id(&self) -> &str {
        self.client_id.as_str()
    }

    pub fn status_topic(&self) -> &str {
        self.status_topic.as_str()
    }

    pub fn boot_payload(&self) -> &str {
        self.boot_payload.as_str()
    }

    pub fn retry_budget(&self) -> u8 {
        self.retry_budget
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Parameters for the next connect attempt.
    pub fn connect_request(&self) -> ConnectRequest<'_> {
        ConnectRequest {
            client_id: self.client_id(),
            username: self.username(),
            password: self.password(),
        }
    }
}

/// Link settings as stored in a JSON document.
///
/// All fields except `host` are optional and fall back to the defaults of
/// [`MqttConfig::new`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrokerSettings<'a> {
    pub host: &'a str,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default, borrow)]
    pub username: Option<&'a str>,
    #[serde(default, borrow)]
    pub password: Option<&'a str>,
    #[serde(default, borrow)]
    pub client_id: Option<&'a str>,
    #[serde(default, borrow)]
    pub status_topic: Option<&'a str>,
    #[serde(default, borrow)]
    pub boot_payload: Option<&'a str>,
    /// Prefix for registered topics, applied to the router.
    #[serde(default, borrow)]
    pub main_topic: Option<&'a str>,
    #[serde(default)]
    pub retry_budget: Option<u8>,
    #[serde(default)]
    pub tick_interval_secs: Option<u64>,
}

impl<'a> BrokerSettings<'a> {
    /// Parse settings from a JSON document borrowed for `'a`.
    pub fn parse(json: &'a [u8]) -> Result<Self, ConfigError> {
        let (settings, _) = serde_json_core::from_slice(json).map_err(|_e| {
            error!("config: settings parse error");
            ConfigError::Parse
        })?;
        Ok(settings)
    }
}
