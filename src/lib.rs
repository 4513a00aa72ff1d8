//! # Supervised MQTT Link for Embedded Systems
//!
//! `myrtio-mqtt-link` is a `no_std`, allocation-free layer that sits between
//! firmware and an MQTT client library. It keeps a connection to the broker
//! alive within a bounded retry budget and routes incoming messages to
//! per-topic handlers.
//!
//! ## Core Features
//!
//! - **Topic routing:** A fixed-capacity table maps `main topic + suffix` to a
//!   [`MessageHandler`](router::MessageHandler). Topics are matched exactly,
//!   in registration order.
//! - **Connection supervision:** Every tick either confirms the session or makes
//!   one connect attempt. After connecting, all routed topics are subscribed
//!   again and a boot announcement is published.
//! - **Bounded retries:** Failed attempts spend a retry budget. Once it is
//!   spent the link stops trying until the device restarts.
//! - **Library agnostic:** The MQTT protocol and network transport live behind
//!   the [`MqttSession`](session::MqttSession) trait.
//! - **Structured events:** Everything noteworthy is reported to a
//!   [`LinkObserver`](observer::LinkObserver); [`LogObserver`] writes to
//!   `log`, `defmt` or `esp-println` depending on enabled features.
//!
//! ## Usage
//!
//! ```ignore
//! use myrtio_mqtt_link::{MqttConfig, MqttLink};
//!
//! let mut on_power = |payload: &[u8]| set_power(payload == b"ON");
//!
//! let config = MqttConfig::new("broker.local")?
//!     .with_credentials("light", "secret")?;
//! let mut link: MqttLink<'_, _> = MqttLink::with_log_observer(session, config);
//! link.set_main_topic("home/kitchen")?;
//! link.register_topic("/power", &mut on_power)?;
//! link.connect();
//!
//! // Either drive it manually...
//! link.tick().await;
//! link.service().await?;
//!
//! // ...or let it run with its own ticker.
//! link.run().await;
//! ```

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod link;
pub mod observer;
pub mod router;
pub mod session;
pub mod supervisor;

// Re-export key types for easier access at the crate root.
pub use config::{BrokerSettings, MqttConfig};
pub use error::{ConfigError, LinkError, RouterError};
pub use link::{MqttLink, SharedLink};
pub use observer::{LinkEvent, LinkObserver, LogObserver, NoopObserver};
pub use router::{Dispatch, MessageHandler, Registration, TopicRouter};
pub use session::{ConnectRequest, InboundMessage, MqttSession, SessionState};
pub use supervisor::{ConnectionSupervisor, LinkState};
