//! Structured link events and the observers that consume them.
//!
//! The supervisor and the link never log directly. They report what happened
//! as a [`LinkEvent`] to an injected [`LinkObserver`]; [`LogObserver`] turns
//! the events into log records, tests record them instead. Settings parse
//! errors happen before a link exists and are logged by the config module.

use crate::error::RouterError;
use crate::session::SessionState;

/// Something noteworthy that happened on the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkEvent<'a> {
    /// A connect attempt is about to start.
    Connecting { host: &'a str, port: u16 },
    /// The broker accepted the connection.
    Connected {
        host: &'a str,
        username: Option<&'a str>,
    },
    /// A routed topic was subscribed.
    Subscribed { topic: &'a str },
    /// Subscribing a routed topic failed.
    SubscribeFailed { topic: &'a str },
    /// The boot announcement was published.
    Announced { topic: &'a str },
    /// Publishing the boot announcement failed.
    AnnounceFailed { topic: &'a str },
    /// A connect attempt failed and consumed one retry.
    ConnectFailed {
        state: SessionState,
        retries_remaining: u8,
    },
    /// The session claimed to be connected while reporting another state.
    StaleSession { state: SessionState },
    /// The retry budget is spent, no connect attempt was made.
    RetriesExpired,
    /// A topic registration was refused.
    TopicRejected {
        suffix: &'a str,
        reason: RouterError,
    },
    /// An inbound message arrived.
    MessageReceived { topic: &'a str, len: usize },
    /// An inbound message matched a slot without a handler.
    NoHandler { topic: &'a str },
    /// An inbound message matched no slot.
    Unrouted { topic: &'a str },
    /// Servicing the session failed; the run loop waits for the next tick.
    ServiceFailed,
    /// The session was disconnected on request.
    Disconnected,
}

/// Object-safe sink for [`LinkEvent`]s.
pub trait LinkObserver {
    fn on_event(&mut self, event: &LinkEvent<'_>);
}

impl<O: LinkObserver + ?Sized> LinkObserver for &mut O {
    fn on_event(&mut self, event: &LinkEvent<'_>) {
        (**self).on_event(event)
    }
}

/// Observer that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl LinkObserver for NoopObserver {
    fn on_event(&mut self, _event: &LinkEvent<'_>) {}
}

/// Observer that writes every event to the enabled log backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl LinkObserver for LogObserver {
    fn on_event(&mut self, event: &LinkEvent<'_>) {
        match *event {
            LinkEvent::Connecting { host, port } => {
                info!("mqtt: connecting to {}:{}...", host, port);
            }
            LinkEvent::Connected { host, username } => {
                info!("mqtt: connected to server: {}", host);
                if let Some(username) = username {
                    debug!("mqtt: with user: {}", username);
                }
            }
            LinkEvent::Subscribed { topic } => {
                info!("mqtt: subscribed to topic: {}", topic);
            }
            LinkEvent::SubscribeFailed { topic } => {
                warn!("mqtt: subscribe failed for topic: {}", topic);
            }
            LinkEvent::Announced { topic } => {
                debug!("mqtt: boot announced on {}", topic);
            }
            LinkEvent::AnnounceFailed { topic } => {
                warn!("mqtt: boot announcement failed on {}", topic);
            }
            LinkEvent::ConnectFailed {
                state,
                retries_remaining,
            } => {
                warn!(
                    "mqtt: failed with state {}: {}, {} retries left",
                    state.code(),
                    state.reason(),
                    retries_remaining
                );
            }
            LinkEvent::StaleSession { state } => {
                warn!(
                    "mqtt: session reports {} while connected, reconnecting",
                    state.reason()
                );
            }
            LinkEvent::RetriesExpired => {
                error!("mqtt: connecting retries expired");
            }
            LinkEvent::TopicRejected { suffix, reason } => {
                error!("mqtt: register topic {} rejected: {:?}", suffix, reason);
            }
            LinkEvent::MessageReceived { topic, len } => {
                trace!("mqtt: message on [{}] ({} bytes)", topic, len);
            }
            LinkEvent::NoHandler { topic } => {
                warn!("mqtt: topic {} has no handler", topic);
            }
            LinkEvent::Unrouted { topic } => {
                debug!("mqtt: no route for topic {}", topic);
            }
            LinkEvent::ServiceFailed => {
                error!("mqtt: service error, waiting for next tick");
            }
            LinkEvent::Disconnected => {
                info!("mqtt: disconnected");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter(usize);

    impl LinkObserver for Counter {
        fn on_event(&mut self, _event: &LinkEvent<'_>) {
            self.0 += 1;
        }
    }

    #[test]
    fn mutable_reference_forwards_events() {
        let mut counter = Counter(0);
        {
            let mut observer: &mut dyn LinkObserver = &mut counter;
            observer.on_event(&LinkEvent::RetriesExpired);
            LinkObserver::on_event(&mut observer, &LinkEvent::Disconnected);
        }
        assert_eq!(counter.0, 2);
    }

    #[test]
    fn log_observer_handles_every_variant() {
        let events = [
            LinkEvent::Connecting {
                host: "broker",
                port: 1883,
            },
            LinkEvent::Connected {
                host: "broker",
                username: Some("user"),
            },
            LinkEvent::Connected {
                host: "broker",
                username: None,
            },
            LinkEvent::Subscribed { topic: "home/x" },
            LinkEvent::SubscribeFailed { topic: "home/x" },
            LinkEvent::Announced { topic: "info" },
            LinkEvent::AnnounceFailed { topic: "info" },
            LinkEvent::ConnectFailed {
                state: SessionState::BadCredentials,
                retries_remaining: 3,
            },
            LinkEvent::StaleSession {
                state: SessionState::ConnectionLost,
            },
            LinkEvent::RetriesExpired,
            LinkEvent::TopicRejected {
                suffix: "/x",
                reason: RouterError::TableFull,
            },
            LinkEvent::MessageReceived {
                topic: "home/x",
                len: 4,
            },
            LinkEvent::NoHandler { topic: "home/x" },
            LinkEvent::Unrouted { topic: "home/y" },
            LinkEvent::ServiceFailed,
            LinkEvent::Disconnected,
        ];

        let mut observer = LogObserver;
        let mut counter = Counter(0);
        for event in &events {
            observer.on_event(event);
            counter.on_event(event);
        }
        NoopObserver.on_event(&LinkEvent::RetriesExpired);

        assert_eq!(counter.0, events.len());
    }
}
