//! Connection supervision with a bounded retry budget.
//!
//! The supervisor is driven by periodic ticks. Each tick either confirms the
//! session is healthy or makes exactly one connect attempt. Failed attempts
//! consume the retry budget; once it is spent the supervisor stays inert until
//! the device restarts.

use crate::config::MqttConfig;
use crate::observer::{LinkEvent, LinkObserver};
use crate::router::TopicRouter;
use crate::session::{MqttSession, SessionState};

/// Where the link stands after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    /// Not connected, connect attempts remain.
    Disconnected,
    /// Connected to the broker.
    Connected,
    /// Not connected and the retry budget is spent. Terminal.
    Exhausted,
}

/// Drives connect attempts and resubscription for one session.
#[derive(Debug, Clone)]
pub struct ConnectionSupervisor {
    retries_remaining: u8,
}

impl ConnectionSupervisor {
    /// Create a supervisor allowing `retry_budget` failed connect attempts.
    pub const fn new(retry_budget: u8) -> Self {
        Self {
            retries_remaining: retry_budget,
        }
    }

    /// Failed connect attempts still allowed.
    pub fn retries_remaining(&self) -> u8 {
        self.retries_remaining
    }

    /// Returns `true` once the retry budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.retries_remaining == 0
    }

    /// Report the current state without touching the session.
    pub fn state<S: MqttSession>(&self, session: &S) -> LinkState {
        if self.is_exhausted() {
            LinkState::Exhausted
        } else if session.is_connected() && session.state() == SessionState::Connected {
            LinkState::Connected
        } else {
            LinkState::Disconnected
        }
    }

    /// Run one supervision step.
    ///
    /// A session that claims to be connected while reporting a non-connected
    /// state is torn down and reconnected in the same tick.
    pub async fn tick<S, O, const MAX_TOPICS: usize>(
        &mut self,
        session: &mut S,
        router: &TopicRouter<'_, MAX_TOPICS>,
        config: &MqttConfig,
        observer: &mut O,
    ) -> LinkState
    where
        S: MqttSession,
        O: LinkObserver + ?Sized,
    {
        if self.is_exhausted() {
            observer.on_event(&LinkEvent::RetriesExpired);
            return LinkState::Exhausted;
        }

        if session.is_connected() {
            let state = session.state();
            if state == SessionState::Connected {
                return LinkState::Connected;
            }
            observer.on_event(&LinkEvent::StaleSession { state });
            session.disconnect().await;
        }

        observer.on_event(&LinkEvent::Connecting {
            host: config.host(),
            port: config.port(),
        });

        if session.connect(&config.connect_request()).await.is_err() {
            self.retries_remaining -= 1;
            observer.on_event(&LinkEvent::ConnectFailed {
                state: session.state(),
                retries_remaining: self.retries_remaining,
            });
            return if self.is_exhausted() {
                LinkState::Exhausted
            } else {
                LinkState::Disconnected
            };
        }

        observer.on_event(&LinkEvent::Connected {
            host: config.host(),
            username: config.username(),
        });

        for topic in router.topics() {
            match session.subscribe(topic).await {
                Ok(()) => observer.on_event(&LinkEvent::Subscribed { topic }),
                Err(_) => observer.on_event(&LinkEvent::SubscribeFailed { topic }),
            }
        }

        let status_topic = config.status_topic();
        match session
            .publish(status_topic, config.boot_payload().as_bytes())
            .await
        {
            Ok(()) => observer.on_event(&LinkEvent::Announced {
                topic: status_topic,
            }),
            Err(_) => observer.on_event(&LinkEvent::AnnounceFailed {
                topic: status_topic,
            }),
        }

        LinkState::Connected
    }
}
