//! The link facade.
//!
//! `MqttLink` bundles a session, its configuration, the topic router and the
//! connection supervisor into one context object owned by the application.
//! Firmware typically drives it from two places: a periodic timer calling
//! [`MqttLink::tick`] and the main loop calling [`MqttLink::service`]. On
//! Embassy, [`MqttLink::run`] does both in a single task.

use embassy_futures::select::{Either, select};
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::Ticker;

use crate::config::{BrokerSettings, MqttConfig};
use crate::error::{LinkError, RouterError};
use crate::observer::{LinkEvent, LinkObserver, LogObserver};
use crate::router::{DEFAULT_MAX_TOPICS, Dispatch, MessageHandler, Registration, TopicRouter};
use crate::session::MqttSession;
use crate::supervisor::{ConnectionSupervisor, LinkState};

/// A link shared between tasks, e.g. a ticker task and a service task.
pub type SharedLink<'a, S, O = LogObserver, const MAX_TOPICS: usize = DEFAULT_MAX_TOPICS> =
    Mutex<CriticalSectionRawMutex, MqttLink<'a, S, O, MAX_TOPICS>>;

/// Supervised MQTT connection with topic routing.
///
/// # Type Parameters
///
/// - `S`: The MQTT session implementation
/// - `O`: The observer receiving link events
/// - `MAX_TOPICS`: Number of routing slots
///
/// # Example
///
/// ```ignore
/// let mut on_power = |payload: &[u8]| set_power(payload == b"ON");
///
/// let config = MqttConfig::new("broker.local")?.with_credentials("light", "secret")?;
/// let mut link: MqttLink<'_, _> = MqttLink::with_log_observer(session, config);
/// link.set_main_topic("home/kitchen")?;
/// link.register_topic("/power", &mut on_power)?;
/// link.connect();
/// link.run().await;
/// ```
pub struct MqttLink<'a, S, O = LogObserver, const MAX_TOPICS: usize = DEFAULT_MAX_TOPICS>
where
    S: MqttSession,
{
    session: S,
    config: MqttConfig,
    router: TopicRouter<'a, MAX_TOPICS>,
    supervisor: ConnectionSupervisor,
    observer: O,
}

impl<'a, S, const MAX_TOPICS: usize> MqttLink<'a, S, LogObserver, MAX_TOPICS>
where
    S: MqttSession,
{
    /// Create a link that reports events to the log.
    pub fn with_log_observer(session: S, config: MqttConfig) -> Self {
        Self::new(session, config, LogObserver)
    }
}

impl<'a, S, O, const MAX_TOPICS: usize> MqttLink<'a, S, O, MAX_TOPICS>
where
    S: MqttSession,
    O: LinkObserver,
{
    /// Create a link. The retry budget is taken from `config`.
    pub fn new(session: S, config: MqttConfig, observer: O) -> Self {
        Self {
            session,
            supervisor: ConnectionSupervisor::new(config.retry_budget()),
            config,
            router: TopicRouter::new(),
            observer,
        }
    }

    /// Create a link from stored settings, applying their main topic.
    pub fn from_settings(
        session: S,
        settings: &BrokerSettings<'_>,
        observer: O,
    ) -> Result<Self, LinkError<S::Error>> {
        let config = MqttConfig::from_settings(settings)?;
        let mut link = Self::new(session, config, observer);
        if let Some(main_topic) = settings.main_topic {
            link.set_main_topic(main_topic)?;
        }
        Ok(link)
    }

    pub fn set_server(&mut self, host: &str) -> Result<(), LinkError<S::Error>> {
        self.config.set_host(host)?;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) {
        self.config.set_port(port);
    }

    pub fn set_user(&mut self, username: &str) -> Result<(), LinkError<S::Error>> {
        self.config.set_username(username)?;
        Ok(())
    }

    pub fn set_password(&mut self, password: &str) -> Result<(), LinkError<S::Error>> {
        self.config.set_password(password)?;
        Ok(())
    }

    /// Set broker address and credentials in one call.
    pub fn set_credentials(
        &mut self,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Result<(), LinkError<S::Error>> {
        self.config.set_host(host)?;
        self.config.set_port(port);
        self.config.set_username(username)?;
        self.config.set_password(password)?;
        Ok(())
    }

    /// Set the prefix for topics registered afterwards.
    ///
    /// Set it before registering anything: existing slots keep the topic they
    /// were registered with.
    pub fn set_main_topic(&mut self, topic: &str) -> Result<(), LinkError<S::Error>> {
        self.router.set_main_topic(topic)?;
        Ok(())
    }

    /// Route messages on `main_topic + suffix` to `handler`.
    pub fn register_topic(
        &mut self,
        suffix: &str,
        handler: &'a mut dyn MessageHandler,
    ) -> Result<Registration, RouterError> {
        let result = self.router.register_topic(suffix, handler);
        self.report_registration(suffix, result)
    }

    /// Subscribe to `main_topic + suffix` without a handler.
    pub fn reserve_topic(&mut self, suffix: &str) -> Result<Registration, RouterError> {
        let result = self.router.reserve_topic(suffix);
        self.report_registration(suffix, result)
    }

    fn report_registration(
        &mut self,
        suffix: &str,
        result: Result<Registration, RouterError>,
    ) -> Result<Registration, RouterError> {
        if let Err(reason) = result {
            self.observer
                .on_event(&LinkEvent::TopicRejected { suffix, reason });
        }
        result
    }

    /// Publish a payload through the session.
    pub async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), LinkError<S::Error>> {
        self.session
            .publish(topic, payload)
            .await
            .map_err(LinkError::Session)
    }

    /// Point the session at the configured broker.
    ///
    /// This does not open a connection; the next [`tick`](Self::tick) does.
    pub fn connect(&mut self) {
        self.session
            .set_server(self.config.host(), self.config.port());
    }

    /// Close the session if it is connected.
    pub async fn disconnect(&mut self) {
        if self.session.is_connected() {
            self.session.disconnect().await;
            self.observer.on_event(&LinkEvent::Disconnected);
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    /// Current link state, without side effects.
    pub fn state(&self) -> LinkState {
        self.supervisor.state(&self.session)
    }

    pub fn retries_remaining(&self) -> u8 {
        self.supervisor.retries_remaining()
    }

    pub fn config(&self) -> &MqttConfig {
        &self.config
    }

    pub fn router(&self) -> &TopicRouter<'a, MAX_TOPICS> {
        &self.router
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut S {
        &mut self.session
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Run one supervision step: reconnect and resubscribe if needed.
    pub async fn tick(&mut self) -> LinkState {
        self.supervisor
            .tick(
                &mut self.session,
                &self.router,
                &self.config,
                &mut self.observer,
            )
            .await
    }

    /// Service the session once and route the inbound message, if any.
    pub async fn service(&mut self) -> Result<Option<Dispatch>, LinkError<S::Error>> {
        let message = self.session.poll().await.map_err(LinkError::Session)?;
        let Some(message) = message else {
            return Ok(None);
        };

        self.observer.on_event(&LinkEvent::MessageReceived {
            topic: message.topic,
            len: message.payload.len(),
        });

        let dispatch = self.router.dispatch(message.topic, message.payload);
        match dispatch {
            Dispatch::Delivered(_) => {}
            Dispatch::Unhandled(_) => self.observer.on_event(&LinkEvent::NoHandler {
                topic: message.topic,
            }),
            Dispatch::NoMatch => self.observer.on_event(&LinkEvent::Unrouted {
                topic: message.topic,
            }),
        }
        Ok(Some(dispatch))
    }

    /// Drive the link forever.
    ///
    /// Ticks the supervisor every `tick_interval` of the configuration and
    /// services the session in between. An idle poll yields to the executor
    /// before the session is polled again. Session errors are reported as
    /// [`LinkEvent::ServiceFailed`] and the loop carries on; the supervisor
    /// takes care of reconnecting.
    pub async fn run(&mut self) -> ! {
        let mut ticker = Ticker::every(self.config.tick_interval());
        self.tick().await;
        loop {
            match select(ticker.next(), self.service()).await {
                Either::First(()) => {
                    self.tick().await;
                }
                Either::Second(Ok(Some(_))) => {}
                Either::Second(Ok(None)) => yield_now().await,
                Either::Second(Err(_)) => {
                    self.observer.on_event(&LinkEvent::ServiceFailed);
                    ticker.next().await;
                    self.tick().await;
                }
            }
        }
    }
}
