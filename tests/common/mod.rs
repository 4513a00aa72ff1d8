//! Scripted session and event recorder shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;

use myrtio_mqtt_link::{ConnectRequest, InboundMessage, LinkEvent, LinkObserver, MqttSession, SessionState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockError {
    Refused,
    PublishFailed,
    PollFailed,
}

/// A session whose connect outcomes and inbound traffic are scripted upfront.
#[derive(Default, Clone)]
pub struct MockSession {
    pub server: Option<(String, u16)>,
    pub connected: bool,
    pub state: Option<SessionState>,
    /// Outcomes of the next connect attempts; refused with `ConnectFailed`
    /// once the script runs out.
    pub connect_script: VecDeque<Result<(), SessionState>>,
    pub connect_requests: Vec<(String, Option<String>, Option<String>)>,
    pub subscriptions: Vec<String>,
    pub publications: Vec<(String, Vec<u8>)>,
    pub inbound: VecDeque<(String, Vec<u8>)>,
    pub fail_publish: bool,
    pub fail_poll: bool,
    pub disconnects: usize,
    current: Option<(String, Vec<u8>)>,
}

impl MockSession {
    pub fn accepting() -> Self {
        let mut session = Self::default();
        session.connect_script.push_back(Ok(()));
        session
    }

    pub fn refusing(state: SessionState, times: usize) -> Self {
        let mut session = Self::default();
        session.connect_script.extend((0..times).map(|_| Err(state)));
        session
    }

    pub fn deliver(&mut self, topic: &str, payload: &[u8]) {
        self.inbound.push_back((topic.to_string(), payload.to_vec()));
    }

    /// Simulate the broker dropping the connection behind the client's back.
    pub fn go_stale(&mut self, state: SessionState) {
        self.state = Some(state);
    }

    pub fn drop_connection(&mut self) {
        self.connected = false;
        self.state = Some(SessionState::ConnectionLost);
    }
}

impl MqttSession for MockSession {
    type Error = MockError;

    fn set_server(&mut self, host: &str, port: u16) {
        self.server = Some((host.to_string(), port));
    }

    async fn connect(&mut self, request: &ConnectRequest<'_>) -> Result<(), MockError> {
        self.connect_requests.push((
            request.client_id.to_string(),
            request.username.map(str::to_string),
            request.password.map(str::to_string),
        ));
        match self
            .connect_script
            .pop_front()
            .unwrap_or(Err(SessionState::ConnectFailed))
        {
            Ok(()) => {
                self.connected = true;
                self.state = Some(SessionState::Connected);
                Ok(())
            }
            Err(state) => {
                self.connected = false;
                self.state = Some(state);
                Err(MockError::Refused)
            }
        }
    }

    async fn disconnect(&mut self) {
        self.disconnects += 1;
        self.connected = false;
        self.state = Some(SessionState::Disconnected);
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn state(&self) -> SessionState {
        self.state.unwrap_or(SessionState::Disconnected)
    }

    async fn subscribe(&mut self, topic: &str) -> Result<(), MockError> {
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    async fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), MockError> {
        if self.fail_publish {
            return Err(MockError::PublishFailed);
        }
        self.publications.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    async fn poll(&mut self) -> Result<Option<InboundMessage<'_>>, MockError> {
        if self.fail_poll {
            return Err(MockError::PollFailed);
        }
        self.current = self.inbound.pop_front();
        Ok(self.current.as_ref().map(|(topic, payload)| InboundMessage {
            topic: topic.as_str(),
            payload: payload.as_slice(),
        }))
    }
}

/// Observer keeping the `Debug` rendering of every event.
#[derive(Default, Clone)]
pub struct EventLog {
    pub events: Vec<String>,
}

impl EventLog {
    pub fn count(&self, prefix: &str) -> usize {
        self.events.iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn contains(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }
}

impl LinkObserver for EventLog {
    fn on_event(&mut self, event: &LinkEvent<'_>) {
        self.events.push(format!("{:?}", event));
    }
}
