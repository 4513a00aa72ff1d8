//! Topic routing table.
//!
//! The router owns the topics the link subscribes to and maps each of them to
//! a [`MessageHandler`]. Topics are registered as suffixes that get appended
//! to the configured main topic, e.g. main topic `home/` and suffix `/light1`
//! give `home//light1`, so callers usually pick one side to carry the slash.
//!
//! Matching is exact: a message published to `home/light1/extra` never
//! reaches the handler registered for `home/light1`.

use heapless::{String, Vec};

use crate::error::RouterError;

/// Maximum length for a full topic string (main topic plus suffix).
pub const MAX_TOPIC_LEN: usize = 128;

/// Maximum length for a registered topic suffix.
pub const MAX_SUFFIX_LEN: usize = 64;

/// Maximum length for the main topic prefix.
pub const MAX_MAIN_TOPIC_LEN: usize = 96;

/// Default number of routing slots.
pub const DEFAULT_MAX_TOPICS: usize = 8;

/// Object-safe capability invoked with the payload of a routed message.
///
/// Any `FnMut(&[u8])` closure is a handler, so handlers can carry their own
/// state instead of reaching for globals.
pub trait MessageHandler {
    /// Handle the payload of a message published to the handler's topic.
    fn on_message(&mut self, payload: &[u8]);
}

impl<F> MessageHandler for F
where
    F: FnMut(&[u8]),
{
    fn on_message(&mut self, payload: &[u8]) {
        self(payload)
    }
}

/// A single routing slot.
pub struct TopicEntry<'a> {
    topic: String<MAX_TOPIC_LEN>,
    suffix: String<MAX_SUFFIX_LEN>,
    handler: Option<&'a mut dyn MessageHandler>,
}

impl TopicEntry<'_> {
    /// The full topic subscribed for this entry.
    pub fn topic(&self) -> &str {
        self.topic.as_str()
    }

    /// The suffix the entry was registered with.
    pub fn suffix(&self) -> &str {
        self.suffix.as_str()
    }

    /// Returns `true` if a handler is attached.
    pub fn has_handler(&self) -> bool {
        self.handler.is_some()
    }
}

/// Outcome of a successful registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Registration {
    /// A new slot was taken at the given index.
    Added(usize),
    /// The slot with the same suffix at the given index was overwritten.
    Replaced(usize),
}

impl Registration {
    /// Index of the slot that now holds the registration.
    pub fn index(self) -> usize {
        match self {
            Registration::Added(index) | Registration::Replaced(index) => index,
        }
    }
}

/// Outcome of routing an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dispatch {
    /// The handler of the slot at the given index was invoked.
    Delivered(usize),
    /// The slot at the given index matched but has no handler.
    Unhandled(usize),
    /// No slot matched the topic.
    NoMatch,
}

/// A fixed-capacity table of topics and their handlers.
///
/// Slots keep insertion order, which is also the order topics are subscribed
/// in and the order dispatch scans them in.
///
/// # Example
///
/// ```ignore
/// let mut on_power = |payload: &[u8]| set_power(payload == b"ON");
///
/// let mut router = TopicRouter::<8>::new();
/// router.set_main_topic("home/kitchen")?;
/// router.register_topic("/power", &mut on_power)?;
///
/// router.dispatch("home/kitchen/power", b"ON");
/// ```
pub struct TopicRouter<'a, const MAX_TOPICS: usize = DEFAULT_MAX_TOPICS> {
    main_topic: String<MAX_MAIN_TOPIC_LEN>,
    entries: Vec<TopicEntry<'a>, MAX_TOPICS>,
}

impl<'a, const MAX_TOPICS: usize> TopicRouter<'a, MAX_TOPICS> {
    /// Create an empty router with an empty main topic.
    pub fn new() -> Self {
        Self {
            main_topic: String::new(),
            entries: Vec::new(),
        }
    }

    /// Set the prefix prepended to every suffix registered afterwards.
    ///
    /// Topics of existing slots are left untouched until their suffix is
    /// registered again.
    pub fn set_main_topic(&mut self, topic: &str) -> Result<(), RouterError> {
        let mut main_topic = String::new();
        main_topic
            .push_str(topic)
            .map_err(|_| RouterError::MainTopicTooLong)?;
        self.main_topic = main_topic;
        Ok(())
    }

    /// The current main topic.
    pub fn main_topic(&self) -> &str {
        self.main_topic.as_str()
    }

    /// Route messages on `main_topic + suffix` to `handler`.
    ///
    /// Registering a suffix that is already present replaces that slot's
    /// handler and rebuilds its topic from the current main topic.
    pub fn register_topic(
        &mut self,
        suffix: &str,
        handler: &'a mut dyn MessageHandler,
    ) -> Result<Registration, RouterError> {
        self.insert(suffix, Some(handler))
    }

    /// Subscribe to `main_topic + suffix` without attaching a handler.
    ///
    /// Messages on the topic are reported as [`Dispatch::Unhandled`].
    pub fn reserve_topic(&mut self, suffix: &str) -> Result<Registration, RouterError> {
        self.insert(suffix, None)
    }

    fn insert(
        &mut self,
        suffix: &str,
        handler: Option<&'a mut dyn MessageHandler>,
    ) -> Result<Registration, RouterError> {
        if suffix.is_empty() {
            return Err(RouterError::EmptySuffix);
        }

        let mut key = String::new();
        if key.push_str(suffix).is_err() {
            return Err(RouterError::SuffixTooLong);
        }

        let mut topic = String::new();
        if topic.push_str(self.main_topic.as_str()).is_err() || topic.push_str(suffix).is_err() {
            return Err(RouterError::TopicTooLong);
        }

        if let Some(index) = self.position_of_suffix(suffix) {
            let entry = &mut self.entries[index];
            entry.topic = topic;
            entry.handler = handler;
            return Ok(Registration::Replaced(index));
        }

        let index = self.entries.len();
        self.entries
            .push(TopicEntry {
                topic,
                suffix: key,
                handler,
            })
            .map_err(|_| RouterError::TableFull)?;
        Ok(Registration::Added(index))
    }

    fn position_of_suffix(&self, suffix: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.suffix.as_str() == suffix)
    }

    /// Route an inbound message to the first slot whose topic equals `topic`.
    pub fn dispatch(&mut self, topic: &str, payload: &[u8]) -> Dispatch {
        let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.topic.as_str() == topic)
        else {
            return Dispatch::NoMatch;
        };

        match self.entries[index].handler.as_mut() {
            Some(handler) => {
                handler.on_message(payload);
                Dispatch::Delivered(index)
            }
            None => Dispatch::Unhandled(index),
        }
    }

    /// Get an iterator over the full topics, in registration order.
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.topic.as_str())
    }

    /// Get the slot at `index`.
    pub fn get(&self, index: usize) -> Option<&TopicEntry<'a>> {
        self.entries.get(index)
    }

    /// Get the number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no topic is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        MAX_TOPICS
    }
}

impl<const MAX_TOPICS: usize> Default for TopicRouter<'_, MAX_TOPICS> {
    fn default() -> Self {
        Self::new()
    }
}
