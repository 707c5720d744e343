//! The topic registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use topicflow_types::{canonical_topic, GraphSnapshot, Message};

use crate::agent::Agent;
use crate::topic::Topic;

/// Registry of named topics.
///
/// `Broker` is a cheap handle: clones share the same registry. Topic names
/// are case-insensitive, so `"prices"` and `"PRICES"` resolve to the same
/// [`Topic`].
///
/// # Example
///
/// ```rust
/// use topicflow_broker::Broker;
///
/// let broker = Broker::new();
/// broker.publish("temperature", "21.5");
///
/// assert_eq!(broker.topic("TEMPERATURE").last_message().value(), 21.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Broker {
    topics: Arc<RwLock<BTreeMap<String, Arc<Topic>>>>,
}

impl Broker {
    /// Create an empty broker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the topic with the given name.
    ///
    /// Concurrent callers asking for the same name always receive the same
    /// instance.
    pub fn topic(&self, name: &str) -> Arc<Topic> {
        let key = canonical_topic(name);

        // Fast path: already registered
        {
            let topics = self.topics.read();
            if let Some(topic) = topics.get(&key) {
                return topic.clone();
            }
        }

        // Slow path: another thread may have won the race
        let mut topics = self.topics.write();
        topics
            .entry(key)
            .or_insert_with_key(|key| Arc::new(Topic::new(key)))
            .clone()
    }

    /// Look up a topic without creating it.
    pub fn find_topic(&self, name: &str) -> Option<Arc<Topic>> {
        self.topics.read().get(&canonical_topic(name)).cloned()
    }

    /// Returns true if a topic with this name exists.
    pub fn contains_topic(&self, name: &str) -> bool {
        self.topics.read().contains_key(&canonical_topic(name))
    }

    /// All topics, ordered by name.
    pub fn topics(&self) -> Vec<Arc<Topic>> {
        self.topics.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.topics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.read().is_empty()
    }

    /// Forget every topic.
    ///
    /// Existing `Arc<Topic>` handles stay usable but are no longer reachable
    /// through the broker; the next [`topic`](Self::topic) call creates a
    /// fresh instance.
    pub fn clear(&self) {
        let old = std::mem::take(&mut *self.topics.write());
        tracing::debug!(topics = old.len(), "broker cleared");
        drop(old);
    }

    /// Publish a message on the named topic, creating it if needed.
    pub fn publish(&self, name: &str, message: impl Into<Message>) {
        self.topic(name).publish(message.into());
    }

    /// Wire an agent into the graph.
    ///
    /// The agent is subscribed to each of its inputs and recorded as a
    /// publisher of each of its outputs.
    pub fn attach(&self, agent: Arc<dyn Agent>) {
        for input in agent.inputs() {
            self.topic(input).subscribe(agent.clone());
        }
        for output in agent.outputs() {
            self.topic(output).add_publisher(agent.clone());
        }
        tracing::debug!(
            agent = agent.name(),
            inputs = ?agent.inputs(),
            outputs = ?agent.outputs(),
            "agent attached"
        );
    }

    /// Undo [`attach`](Self::attach) for this exact agent instance.
    ///
    /// Topics that no longer exist are skipped rather than recreated.
    pub fn detach(&self, agent: &dyn Agent) {
        for input in agent.inputs() {
            if let Some(topic) = self.find_topic(input) {
                topic.unsubscribe(agent);
            }
        }
        for output in agent.outputs() {
            if let Some(topic) = self.find_topic(output) {
                topic.remove_publisher(agent);
            }
        }
        tracing::debug!(agent = agent.name(), "agent detached");
    }

    /// Capture the current topic/agent graph.
    pub fn graph(&self) -> GraphSnapshot {
        crate::graph::snapshot(self)
    }
}
