//! Topic - a named broadcast channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use topicflow_types::{canonical_topic, Message};

use crate::agent::{same_agent, Agent};

/// Copy-on-write list of agents.
///
/// Readers clone the `Arc` and iterate without holding the lock. Writers
/// swap in a modified copy when a reader still holds the old list.
type AgentList = Arc<Vec<Arc<dyn Agent>>>;

/// A named broadcast channel.
///
/// Publishing delivers the message to every current subscriber, in
/// subscription order, on the caller's thread. Subscribing or unsubscribing
/// while a publish is in flight neither blocks nor disturbs it: the publish
/// iterates the list as it was when it started.
///
/// The publisher list is bookkeeping for graph introspection; it is never
/// consulted when publishing.
pub struct Topic {
    name: String,
    subscribers: RwLock<AgentList>,
    publishers: RwLock<AgentList>,
    last_message: RwLock<Message>,
    publish_count: AtomicU64,
}

impl Topic {
    /// Create a topic. The name is normalized to its canonical form.
    pub fn new(name: &str) -> Self {
        Self {
            name: canonical_topic(name),
            subscribers: RwLock::new(Arc::new(Vec::new())),
            publishers: RwLock::new(Arc::new(Vec::new())),
            last_message: RwLock::new(Message::default()),
            publish_count: AtomicU64::new(0),
        }
    }

    /// The canonical topic name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a subscriber. The same agent may be subscribed more than once.
    pub fn subscribe(&self, agent: Arc<dyn Agent>) {
        push(&self.subscribers, agent);
    }

    /// Remove the first subscription of this exact agent instance.
    ///
    /// Returns false if the agent was not subscribed.
    pub fn unsubscribe(&self, agent: &dyn Agent) -> bool {
        remove(&self.subscribers, agent)
    }

    /// Record an agent as a publisher of this topic.
    pub fn add_publisher(&self, agent: Arc<dyn Agent>) {
        push(&self.publishers, agent);
    }

    /// Remove the first publisher entry of this exact agent instance.
    pub fn remove_publisher(&self, agent: &dyn Agent) -> bool {
        remove(&self.publishers, agent)
    }

    /// Deliver a message to every subscriber, then remember it as the last message.
    ///
    /// The last message is stored after delivery, even when its value is NaN.
    pub fn publish(&self, message: Message) {
        let subscribers = self.subscribers.read().clone();
        for agent in subscribers.iter() {
            agent.receive(&self.name, &message);
        }
        *self.last_message.write() = message;
        self.publish_count.fetch_add(1, Ordering::Relaxed);
    }

    /// The last published message, or the zero message before any publish.
    pub fn last_message(&self) -> Message {
        self.last_message.read().clone()
    }

    /// Number of publishes so far.
    pub fn publish_count(&self) -> u64 {
        self.publish_count.load(Ordering::Relaxed)
    }

    /// Point-in-time copy of the subscriber list.
    pub fn subscribers(&self) -> AgentList {
        self.subscribers.read().clone()
    }

    /// Point-in-time copy of the publisher list.
    pub fn publishers(&self) -> AgentList {
        self.publishers.read().clone()
    }
}

fn push(list: &RwLock<AgentList>, agent: Arc<dyn Agent>) {
    let mut guard = list.write();
    Arc::make_mut(&mut *guard).push(agent);
}

fn remove(list: &RwLock<AgentList>, agent: &dyn Agent) -> bool {
    let mut guard = list.write();
    match guard.iter().position(|a| same_agent(a, agent)) {
        Some(pos) => {
            Arc::make_mut(&mut *guard).remove(pos);
            true
        }
        None => false,
    }
}

impl std::fmt::Debug for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Topic")
            .field("name", &self.name)
            .field("subscribers", &self.subscribers.read().len())
            .field("publishers", &self.publishers.read().len())
            .finish()
    }
}
