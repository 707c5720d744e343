//! Test doubles.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use topicflow_types::{canonical_topics, Message};

use crate::agent::Agent;

/// `(agent, topic, text)` entries shared between several recorders.
pub(crate) type SharedLog = Arc<Mutex<Vec<(String, String, String)>>>;

/// An agent that records everything it receives.
pub(crate) struct RecordingAgent {
    name: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    received: Mutex<Vec<Message>>,
    log: Option<SharedLog>,
    gate: Option<(Receiver<()>, Sender<()>)>,
    panic_on: Option<String>,
    resets: AtomicUsize,
    shutdowns: AtomicUsize,
}

impl RecordingAgent {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            received: Mutex::new(Vec::new()),
            log: None,
            gate: None,
            panic_on: None,
            resets: AtomicUsize::new(0),
            shutdowns: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_log(name: &str, log: SharedLog) -> Self {
        Self {
            log: Some(log),
            ..Self::new(name)
        }
    }

    pub(crate) fn shared_log() -> SharedLog {
        Arc::new(Mutex::new(Vec::new()))
    }

    pub(crate) fn subscribed_to(mut self, topics: &[&str]) -> Self {
        self.inputs = canonical_topics(topics);
        self
    }

    pub(crate) fn publishing_to(mut self, topics: &[&str]) -> Self {
        self.outputs = canonical_topics(topics);
        self
    }

    /// Signal `started` on each delivery, then block until `gate` yields.
    pub(crate) fn gated(mut self, gate: Receiver<()>, started: Sender<()>) -> Self {
        self.gate = Some((gate, started));
        self
    }

    /// Panic when a message with this text arrives.
    pub(crate) fn panicking_on(mut self, text: &str) -> Self {
        self.panic_on = Some(text.to_string());
        self
    }

    pub(crate) fn count(&self) -> usize {
        self.received.lock().len()
    }

    pub(crate) fn values(&self) -> Vec<f64> {
        self.received.lock().iter().map(Message::value).collect()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.received
            .lock()
            .iter()
            .map(|m| m.text().to_string())
            .collect()
    }

    pub(crate) fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl Agent for RecordingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }

    fn receive(&self, topic: &str, message: &Message) {
        if let Some((gate, started)) = &self.gate {
            let _ = started.send(());
            let _ = gate.recv();
        }
        if self.panic_on.as_deref() == Some(message.text()) {
            panic!("{} refused {}", self.name, message);
        }
        self.received.lock().push(message.clone());
        if let Some(log) = &self.log {
            log.lock()
                .push((self.name.clone(), topic.to_string(), message.text().to_string()));
        }
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}
