use topicflow_types::{canonical_topic, Message};

use super::{Agent, Ports};
use crate::broker::Broker;
use crate::error::AgentError;

/// Publishes `value + 1` for every numeric message on its input topic.
///
/// Non-numeric messages are ignored. The agent is stateless, so `reset`
/// has no effect.
#[derive(Debug)]
pub struct IncrementAgent {
    name: String,
    ports: Ports,
}

impl IncrementAgent {
    pub const NAME: &'static str = "IncAgent";

    /// Create an increment agent consuming the first subscription and
    /// publishing to the first publication.
    pub fn new<S: AsRef<str>>(
        broker: &Broker,
        subscriptions: &[S],
        publications: &[S],
    ) -> Result<Self, AgentError> {
        let ports = Ports::new(broker, subscriptions, publications);
        if ports.inputs.is_empty() {
            return Err(AgentError::inputs(Self::NAME, "at least 1", 0));
        }
        if ports.outputs.is_empty() {
            return Err(AgentError::outputs(Self::NAME, "at least 1", 0));
        }
        Ok(Self {
            name: Self::NAME.to_string(),
            ports,
        })
    }
}

impl Agent for IncrementAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[String] {
        &self.ports.inputs[..1]
    }

    fn outputs(&self) -> &[String] {
        &self.ports.outputs[..1]
    }

    fn reset(&self) {}

    fn receive(&self, topic: &str, message: &Message) {
        if canonical_topic(topic) != self.ports.inputs[0] || message.is_nan() {
            return;
        }
        self.ports.emit(message.value() + 1.0);
    }

    fn shutdown(&self) {
        self.ports.detach(self);
    }
}
