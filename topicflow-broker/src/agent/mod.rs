//! Agents - computation units that consume and produce topic messages.
//!
//! ## Variants
//!
//! - [`IncrementAgent`]: publishes `value + 1`
//! - [`SumAgent`]: publishes the sum once every input has a non-zero value
//! - [`DivideAgent`]: publishes `x / y` (NaN when `y` is zero)
//! - [`BinaryOpAgent`]: publishes `op(first, second)` for any operator
//!
//! ## The zero sentinel
//!
//! Sum and BinaryOp treat a stored value of exactly `0.0` as "not received
//! yet". A real zero input therefore never triggers a computation. Divide
//! tracks explicit received flags instead and does accept a zero divisor.

mod binop;
mod divide;
mod factory;
mod increment;
mod sum;

pub use binop::{BinaryOp, BinaryOpAgent};
pub use divide::DivideAgent;
pub use factory::{AgentConstructor, AgentFactory};
pub use increment::IncrementAgent;
pub use sum::SumAgent;

use std::sync::Arc;

use topicflow_types::{canonical_topics, Message};

use crate::broker::Broker;

/// The capability set shared by every agent.
///
/// Agents are shared between topics and worker threads, so every method
/// takes `&self`; mutable state lives behind the agent's own lock.
pub trait Agent: Send + Sync {
    /// Human-readable name. Not guaranteed unique.
    fn name(&self) -> &str;

    /// Canonical names of the topics this agent consumes.
    fn inputs(&self) -> &[String];

    /// Canonical names of the topics this agent publishes to.
    fn outputs(&self) -> &[String];

    /// Clear accumulated input state. Never publishes.
    fn reset(&self);

    /// Handle a message published on `topic`.
    fn receive(&self, topic: &str, message: &Message);

    /// Detach from every topic and release resources.
    fn shutdown(&self);
}

impl std::fmt::Debug for dyn Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name())
            .field("inputs", &self.inputs())
            .field("outputs", &self.outputs())
            .finish()
    }
}

/// Returns true if `a` is the very same instance as `b`.
pub(crate) fn same_agent(a: &Arc<dyn Agent>, b: &dyn Agent) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        b as *const dyn Agent as *const (),
    )
}

/// Input and output topics of an agent plus the broker it publishes through.
#[derive(Debug, Clone)]
pub(crate) struct Ports {
    broker: Broker,
    pub(crate) inputs: Vec<String>,
    pub(crate) outputs: Vec<String>,
}

impl Ports {
    pub(crate) fn new<S: AsRef<str>>(broker: &Broker, inputs: &[S], outputs: &[S]) -> Self {
        Self {
            broker: broker.clone(),
            inputs: canonical_topics(inputs),
            outputs: canonical_topics(outputs),
        }
    }

    /// Publish a result on the first output topic.
    ///
    /// The topic is looked up on every publish, so after a broker clear the
    /// result lands on the freshly created topic of the same name.
    pub(crate) fn emit(&self, value: f64) {
        if let Some(output) = self.outputs.first() {
            self.broker.publish(output, Message::from_number(value));
        }
    }

    /// Remove `agent` from every topic it was attached to.
    pub(crate) fn detach(&self, agent: &dyn Agent) {
        self.broker.detach(agent);
    }
}
