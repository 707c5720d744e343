use std::sync::Arc;

use parking_lot::Mutex;
use topicflow_types::{canonical_topic, Message};

use super::{Agent, Ports};
use crate::broker::Broker;
use crate::error::AgentError;

/// A binary numeric operator.
pub type BinaryOp = Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>;

/// Applies a binary operator to the last values of two input topics.
///
/// Both operands start at zero and are zeroed after every result. A result
/// is published only when both operands are non-zero, so a zero input
/// counts as "not received".
pub struct BinaryOpAgent {
    name: String,
    ports: Ports,
    op: BinaryOp,
    operands: Mutex<(f64, f64)>,
}

impl BinaryOpAgent {
    /// Create an agent computing `op(first, second)` into `result`.
    pub fn new<F>(
        broker: &Broker,
        name: &str,
        first: &str,
        second: &str,
        result: &str,
        op: F,
    ) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            ports: Ports::new(broker, &[first, second], &[result]),
            op: Arc::new(op),
            operands: Mutex::new((0.0, 0.0)),
        }
    }

    /// Create an agent from subscription and publication lists.
    ///
    /// Requires exactly two subscriptions and at least one publication.
    pub fn from_topics<S: AsRef<str>>(
        broker: &Broker,
        name: &str,
        subscriptions: &[S],
        publications: &[S],
        op: BinaryOp,
    ) -> Result<Self, AgentError> {
        let ports = Ports::new(broker, subscriptions, publications);
        if ports.inputs.len() != 2 {
            return Err(AgentError::inputs(name, "exactly 2", ports.inputs.len()));
        }
        if ports.outputs.is_empty() {
            return Err(AgentError::outputs(name, "at least 1", 0));
        }
        Ok(Self {
            name: name.to_string(),
            ports,
            op,
            operands: Mutex::new((0.0, 0.0)),
        })
    }
}

impl Agent for BinaryOpAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[String] {
        &self.ports.inputs
    }

    fn outputs(&self) -> &[String] {
        &self.ports.outputs[..1]
    }

    fn reset(&self) {
        *self.operands.lock() = (0.0, 0.0);
    }

    fn receive(&self, topic: &str, message: &Message) {
        if message.is_nan() {
            return;
        }

        let topic = canonical_topic(topic);
        let result = {
            let mut ops = self.operands.lock();
            if self.ports.inputs.first() == Some(&topic) {
                ops.0 = message.value();
            } else if self.ports.inputs.get(1) == Some(&topic) {
                ops.1 = message.value();
            } else {
                return;
            }

            if ops.0 == 0.0 || ops.1 == 0.0 {
                return;
            }
            let result = (self.op)(ops.0, ops.1);
            *ops = (0.0, 0.0);
            result
        };

        self.ports.emit(result);
    }

    fn shutdown(&self) {
        self.ports.detach(self);
    }
}

impl std::fmt::Debug for BinaryOpAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryOpAgent")
            .field("name", &self.name)
            .field("ports", &self.ports)
            .finish()
    }
}
