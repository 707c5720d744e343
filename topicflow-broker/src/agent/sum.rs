use std::collections::BTreeMap;

use parking_lot::Mutex;
use topicflow_types::{canonical_topic, Message};

use super::{Agent, Ports};
use crate::broker::Broker;
use crate::error::AgentError;

/// Publishes the sum of its inputs once every input holds a non-zero value.
///
/// Each input keeps its last value. When all of them are non-zero the sum
/// is published and every value is zeroed again. A zero input counts as
/// "not received".
#[derive(Debug)]
pub struct SumAgent {
    name: String,
    ports: Ports,
    values: Mutex<BTreeMap<String, f64>>,
}

impl SumAgent {
    pub const NAME: &'static str = "SumAgent";

    pub fn new<S: AsRef<str>>(
        broker: &Broker,
        subscriptions: &[S],
        publications: &[S],
    ) -> Result<Self, AgentError> {
        let mut ports = Ports::new(broker, subscriptions, publications);
        if ports.inputs.is_empty() {
            return Err(AgentError::inputs(Self::NAME, "at least 1", 0));
        }
        if ports.outputs.is_empty() {
            return Err(AgentError::outputs(Self::NAME, "at least 1", 0));
        }

        let mut seen = std::collections::HashSet::new();
        ports.inputs.retain(|name| seen.insert(name.clone()));

        let values = ports.inputs.iter().map(|name| (name.clone(), 0.0)).collect();
        Ok(Self {
            name: Self::NAME.to_string(),
            ports,
            values: Mutex::new(values),
        })
    }
}

impl Agent for SumAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[String] {
        &self.ports.inputs
    }

    fn outputs(&self) -> &[String] {
        &self.ports.outputs
    }

    fn reset(&self) {
        self.values.lock().values_mut().for_each(|v| *v = 0.0);
    }

    fn receive(&self, topic: &str, message: &Message) {
        if message.is_nan() {
            return;
        }

        let sum = {
            let mut values = self.values.lock();
            match values.get_mut(&canonical_topic(topic)) {
                Some(slot) => *slot = message.value(),
                None => return,
            }
            if values.values().any(|v| *v == 0.0) {
                return;
            }
            let sum: f64 = values.values().sum();
            values.values_mut().for_each(|v| *v = 0.0);
            sum
        };

        // Published outside the lock: a raw subscriber may feed straight back in.
        self.ports.emit(sum);
    }

    fn shutdown(&self) {
        self.ports.detach(self);
    }
}
