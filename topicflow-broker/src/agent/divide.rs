use parking_lot::Mutex;
use topicflow_types::{canonical_topic, Message};

use super::{Agent, Ports};
use crate::broker::Broker;
use crate::error::AgentError;

#[derive(Debug, Default)]
struct Operands {
    x: f64,
    y: f64,
    got_x: bool,
    got_y: bool,
}

/// Divides its first input (dividend) by its second (divisor).
///
/// Unlike the other numeric agents, receipt is tracked with explicit flags,
/// so zero is a valid operand. A zero divisor publishes NaN. The state is
/// cleared after every evaluation.
#[derive(Debug)]
pub struct DivideAgent {
    name: String,
    ports: Ports,
    operands: Mutex<Operands>,
}

impl DivideAgent {
    pub const NAME: &'static str = "DivAgent";

    pub fn new<S: AsRef<str>>(
        broker: &Broker,
        subscriptions: &[S],
        publications: &[S],
    ) -> Result<Self, AgentError> {
        let ports = Ports::new(broker, subscriptions, publications);
        if ports.inputs.len() != 2 {
            return Err(AgentError::inputs(Self::NAME, "exactly 2", ports.inputs.len()));
        }
        if ports.outputs.is_empty() {
            return Err(AgentError::outputs(Self::NAME, "at least 1", 0));
        }
        Ok(Self {
            name: Self::NAME.to_string(),
            ports,
            operands: Mutex::new(Operands::default()),
        })
    }
}

impl Agent for DivideAgent {
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
        *self.operands.lock() = Operands::default();
    }

    fn receive(&self, topic: &str, message: &Message) {
        if message.is_nan() {
            return;
        }

        let topic = canonical_topic(topic);
        let quotient = {
            let mut ops = self.operands.lock();
            if topic == self.ports.inputs[0] {
                ops.x = message.value();
                ops.got_x = true;
            } else if topic == self.ports.inputs[1] {
                ops.y = message.value();
                ops.got_y = true;
            } else {
                return;
            }

            if !(ops.got_x && ops.got_y) {
                return;
            }
            let quotient = if ops.y != 0.0 { ops.x / ops.y } else { f64::NAN };
            *ops = Operands::default();
            quotient
        };

        self.ports.emit(quotient);
    }

    fn shutdown(&self) {
        self.ports.detach(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingAgent;
    use std::sync::Arc;

    fn setup() -> (Broker, Arc<DivideAgent>, Arc<RecordingAgent>) {
        let broker = Broker::new();
        let agent = Arc::new(DivideAgent::new(&broker, &["X", "Y"], &["Q"]).unwrap());
        broker.attach(agent.clone());
        let probe = Arc::new(RecordingAgent::new("probe").subscribed_to(&["Q"]));
        broker.attach(probe.clone());
        (broker, agent, probe)
    }

    #[test]
    fn divides_first_by_second() {
        let (broker, _agent, probe) = setup();
        broker.publish("X", 10.0);
        broker.publish("Y", 2.0);
        assert_eq!(probe.values(), vec![5.0]);
    }

    #[test]
    fn order_of_arrival_does_not_matter() {
        let (broker, _agent, probe) = setup();
        broker.publish("Y", 4.0);
        broker.publish("X", 2.0);
        assert_eq!(probe.values(), vec![0.5]);
    }

    #[test]
    fn zero_divisor_publishes_nan() {
        let (broker, _agent, probe) = setup();
        broker.publish("X", 10.0);
        broker.publish("Y", 0.0);

        let values = probe.values();
        assert_eq!(values.len(), 1);
        assert!(values[0].is_nan());
    }

    #[test]
    fn zero_dividend_is_accepted() {
        let (broker, _agent, probe) = setup();
        broker.publish("X", 0.0);
        broker.publish("Y", 3.0);
        assert_eq!(probe.values(), vec![0.0]);
    }

    #[test]
    fn state_is_cleared_after_each_result() {
        let (broker, _agent, probe) = setup();
        broker.publish("X", 10.0);
        broker.publish("Y", 0.0);
        broker.publish("Y", 2.0);
        assert_eq!(probe.count(), 1);
        broker.publish("X", 10.0);
        assert_eq!(probe.count(), 2);
        assert_eq!(probe.values()[1], 5.0);
    }

    #[test]
    fn nan_input_is_ignored() {
        let (broker, _agent, probe) = setup();
        broker.publish("X", 1.0);
        broker.publish("Y", "n/a");
        assert_eq!(probe.count(), 0);
    }

    #[test]
    fn reset_clears_flags() {
        let (broker, agent, probe) = setup();
        broker.publish("X", 9.0);
        agent.reset();
        broker.publish("Y", 3.0);
        assert_eq!(probe.count(), 0);
    }

    #[test]
    fn requires_exactly_two_inputs() {
        let broker = Broker::new();
        let err = DivideAgent::new(&broker, &["X"], &["Q"]).unwrap_err();
        assert!(matches!(err, AgentError::Arity { actual: 1, .. }));
        assert!(DivideAgent::new(&broker, &["X", "Y", "Z"], &["Q"]).is_err());
    }

    #[test]
    fn only_the_first_publication_is_registered() {
        let broker = Broker::new();
        let agent = Arc::new(DivideAgent::new(&broker, &["X", "Y"], &["Q", "R"]).unwrap());
        broker.attach(agent.clone());

        assert_eq!(broker.topic("Q").publishers().len(), 1);
        assert!(broker.topic("R").publishers().is_empty());
    }
}
