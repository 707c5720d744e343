//! Graph construction from a live broker.

use topicflow_types::{edge_label, GraphSnapshot};

use crate::broker::Broker;

/// Build a snapshot of the broker's current topic/agent graph.
///
/// Every topic links to its subscribers and every publisher links to the
/// topic, each edge labeled with the topic's last value. The view is
/// eventually consistent: publishes and subscriptions racing with the build
/// may or may not be reflected.
pub(crate) fn snapshot(broker: &Broker) -> GraphSnapshot {
    let mut builder = GraphSnapshot::builder();

    for topic in broker.topics() {
        let label = edge_label(Some(topic.last_message().value()));
        let topic_node = builder.topic(topic.name(), topic.publish_count());

        for agent in topic.subscribers().iter() {
            let agent_node = builder.agent(agent.name());
            builder.edge(&topic_node, &agent_node, label.as_str());
        }
        for agent in topic.publishers().iter() {
            let agent_node = builder.agent(agent.name());
            builder.edge(&agent_node, &topic_node, label.as_str());
        }
    }

    builder.build()
}
