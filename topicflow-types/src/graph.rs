//! GraphSnapshot - a point-in-time view of the topic/agent graph.

use std::collections::HashMap;
use std::fmt;

use crate::{current_timestamp_ms, SchemaVersion};

/// Prefix of topic node keys.
pub const TOPIC_PREFIX: char = 'T';

/// Prefix of agent node keys.
pub const AGENT_PREFIX: char = 'A';

/// Whether a node stands for a topic or an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum NodeKind {
    Topic,
    Agent,
}

/// A directed edge to another node, labeled with the topic's last value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    /// Key of the target node.
    pub target: String,
    /// Formatted last value of the topic on this edge, or empty.
    pub label: String,
}

/// A topic or agent in the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Unique key: the display name tagged with `T` or `A`.
    pub key: String,
    /// Topic name or agent name.
    pub name: String,
    pub kind: NodeKind,
    /// Outgoing edges, at most one per target.
    pub edges: Vec<Edge>,
    /// Number of publishes seen on the topic (topic nodes only).
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub publish_count: Option<u64>,
}

impl Node {
    fn new(key: String, name: &str, kind: NodeKind) -> Self {
        Self {
            key,
            name: name.to_string(),
            kind,
            edges: Vec::new(),
            publish_count: None,
        }
    }

    /// Add an edge unless one to the same target already exists.
    ///
    /// Returns true if the edge was added.
    pub fn add_edge(&mut self, target: &str, label: impl Into<String>) -> bool {
        if self.edges.iter().any(|e| e.target == target) {
            return false;
        }
        self.edges.push(Edge {
            target: target.to_string(),
            label: label.into(),
        });
        true
    }

    /// Label of the edge to `target`, if linked.
    pub fn edge_label(&self, target: &str) -> Option<&str> {
        self.edges
            .iter()
            .find(|e| e.target == target)
            .map(|e| e.label.as_str())
    }

    pub fn is_topic(&self) -> bool {
        self.kind == NodeKind::Topic
    }
}

/// Key of the node for a topic name.
pub fn topic_key(name: &str) -> String {
    format!("{}{}", TOPIC_PREFIX, name)
}

/// Key of the node for an agent name.
pub fn agent_key(name: &str) -> String {
    format!("{}{}", AGENT_PREFIX, name)
}

/// Format a topic's last value as an edge label.
///
/// Two decimal places; empty when the value is unknown or exactly zero
/// (zero means nothing has been published yet).
///
/// # Example
///
/// ```rust
/// use topicflow_types::edge_label;
///
/// assert_eq!(edge_label(Some(2.0)), "2.00");
/// assert_eq!(edge_label(Some(0.0)), "");
/// assert_eq!(edge_label(None), "");
/// ```
pub fn edge_label(value: Option<f64>) -> String {
    match value {
        Some(v) if v != 0.0 => format!("{:.2}", v),
        _ => String::new(),
    }
}

/// A point-in-time graph of topics and agents.
///
/// Topic nodes link to the agents subscribed to them; agent nodes link to
/// the topics they publish to. The view is rebuilt on demand and never
/// updated in place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GraphSnapshot {
    /// Schema version for forward compatibility.
    pub version: SchemaVersion,

    /// Unix timestamp in milliseconds when this snapshot was taken.
    pub timestamp_ms: u64,

    /// Nodes in first-seen order.
    pub nodes: Vec<Node>,
}

impl GraphSnapshot {
    /// Create a builder for constructing graphs.
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Check if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.edges.len()).sum()
    }

    /// Look up a node by key.
    pub fn node(&self, key: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.key == key)
    }

    /// Look up the node of a topic by (canonical) name.
    pub fn topic(&self, name: &str) -> Option<&Node> {
        self.node(&topic_key(name))
    }

    /// Look up the node of an agent by name.
    pub fn agent(&self, name: &str) -> Option<&Node> {
        self.node(&agent_key(name))
    }

    /// Iterate over topic nodes.
    pub fn topics(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Topic)
    }

    /// Iterate over agent nodes.
    pub fn agents(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.kind == NodeKind::Agent)
    }

    /// Returns true if any directed cycle exists.
    ///
    /// Depth-first search from every unvisited node, tracking the nodes on
    /// the current path. Reaching a node that is still on the path closes a
    /// cycle; reaching a finished node is a cross or forward edge. Uses an
    /// explicit stack, so deep graphs do not recurse.
    pub fn has_cycles(&self) -> bool {
        let index: HashMap<&str, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.key.as_str(), i))
            .collect();

        let adjacency: Vec<Vec<usize>> = self
            .nodes
            .iter()
            .map(|n| {
                n.edges
                    .iter()
                    .filter_map(|e| index.get(e.target.as_str()).copied())
                    .collect()
            })
            .collect();

        let mut visited = vec![false; self.nodes.len()];
        let mut on_path = vec![false; self.nodes.len()];

        for start in 0..self.nodes.len() {
            if visited[start] {
                continue;
            }

            // (node, index of the next neighbor to explore)
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            visited[start] = true;
            on_path[start] = true;

            while let Some(&(node, next)) = stack.last() {
                match adjacency[node].get(next) {
                    Some(&neighbor) => {
                        let top = stack.len() - 1;
                        stack[top].1 += 1;

                        if on_path[neighbor] {
                            return true;
                        }
                        if !visited[neighbor] {
                            visited[neighbor] = true;
                            on_path[neighbor] = true;
                            stack.push((neighbor, 0));
                        }
                    }
                    None => {
                        on_path[node] = false;
                        stack.pop();
                    }
                }
            }
        }

        false
    }
}

impl fmt::Display for GraphSnapshot {
    /// One line per node with outgoing edges: `TA -> AIncAgent[2.00]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            if node.edges.is_empty() {
                continue;
            }
            write!(f, "{} ->", node.key)?;
            for edge in &node.edges {
                if edge.label.is_empty() {
                    write!(f, " {}", edge.target)?;
                } else {
                    write!(f, " {}[{}]", edge.target, edge.label)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Builder for constructing `GraphSnapshot` instances.
///
/// Nodes are created on first mention and reused afterwards.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    timestamp_ms: Option<u64>,
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

impl GraphBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a specific timestamp (milliseconds since Unix epoch).
    pub fn timestamp_ms(mut self, ts: u64) -> Self {
        self.timestamp_ms = Some(ts);
        self
    }

    /// Create or reuse the node of a topic and return its key.
    pub fn topic(&mut self, name: &str, publish_count: u64) -> String {
        let key = self.node(topic_key(name), name, NodeKind::Topic);
        if let Some(&i) = self.index.get(&key) {
            self.nodes[i].publish_count = Some(publish_count);
        }
        key
    }

    /// Create or reuse the node of an agent and return its key.
    pub fn agent(&mut self, name: &str) -> String {
        self.node(agent_key(name), name, NodeKind::Agent)
    }

    /// Add an edge between two existing nodes; a repeated target is a no-op.
    pub fn edge(&mut self, from: &str, to: &str, label: impl Into<String>) -> bool {
        match self.index.get(from) {
            Some(&i) if self.index.contains_key(to) => self.nodes[i].add_edge(to, label),
            _ => false,
        }
    }

    fn node(&mut self, key: String, name: &str, kind: NodeKind) -> String {
        if !self.index.contains_key(&key) {
            self.index.insert(key.clone(), self.nodes.len());
            self.nodes.push(Node::new(key.clone(), name, kind));
        }
        key
    }

    /// Build the snapshot.
    pub fn build(self) -> GraphSnapshot {
        GraphSnapshot {
            version: SchemaVersion::current(),
            timestamp_ms: self.timestamp_ms.unwrap_or_else(current_timestamp_ms),
            nodes: self.nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Wire `agent` from `inputs` to `outputs`.
    fn wire(builder: &mut GraphBuilder, agent: &str, inputs: &[&str], outputs: &[&str]) {
        let a = builder.agent(agent);
        for input in inputs {
            let t = builder.topic(input, 0);
            builder.edge(&t, &a, "");
        }
        for output in outputs {
            let t = builder.topic(output, 0);
            builder.edge(&a, &t, "");
        }
    }

    #[test]
    fn empty_graph_has_no_cycles() {
        let graph = GraphSnapshot::builder().build();
        assert!(graph.is_empty());
        assert!(!graph.has_cycles());
    }

    #[test]
    fn pipeline_has_no_cycles() {
        let mut builder = GraphSnapshot::builder();
        wire(&mut builder, "inc", &["A"], &["B"]);
        wire(&mut builder, "sum", &["B", "C"], &["D"]);
        let graph = builder.build();

        assert_eq!(graph.topics().count(), 4);
        assert_eq!(graph.agents().count(), 2);
        assert!(!graph.has_cycles());
    }

    #[test]
    fn diamond_is_not_a_cycle() {
        // A feeds two agents whose outputs join again: cross edges only.
        let mut builder = GraphSnapshot::builder();
        wire(&mut builder, "left", &["A"], &["L"]);
        wire(&mut builder, "right", &["A"], &["R"]);
        wire(&mut builder, "join", &["L", "R"], &["OUT"]);
        assert!(!builder.build().has_cycles());
    }

    #[test]
    fn self_feeding_agent_is_a_cycle() {
        let mut builder = GraphSnapshot::builder();
        wire(&mut builder, "inc", &["A"], &["A"]);
        assert!(builder.build().has_cycles());
    }

    #[test]
    fn transitive_loop_is_a_cycle() {
        let mut builder = GraphSnapshot::builder();
        wire(&mut builder, "one", &["A"], &["B"]);
        wire(&mut builder, "two", &["B"], &["C"]);
        wire(&mut builder, "three", &["C"], &["A"]);
        assert!(builder.build().has_cycles());
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let mut builder = GraphSnapshot::builder();
        for i in 0..50_000 {
            let input = format!("T{}", i);
            let output = format!("T{}", i + 1);
            wire(&mut builder, &format!("agent-{}", i), &[&input], &[&output]);
        }
        assert!(!builder.build().has_cycles());
    }

    #[test]
    fn edges_are_deduplicated_by_target() {
        let mut builder = GraphSnapshot::builder();
        let t = builder.topic("A", 0);
        let a = builder.agent("inc");
        assert!(builder.edge(&t, &a, "1.00"));
        assert!(!builder.edge(&t, &a, "2.00"));

        let graph = builder.build();
        let node = graph.topic("A").unwrap();
        assert_eq!(node.edges.len(), 1);
        assert_eq!(node.edge_label("AINC"), None);
        assert_eq!(node.edge_label("Ainc"), Some("1.00"));
    }

    #[test]
    fn nodes_with_same_name_are_shared() {
        let mut builder = GraphSnapshot::builder();
        let first = builder.agent("SumAgent");
        let second = builder.agent("SumAgent");
        assert_eq!(first, second);
        assert_eq!(builder.build().len(), 1);
    }

    #[test]
    fn topic_and_agent_keys_are_tagged() {
        assert_eq!(topic_key("A"), "TA");
        assert_eq!(agent_key("A"), "AA");
    }

    #[test]
    fn edge_labels_use_two_decimals() {
        assert_eq!(edge_label(Some(5.0)), "5.00");
        assert_eq!(edge_label(Some(-1.234)), "-1.23");
        assert_eq!(edge_label(Some(f64::NAN)), "NaN");
        assert_eq!(edge_label(Some(0.0)), "");
        assert_eq!(edge_label(None), "");
    }

    #[test]
    fn display_lists_edges_with_labels() {
        let mut builder = GraphSnapshot::builder();
        let t = builder.topic("A", 1);
        let a = builder.agent("inc");
        builder.edge(&t, &a, "3.00");
        let text = builder.build().to_string();
        assert_eq!(text, "TA -> Ainc[3.00]\n");
    }

    #[test]
    fn topic_nodes_carry_publish_count() {
        let mut builder = GraphSnapshot::builder();
        builder.topic("A", 3);
        let graph = builder.build();
        assert_eq!(graph.topic("A").unwrap().publish_count, Some(3));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let mut builder = GraphSnapshot::builder().timestamp_ms(1703160000000);
        wire(&mut builder, "inc", &["A"], &["B"]);
        let graph = builder.build();

        let json = serde_json::to_string(&graph).unwrap();
        let parsed: GraphSnapshot = serde_json::from_str(&json).unwrap();

        assert_eq!(graph, parsed);
    }
}
