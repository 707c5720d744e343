//! # topicflow-broker
//!
//! An in-process pub/sub broker for small dataflow graphs.
//!
//! Agents consume named topics and publish results to other topics. The
//! [`Broker`] routes every published value to the current subscribers of its
//! topic. Wrapping an agent in an [`AsyncDecoupler`] gives it a bounded
//! mailbox and its own worker thread, so a slow agent never stalls a
//! publisher.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use topicflow_broker::{Agent, AsyncDecoupler, Broker, DecouplerConfig, IncrementAgent};
//!
//! let broker = Broker::new();
//!
//! // A -> IncAgent -> B, running on its own worker
//! let inc = IncrementAgent::new(&broker, &["A"], &["B"]).unwrap();
//! let worker = AsyncDecoupler::spawn(&broker, Arc::new(inc), DecouplerConfig::default()).unwrap();
//!
//! broker.publish("A", "41");
//!
//! let graph = broker.graph();
//! assert!(!graph.has_cycles());
//!
//! worker.shutdown();
//! ```
//!
//! ## Features
//!
//! - **Case-insensitive topics**: created on first use, shared by name
//! - **Copy-on-write subscriber lists**: subscribing never blocks a publish
//! - **Bounded mailboxes**: backpressure degrades to a logged drop
//! - **Fault isolation**: a panicking agent keeps its worker alive
//! - **Graph introspection**: snapshot the topic/agent graph and detect cycles

pub mod agent;
mod broker;
mod decoupler;
mod error;
mod graph;
mod topic;

#[cfg(test)]
mod testing;

pub use agent::{
    Agent, AgentConstructor, AgentFactory, BinaryOp, BinaryOpAgent, DivideAgent, IncrementAgent,
    SumAgent,
};
pub use broker::Broker;
pub use decoupler::{AsyncDecoupler, DecouplerConfig, MailboxStats};
pub use error::{AgentError, DecouplerError};
pub use topic::Topic;

// Re-export types for convenience
pub use topicflow_types::{GraphSnapshot, Message, Node, NodeKind};
