//! topicflow - deploy small dataflow graphs of numeric agents.
//!
//! This crate loads a graph description, deploys every agent behind its own
//! mailbox on a [`Broker`](topicflow_broker::Broker), and renders the
//! resulting topic/agent graph as text or JSON.

pub mod config;
pub mod deployment;
pub mod duration;
pub mod output;

pub use crate::config::{AgentSpec, GraphConfig, LoadError, MailboxConfig};
pub use deployment::Deployment;
pub use output::{render_text, watch, Output, WatchHandle};
