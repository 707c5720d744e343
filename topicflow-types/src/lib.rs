//! # topicflow-types
//!
//! Core types shared by every topicflow crate. This crate defines the values
//! that travel over topics and the graph snapshot used to introspect a running
//! broker.
//!
//! ## Design Goals
//!
//! - **No runtime dependencies**: plain data types, usable from any crate
//! - **Optional serialization**: enable the `serde` feature for JSON export
//! - **Total constructors**: building a [`Message`] never fails
//! - **Versioned schema**: graph snapshots carry version info
//!
//! ## Features
//!
//! - `serde`: serialization of [`Message`] and [`GraphSnapshot`] via serde
//!
//! ## Example
//!
//! ```rust
//! use topicflow_types::{GraphSnapshot, Message};
//!
//! let msg = Message::from_text("3.0");
//! assert_eq!(msg.value(), 3.0);
//! assert!(Message::from_text("three").is_nan());
//!
//! let mut builder = GraphSnapshot::builder();
//! let input = builder.topic("A", 0);
//! let agent = builder.agent("IncAgent");
//! let output = builder.topic("B", 0);
//! builder.edge(&input, &agent, "");
//! builder.edge(&agent, &output, "");
//! let graph = builder.build();
//!
//! assert_eq!(graph.len(), 3);
//! assert!(!graph.has_cycles());
//! ```
//!
//! ## Schema Version
//!
//! The current schema version is **1**. The version is included in serialized
//! graph snapshots so consumers can handle format evolution.

mod graph;
mod message;
mod topic;
mod version;

pub use graph::*;
pub use message::*;
pub use topic::*;
pub use version::*;

/// Current schema version.
///
/// Increment this when making breaking changes to the snapshot format.
pub const SCHEMA_VERSION: u32 = 1;

/// Get current timestamp in milliseconds since Unix epoch.
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
