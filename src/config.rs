//! Graph descriptions.
//!
//! A graph description lists the agents to deploy and the mailbox settings
//! shared by their decouplers:
//!
//! ```toml
//! [mailbox]
//! capacity = 10
//! timeout = "5s"
//!
//! [[agents]]
//! kind = "inc"
//! subscriptions = ["A"]
//! publications = ["B"]
//!
//! [[agents]]
//! kind = "sum"
//! subscriptions = "B, C"   # a comma-separated string also works
//! publications = ["TOTAL"]
//! ```
//!
//! Files are read with the `config` crate, so TOML, YAML and JSON are all
//! accepted (by extension), and `TOPICFLOW_MAILBOX__CAPACITY`-style
//! environment variables override file values.

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use topicflow_broker::{AgentError, DecouplerConfig, DecouplerError};

use crate::duration::parse_duration;

/// Errors raised while loading or deploying a graph description.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The description could not be read or did not match the schema.
    #[error("Invalid graph description: {0}")]
    Config(#[from] config::ConfigError),

    /// The mailbox timeout is not a duration string.
    #[error("Invalid mailbox timeout {value:?}: {reason}")]
    Timeout { value: String, reason: String },

    /// The mailbox capacity is zero.
    #[error("Mailbox capacity must be positive")]
    ZeroCapacity,

    /// The mailbox timeout is zero.
    #[error("Mailbox timeout must be positive")]
    ZeroTimeout,

    /// An agent entry could not be built.
    #[error("Agent #{index} ({kind}): {source}")]
    Agent {
        index: usize,
        kind: String,
        #[source]
        source: AgentError,
    },

    /// A decoupler could not be started.
    #[error(transparent)]
    Decoupler(#[from] DecouplerError),
}

/// Mailbox settings shared by every deployed agent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MailboxConfig {
    pub capacity: usize,
    /// Duration string, e.g. `"5s"` or `"250ms"`.
    pub timeout: String,
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            capacity: DecouplerConfig::DEFAULT_CAPACITY,
            timeout: "5s".to_string(),
        }
    }
}

impl MailboxConfig {
    /// Validate and convert to a [`DecouplerConfig`].
    pub fn decoupler_config(&self) -> Result<DecouplerConfig, LoadError> {
        if self.capacity == 0 {
            return Err(LoadError::ZeroCapacity);
        }
        let timeout = parse_duration(&self.timeout).map_err(|e| LoadError::Timeout {
            value: self.timeout.clone(),
            reason: e.to_string(),
        })?;
        if timeout.is_zero() {
            return Err(LoadError::ZeroTimeout);
        }
        Ok(DecouplerConfig::default()
            .with_capacity(self.capacity)
            .with_timeout(timeout))
    }
}

/// One agent to deploy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentSpec {
    /// Factory key, e.g. `"inc"` or `"SumAgent"`.
    pub kind: String,
    #[serde(default, deserialize_with = "topic_list")]
    pub subscriptions: Vec<String>,
    #[serde(default, deserialize_with = "topic_list")]
    pub publications: Vec<String>,
}

/// A complete graph description.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub mailbox: MailboxConfig,
    pub agents: Vec<AgentSpec>,
}

impl GraphConfig {
    /// Load a description file, applying `TOPICFLOW_*` environment overrides.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let config = Config::builder()
            .add_source(File::from(path))
            .add_source(
                Environment::with_prefix("TOPICFLOW")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;
        Self::validate(config.try_deserialize()?)
    }

    /// Parse a description from a string in the given format.
    pub fn parse(text: &str, format: FileFormat) -> Result<Self, LoadError> {
        let config = Config::builder()
            .add_source(File::from_str(text, format))
            .build()?;
        Self::validate(config.try_deserialize()?)
    }

    fn validate(graph: Self) -> Result<Self, LoadError> {
        graph.mailbox.decoupler_config()?;
        Ok(graph)
    }
}

/// Accept either a list of names or one comma-separated string.
fn topic_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TopicList {
        Joined(String),
        Many(Vec<String>),
    }

    let names = match TopicList::deserialize(deserializer)? {
        TopicList::Joined(joined) => joined.split(',').map(str::to_string).collect(),
        TopicList::Many(names) => names,
    };
    Ok(names
        .into_iter()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect())
}
