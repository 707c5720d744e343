//! Error types for agents and decouplers.

use thiserror::Error;

/// Errors that can occur when constructing an agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent was given the wrong number of input or output topics.
    #[error("{agent} needs {expected} {role} topic(s), got {actual}")]
    Arity {
        agent: String,
        role: &'static str,
        expected: &'static str,
        actual: usize,
    },

    /// No constructor is registered for this agent kind.
    #[error("Unknown agent kind: {0}")]
    UnknownKind(String),
}

impl AgentError {
    pub(crate) fn inputs(agent: &str, expected: &'static str, actual: usize) -> Self {
        AgentError::Arity {
            agent: agent.to_string(),
            role: "input",
            expected,
            actual,
        }
    }

    pub(crate) fn outputs(agent: &str, expected: &'static str, actual: usize) -> Self {
        AgentError::Arity {
            agent: agent.to_string(),
            role: "output",
            expected,
            actual,
        }
    }
}

/// Errors that can occur when starting an [`AsyncDecoupler`](crate::AsyncDecoupler).
#[derive(Debug, Error)]
pub enum DecouplerError {
    /// The mailbox must hold at least one message.
    #[error("Mailbox capacity must be positive")]
    ZeroCapacity,

    /// The mailbox timeout must be non-zero.
    #[error("Mailbox timeout must be positive")]
    ZeroTimeout,

    /// The worker thread could not be started.
    #[error("Failed to spawn mailbox worker: {0}")]
    Spawn(#[from] std::io::Error),
}
