//! String-keyed agent construction.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Agent, BinaryOp, BinaryOpAgent, DivideAgent, IncrementAgent, SumAgent};
use crate::broker::Broker;
use crate::error::AgentError;

/// Builds an agent from its subscription and publication lists.
pub type AgentConstructor =
    Arc<dyn Fn(&Broker, &[String], &[String]) -> Result<Box<dyn Agent>, AgentError> + Send + Sync>;

/// Maps agent kinds (e.g. `"inc"`, `"sum"`) to constructors.
///
/// Kinds are case-insensitive, and a dotted prefix is ignored, so
/// `"configs.IncAgent"` resolves like `"incagent"`.
///
/// # Example
///
/// ```rust
/// use topicflow_broker::{AgentFactory, Broker};
///
/// let broker = Broker::new();
/// let factory = AgentFactory::default();
/// let agent = factory
///     .create("inc", &broker, &["A".to_string()], &["B".to_string()])
///     .unwrap();
/// assert_eq!(agent.name(), "IncAgent");
/// ```
#[derive(Clone)]
pub struct AgentFactory {
    constructors: BTreeMap<String, AgentConstructor>,
}

impl AgentFactory {
    /// Create a factory with no registered kinds.
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Create a factory with the built-in agents registered.
    pub fn new() -> Self {
        let mut factory = Self::empty();

        for kind in ["inc", "increment", "incagent"] {
            factory.register(kind, |broker, subs, pubs| {
                Ok(Box::new(IncrementAgent::new(broker, subs, pubs)?))
            });
        }
        for kind in ["sum", "sumagent"] {
            factory.register(kind, |broker, subs, pubs| {
                Ok(Box::new(SumAgent::new(broker, subs, pubs)?))
            });
        }
        for kind in ["div", "divide", "divagent"] {
            factory.register(kind, |broker, subs, pubs| {
                Ok(Box::new(DivideAgent::new(broker, subs, pubs)?))
            });
        }

        factory.register_binary(&["plus", "add", "plusagent"], "PlusAgent", |a, b| a + b);
        factory.register_binary(&["minus", "sub", "minusagent"], "MinusAgent", |a, b| a - b);
        factory.register_binary(&["mul", "multiply", "mulagent"], "MulAgent", |a, b| a * b);

        factory
    }

    /// Register (or replace) a constructor for a kind.
    pub fn register<F>(&mut self, kind: &str, constructor: F)
    where
        F: Fn(&Broker, &[String], &[String]) -> Result<Box<dyn Agent>, AgentError>
            + Send
            + Sync
            + 'static,
    {
        self.constructors
            .insert(normalize_kind(kind), Arc::new(constructor));
    }

    /// Register a [`BinaryOpAgent`] kind under one or more names.
    pub fn register_binary<F>(&mut self, kinds: &[&str], agent_name: &str, op: F)
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        let op: BinaryOp = Arc::new(op);
        let agent_name = agent_name.to_string();
        for kind in kinds {
            let op = op.clone();
            let agent_name = agent_name.clone();
            self.register(kind, move |broker, subs, pubs| {
                Ok(Box::new(BinaryOpAgent::from_topics(
                    broker,
                    &agent_name,
                    subs,
                    pubs,
                    op.clone(),
                )?))
            });
        }
    }

    /// Returns true if a constructor is registered for `kind`.
    pub fn contains(&self, kind: &str) -> bool {
        self.constructors.contains_key(&normalize_kind(kind))
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Construct an agent of the given kind.
    pub fn create(
        &self,
        kind: &str,
        broker: &Broker,
        subscriptions: &[String],
        publications: &[String],
    ) -> Result<Box<dyn Agent>, AgentError> {
        let constructor = self
            .constructors
            .get(&normalize_kind(kind))
            .ok_or_else(|| AgentError::UnknownKind(kind.to_string()))?;
        constructor(broker, subscriptions, publications)
    }
}

impl Default for AgentFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AgentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentFactory")
            .field("kinds", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn normalize_kind(kind: &str) -> String {
    let kind = kind.trim();
    kind.rsplit('.').next().unwrap_or(kind).to_lowercase()
}
