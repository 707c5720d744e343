//! Deploying a graph description onto a broker.

use std::sync::Arc;

use topicflow_broker::{Agent, AgentFactory, AsyncDecoupler, Broker, MailboxStats};

use crate::config::{GraphConfig, LoadError};

/// The decoupled agents built from one [`GraphConfig`].
///
/// Every agent gets its own mailbox and worker. Dropping the deployment
/// shuts all of them down.
#[derive(Debug)]
pub struct Deployment {
    broker: Broker,
    decouplers: Vec<Arc<AsyncDecoupler>>,
}

impl Deployment {
    /// Build every agent in `config` and attach it to `broker`.
    ///
    /// On failure the agents built so far are shut down again.
    pub fn load(
        broker: &Broker,
        config: &GraphConfig,
        factory: &AgentFactory,
    ) -> Result<Self, LoadError> {
        let mailbox = config.mailbox.decoupler_config()?;
        let mut deployment = Self {
            broker: broker.clone(),
            decouplers: Vec::with_capacity(config.agents.len()),
        };

        for (index, spec) in config.agents.iter().enumerate() {
            let agent: Arc<dyn Agent> = factory
                .create(&spec.kind, broker, &spec.subscriptions, &spec.publications)
                .map_err(|source| LoadError::Agent {
                    index,
                    kind: spec.kind.clone(),
                    source,
                })?
                .into();
            deployment
                .decouplers
                .push(AsyncDecoupler::spawn(broker, agent, mailbox)?);
        }

        tracing::info!(
            agents = deployment.len(),
            topics = broker.len(),
            capacity = mailbox.capacity,
            "graph deployed"
        );
        Ok(deployment)
    }

    pub fn broker(&self) -> &Broker {
        &self.broker
    }

    pub fn decouplers(&self) -> &[Arc<AsyncDecoupler>] {
        &self.decouplers
    }

    pub fn len(&self) -> usize {
        self.decouplers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decouplers.is_empty()
    }

    /// Mailbox counters per agent, in deployment order.
    pub fn stats(&self) -> Vec<(String, MailboxStats)> {
        self.decouplers
            .iter()
            .map(|d| (d.name().to_string(), d.stats()))
            .collect()
    }

    /// Reset every agent, discarding queued messages.
    pub fn reset(&self) {
        for decoupler in &self.decouplers {
            decoupler.reset();
        }
    }

    /// Shut down every agent. Topics stay registered.
    pub fn shutdown(&mut self) {
        if self.decouplers.is_empty() {
            return;
        }
        let count = self.decouplers.len();
        for decoupler in self.decouplers.drain(..) {
            decoupler.shutdown();
        }
        tracing::info!(agents = count, "graph shut down");
    }

    /// Replace the deployed graph.
    ///
    /// Shuts every agent down, clears the broker, then builds `config`.
    pub fn reload(&mut self, config: &GraphConfig, factory: &AgentFactory) -> Result<(), LoadError> {
        self.shutdown();
        self.broker.clear();
        *self = Self::load(&self.broker.clone(), config, factory)?;
        Ok(())
    }
}

impl Drop for Deployment {
    fn drop(&mut self) {
        self.shutdown();
    }
}
