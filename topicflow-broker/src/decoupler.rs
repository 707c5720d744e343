//! Per-agent mailboxes.
//!
//! An [`AsyncDecoupler`] stands between the broker and an agent. Topics
//! deliver into a bounded mailbox and return at once; a dedicated worker
//! thread drains the mailbox and calls the wrapped agent one message at a
//! time, in arrival order.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use parking_lot::Mutex;
use topicflow_types::{canonical_topic, Message};

use crate::agent::Agent;
use crate::broker::Broker;
use crate::error::DecouplerError;

/// Mailbox settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecouplerConfig {
    /// Maximum number of queued messages. Must be positive.
    pub capacity: usize,
    /// How long `receive` waits for room in a full mailbox before dropping,
    /// and how long `shutdown` waits for the worker to exit. Must be
    /// non-zero.
    pub timeout: Duration,
}

impl DecouplerConfig {
    pub const DEFAULT_CAPACITY: usize = 10;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for DecouplerConfig {
    fn default() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }
}

/// Point-in-time mailbox counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStats {
    /// Messages enqueued.
    pub accepted: u64,
    /// Messages handed to the agent without a panic.
    pub delivered: u64,
    /// Messages discarded because the mailbox stayed full or was shut down.
    pub dropped: u64,
    /// Deliveries during which the agent panicked.
    pub failed: u64,
    /// Messages currently waiting.
    pub queued: usize,
}

#[derive(Debug, Default)]
struct Counters {
    accepted: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
}

type Envelope = (String, Message);

/// Wraps an agent with a bounded mailbox and its own worker thread.
///
/// The decoupler is itself an [`Agent`]: it reports the wrapped agent's name
/// and topics, so the broker wires the decoupler in place of the agent.
/// One slow or panicking agent then never stalls a publisher or any other
/// agent; at worst a publisher waits `timeout` for mailbox room and the
/// message is dropped.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use topicflow_broker::{Agent, AsyncDecoupler, Broker, DecouplerConfig, IncrementAgent};
///
/// let broker = Broker::new();
/// let inc = IncrementAgent::new(&broker, &["A"], &["B"]).unwrap();
/// let decoupler = AsyncDecoupler::spawn(&broker, Arc::new(inc), DecouplerConfig::default()).unwrap();
///
/// broker.publish("A", 1.0);
///
/// decoupler.shutdown();
/// ```
pub struct AsyncDecoupler {
    agent: Arc<dyn Agent>,
    broker: Broker,
    mailbox: Sender<Envelope>,
    /// Second handle on the mailbox, used by `reset` to discard entries.
    drain: Receiver<Envelope>,
    /// Dropped on shutdown; the disconnect wakes the worker.
    stop: Mutex<Option<Sender<()>>>,
    /// Disconnects when the worker exits.
    finished: Receiver<()>,
    worker: Mutex<Option<JoinHandle<()>>>,
    running: Arc<AtomicBool>,
    counters: Arc<Counters>,
    timeout: Duration,
}

impl AsyncDecoupler {
    /// Start a worker for `agent` without wiring it into the broker.
    ///
    /// The broker handle is kept so [`shutdown`](Agent::shutdown) can detach
    /// the decoupler later.
    pub fn new(
        broker: &Broker,
        agent: Arc<dyn Agent>,
        config: DecouplerConfig,
    ) -> Result<Self, DecouplerError> {
        if config.capacity == 0 {
            return Err(DecouplerError::ZeroCapacity);
        }
        if config.timeout.is_zero() {
            return Err(DecouplerError::ZeroTimeout);
        }

        let (mailbox, inbox) = bounded::<Envelope>(config.capacity);
        let (stop, stop_rx) = bounded::<()>(0);
        let (finished_tx, finished) = bounded::<()>(0);
        let running = Arc::new(AtomicBool::new(true));
        let counters = Arc::new(Counters::default());

        let worker = Worker {
            agent: agent.clone(),
            inbox: inbox.clone(),
            stop: stop_rx,
            running: running.clone(),
            counters: counters.clone(),
            timeout: config.timeout,
            _finished: finished_tx,
        };
        let handle = thread::Builder::new()
            .name(format!("mailbox-{}", agent.name()))
            .spawn(move || worker.run())?;

        Ok(Self {
            agent,
            broker: broker.clone(),
            mailbox,
            drain: inbox,
            stop: Mutex::new(Some(stop)),
            finished,
            worker: Mutex::new(Some(handle)),
            running,
            counters,
            timeout: config.timeout,
        })
    }

    /// Start a worker for `agent` and attach the decoupler to the broker.
    pub fn spawn(
        broker: &Broker,
        agent: Arc<dyn Agent>,
        config: DecouplerConfig,
    ) -> Result<Arc<Self>, DecouplerError> {
        let decoupler = Arc::new(Self::new(broker, agent, config)?);
        broker.attach(decoupler.clone());
        Ok(decoupler)
    }

    /// The wrapped agent.
    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> MailboxStats {
        MailboxStats {
            accepted: self.counters.accepted.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            queued: self.mailbox.len(),
        }
    }

    fn stop_worker(&self) {
        self.stop.lock().take();

        let Some(handle) = self.worker.lock().take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            // Shut down from inside the agent: the loop ends after this delivery.
            return;
        }
        match self.finished.recv_timeout(self.timeout) {
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(
                    agent = self.agent.name(),
                    timeout = ?self.timeout,
                    "mailbox worker did not exit in time"
                );
            }
            _ => {
                if handle.join().is_err() {
                    tracing::warn!(agent = self.agent.name(), "mailbox worker panicked");
                }
            }
        }
    }
}

impl Agent for AsyncDecoupler {
    fn name(&self) -> &str {
        self.agent.name()
    }

    fn inputs(&self) -> &[String] {
        self.agent.inputs()
    }

    fn outputs(&self) -> &[String] {
        self.agent.outputs()
    }

    /// Discard queued messages, then reset the wrapped agent.
    ///
    /// A message the worker has already dequeued may still reach the agent
    /// after this returns.
    fn reset(&self) {
        let discarded = self.drain.try_iter().count();
        if discarded > 0 {
            tracing::debug!(agent = self.agent.name(), discarded, "mailbox cleared");
        }
        self.agent.reset();
    }

    fn receive(&self, topic: &str, message: &Message) {
        let topic = canonical_topic(topic);
        if topic.is_empty() {
            tracing::warn!(agent = self.agent.name(), "message without topic dropped");
            return;
        }
        if !self.is_running() {
            self.counters.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(
                agent = self.agent.name(),
                topic = %topic,
                "mailbox shut down, message dropped"
            );
            return;
        }

        match self
            .mailbox
            .send_timeout((topic, message.clone()), self.timeout)
        {
            Ok(()) => {
                self.counters.accepted.fetch_add(1, Ordering::Relaxed);
            }
            Err(SendTimeoutError::Timeout((topic, _)) | SendTimeoutError::Disconnected((topic, _))) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    agent = self.agent.name(),
                    topic = %topic,
                    "mailbox full, message dropped"
                );
            }
        }
    }

    /// Detach from the broker, stop the worker, then shut the agent down.
    ///
    /// Waits at most `timeout` for the worker; a worker stuck inside the
    /// agent is logged and left behind. Calling this twice is a no-op.
    fn shutdown(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        self.broker.detach(self);
        self.stop_worker();
        self.agent.shutdown();
    }
}

impl std::fmt::Debug for AsyncDecoupler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncDecoupler")
            .field("agent", &self.agent.name())
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}

struct Worker {
    agent: Arc<dyn Agent>,
    inbox: Receiver<Envelope>,
    stop: Receiver<()>,
    running: Arc<AtomicBool>,
    counters: Arc<Counters>,
    timeout: Duration,
    _finished: Sender<()>,
}

impl Worker {
    fn run(self) {
        tracing::debug!(agent = self.agent.name(), "mailbox worker started");

        while self.running.load(Ordering::SeqCst) {
            select! {
                recv(self.stop) -> _ => break,
                recv(self.inbox) -> entry => match entry {
                    Ok((topic, message)) => self.deliver(&topic, &message),
                    Err(_) => break,
                },
                default(self.timeout) => {}
            }
        }

        tracing::debug!(agent = self.agent.name(), "mailbox worker stopped");
    }

    fn deliver(&self, topic: &str, message: &Message) {
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.agent.receive(topic, message)));
        match result {
            Ok(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
            }
            Err(payload) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    agent = self.agent.name(),
                    topic,
                    panic = panic_message(payload.as_ref()),
                    "agent panicked while handling message"
                );
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}
