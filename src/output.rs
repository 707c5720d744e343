//! Graph output and the watch loop.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use topicflow_broker::{Broker, GraphSnapshot};

/// Where graph snapshots go.
#[derive(Debug)]
pub enum Output {
    /// Print the text rendering to stdout.
    Stdout,

    /// Write pretty JSON to a file, overwritten on each emit.
    File(PathBuf),

    /// Send snapshots through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(mpsc::Sender<GraphSnapshot>),
}

impl Output {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a channel output and return both the output and receiver.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<GraphSnapshot>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Emit a snapshot to this output.
    pub async fn emit(&self, graph: &GraphSnapshot) -> std::io::Result<()> {
        match self {
            Output::Stdout => {
                print!("{}", render_text(graph));
            }
            Output::File(path) => {
                let json = serde_json::to_string_pretty(graph)?;
                tokio::fs::write(path, json).await?;
            }
            Output::Channel(tx) => {
                // Best effort send (don't block if channel is full)
                let _ = tx.try_send(graph.clone());
            }
        }
        Ok(())
    }
}

/// Text rendering: one line per node with edges, then the cycle verdict.
pub fn render_text(graph: &GraphSnapshot) -> String {
    let verdict = if graph.has_cycles() { "yes" } else { "no" };
    format!("{}cycles: {}\n", graph, verdict)
}

/// Handle to a running watch loop.
#[derive(Debug)]
pub struct WatchHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the loop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

/// Emit a fresh snapshot of `broker` to every output on each tick.
///
/// The first snapshot is emitted immediately. Must be called from within a
/// tokio runtime.
pub fn watch(broker: Broker, outputs: Vec<Output>, interval: Duration) -> WatchHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let graph = broker.graph();
                    for output in &outputs {
                        if let Err(e) = output.emit(&graph).await {
                            tracing::warn!(error = %e, "failed to emit graph");
                        }
                    }
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
    });

    WatchHandle { stop_tx, task }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use topicflow_broker::IncrementAgent;

    fn pipeline() -> Broker {
        let broker = Broker::new();
        let inc = IncrementAgent::new(&broker, &["A"], &["B"]).unwrap();
        broker.attach(Arc::new(inc));
        broker
    }

    #[test]
    fn text_rendering_ends_with_cycle_verdict() {
        let broker = pipeline();
        broker.publish("A", 2.0);

        let text = render_text(&broker.graph());

        assert!(text.contains("TA -> AIncAgent[2.00]"));
        assert!(text.ends_with("cycles: no\n"));
    }

    #[test]
    fn file_output_writes_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let graph = pipeline().graph();

        tokio_test::block_on(Output::file(&path).emit(&graph)).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let parsed: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.nodes, graph.nodes);
    }

    #[tokio::test(start_paused = true)]
    async fn watch_emits_on_every_tick_until_stopped() {
        let broker = pipeline();
        let (output, mut rx) = Output::channel(16);
        let handle = watch(broker.clone(), vec![output], Duration::from_secs(1));

        let first = rx.recv().await.unwrap();
        assert_eq!(first.topic("B").and_then(|n| n.publish_count), Some(0));

        broker.publish("A", 1.0);
        tokio::time::advance(Duration::from_secs(1)).await;
        let second = rx.recv().await.unwrap();
        assert_eq!(second.topic("B").and_then(|n| n.publish_count), Some(1));

        handle.stop().await;
        assert!(rx.recv().await.is_none());
    }
}
