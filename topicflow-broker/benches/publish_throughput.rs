use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use topicflow_broker::{Agent, AsyncDecoupler, Broker, DecouplerConfig, Message};

/// Counts deliveries and nothing else
struct CountingAgent {
    inputs: Vec<String>,
    outputs: Vec<String>,
    seen: AtomicU64,
}

impl CountingAgent {
    fn new(topic: &str) -> Self {
        Self {
            inputs: vec![topic.to_uppercase()],
            outputs: Vec::new(),
            seen: AtomicU64::new(0),
        }
    }
}

impl Agent for CountingAgent {
    fn name(&self) -> &str {
        "counter"
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn reset(&self) {}

    fn receive(&self, _topic: &str, message: &Message) {
        black_box(message.value());
        self.seen.fetch_add(1, Ordering::Relaxed);
    }

    fn shutdown(&self) {}
}

/// Benchmark concurrent publishes to one topic with varying thread counts
fn bench_concurrent_publish_same_topic(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_publish_same_topic");

    for thread_count in [1, 2, 4, 8].iter() {
        group.throughput(Throughput::Elements(*thread_count as u64 * 1000));
        group.bench_with_input(
            BenchmarkId::new("threads", thread_count),
            thread_count,
            |b, &thread_count| {
                b.iter(|| {
                    let broker = Broker::new();
                    broker.attach(Arc::new(CountingAgent::new("shared")));

                    let handles: Vec<_> = (0..thread_count)
                        .map(|_| {
                            let broker = broker.clone();
                            thread::spawn(move || {
                                for i in 0..1000 {
                                    broker.publish(black_box("shared"), i as f64);
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark topic get-or-create across distinct names (low contention)
fn bench_concurrent_topic_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_topic_creation");

    for thread_count in [2, 4, 8].iter() {
        group.throughput(Throughput::Elements(*thread_count as u64 * 100));
        group.bench_with_input(
            BenchmarkId::from_parameter(thread_count),
            thread_count,
            |b, &thread_count| {
                b.iter(|| {
                    let broker = Broker::new();
                    let handles: Vec<_> = (0..thread_count)
                        .map(|t| {
                            let broker = broker.clone();
                            thread::spawn(move || {
                                for i in 0..100 {
                                    black_box(broker.topic(&format!("topic-{}-{}", t, i)));
                                }
                            })
                        })
                        .collect();

                    for handle in handles {
                        handle.join().unwrap();
                    }
                });
            },
        );
    }
    group.finish();
}

/// Benchmark publishing through a decoupled subscriber
fn bench_decoupled_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoupled_publish");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("mailbox_1024", |b| {
        b.iter(|| {
            let broker = Broker::new();
            let agent = Arc::new(CountingAgent::new("in"));
            let config = DecouplerConfig::default()
                .with_capacity(1024)
                .with_timeout(Duration::from_millis(100));
            let decoupler = AsyncDecoupler::spawn(&broker, agent.clone(), config).unwrap();

            for i in 0..1000 {
                broker.publish("in", i as f64);
            }
            while agent.seen.load(Ordering::Relaxed) < 1000 {
                thread::yield_now();
            }
            decoupler.shutdown();
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_concurrent_publish_same_topic,
    bench_concurrent_topic_creation,
    bench_decoupled_publish,
);
criterion_main!(benches);
