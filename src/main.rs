use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use topicflow::duration::{format_duration, parse_duration};
use topicflow::{render_text, watch, Deployment, GraphConfig, Output};
use topicflow_broker::{AgentFactory, Broker};

#[derive(Parser, Debug)]
#[command(name = "topicflow")]
#[command(about = "Deploy a graph of numeric agents and inspect the resulting topic graph")]
struct Args {
    /// Path to the graph description (TOML, YAML or JSON)
    #[arg(short, long, default_value = "graph.toml")]
    config: PathBuf,

    /// Publish a value after loading (repeatable), e.g. --publish A=3.0
    #[arg(short, long = "publish", value_name = "TOPIC=VALUE", value_parser = parse_assignment)]
    publish: Vec<(String, String)>,

    /// How long to let published values cascade (e.g. "200ms", "1s")
    #[arg(long, default_value = "200ms")]
    settle: String,

    /// Export the graph to a JSON file and exit
    #[arg(short, long, conflicts_with = "watch")]
    export: Option<PathBuf>,

    /// Re-print the graph until interrupted
    #[arg(short, long)]
    watch: bool,

    /// Refresh interval for --watch (e.g. "1s", "500ms")
    #[arg(short, long, default_value = "1s")]
    refresh: String,

    /// Exit with an error if the graph contains a cycle
    #[arg(long)]
    fail_on_cycle: bool,
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((topic, value)) if !topic.trim().is_empty() => {
            Ok((topic.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected TOPIC=VALUE, got {:?}", s)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("topicflow=info,topicflow_broker=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settle = parse_duration(&args.settle).context("Invalid --settle")?;
    let refresh = parse_duration(&args.refresh).context("Invalid --refresh")?;

    let config = GraphConfig::load(&args.config)
        .with_context(|| format!("Failed to load {}", args.config.display()))?;

    let broker = Broker::new();
    let factory = AgentFactory::default();
    let mut deployment = Deployment::load(&broker, &config, &factory)?;

    for (topic, value) in &args.publish {
        tracing::debug!(topic = %topic, value = %value, "publishing");
        broker.publish(topic, value.as_str());
    }
    if !args.publish.is_empty() {
        std::thread::sleep(settle);
    }

    let rt = tokio::runtime::Runtime::new()?;
    let graph = broker.graph();
    let cyclic = graph.has_cycles();

    if let Some(export_path) = args.export {
        rt.block_on(Output::file(&export_path).emit(&graph))
            .with_context(|| format!("Failed to write {}", export_path.display()))?;
        println!("Exported graph to: {}", export_path.display());
    } else if args.watch {
        run_watch(&rt, &broker, refresh)?;
    } else {
        print!("{}", render_text(&graph));
    }

    deployment.shutdown();

    if args.fail_on_cycle && cyclic {
        bail!("Graph contains a cycle");
    }
    Ok(())
}

/// Print the graph every `refresh` until Ctrl-C
fn run_watch(rt: &tokio::runtime::Runtime, broker: &Broker, refresh: Duration) -> Result<()> {
    tracing::info!(refresh = %format_duration(refresh), "watching graph, Ctrl-C to stop");
    rt.block_on(async {
        let handle = watch(broker.clone(), vec![Output::Stdout], refresh);
        tokio::signal::ctrl_c().await?;
        handle.stop().await;
        Ok::<_, anyhow::Error>(())
    })
}
