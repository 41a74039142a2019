use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use skeleton_loader::cards::{sample_cards, Card};
use skeleton_loader::config::{Config, Target};
use skeleton_loader::loader::{
    DataSource, DelayedSource, FetchFailure, HttpSource, LoadResult, LoadStateMachine, LoadView,
    LoaderOptions,
};
use skeleton_loader::logging::init_tracing;

/// Load data behind a grace period, showing a skeleton only when it's slow.
#[derive(Debug, Parser)]
#[command(name = "skeleton-loader", version)]
struct Cli {
    /// Config file (default: the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Grace period in milliseconds before the placeholder appears.
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load two sample cards from a simulated source.
    Demo {
        /// Simulated fetch latency in milliseconds.
        #[arg(long)]
        latency_ms: Option<u64>,

        /// Make the simulated fetch fail with this reason.
        #[arg(long, value_name = "REASON")]
        fail: Option<String>,
    },

    /// Load JSON from each URL (or each configured target).
    Fetch { urls: Vec<String> },
}

#[derive(Serialize)]
struct ViewLine<'a, T> {
    target: &'a str,
    elapsed_ms: u64,
    data: Option<T>,
    placeholder_visible: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    if let Some(timeout_ms) = cli.timeout_ms {
        config.loader.timeout_ms = timeout_ms;
    }
    config.validate()?;

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, tearing down");
            ctrl_c.cancel();
        }
    });

    match cli.command {
        Command::Demo { latency_ms, fail } => {
            let latency = latency_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.demo.latency());
            let source: DelayedSource<Vec<Card>> = match fail {
                Some(reason) => DelayedSource::failing(latency, FetchFailure::transport(reason)),
                None => DelayedSource::succeeding(latency, sample_cards()),
            };
            let machine = LoadStateMachine::new(LoaderOptions::from_settings(&config.loader, source));
            run("demo", machine, shutdown).await?;
        }

        Command::Fetch { urls } => {
            let targets: Vec<Target> = if urls.is_empty() {
                config.targets.clone()
            } else {
                urls.into_iter()
                    .map(|url| Target {
                        name: url.clone(),
                        url,
                    })
                    .collect()
            };
            anyhow::ensure!(!targets.is_empty(), "no URLs given and no targets configured");

            let client = reqwest::Client::new();
            let mut tasks = JoinSet::new();
            for target in targets {
                let source: HttpSource<serde_json::Value> =
                    HttpSource::with_client(client.clone(), target.url);
                let machine =
                    LoadStateMachine::new(LoaderOptions::from_settings(&config.loader, source));
                let shutdown = shutdown.clone();
                tasks.spawn(async move { run(&target.name, machine, shutdown).await });
            }
            while let Some(joined) = tasks.join_next().await {
                joined??;
            }
        }
    }

    Ok(())
}

/// Drive one load cycle, printing every view the consumer would see as a
/// JSON line.
async fn run<S>(
    name: &str,
    machine: LoadStateMachine<S>,
    shutdown: CancellationToken,
) -> anyhow::Result<()>
where
    S: DataSource,
    S::Output: Serialize,
{
    let started = Instant::now();
    let mut views = machine.subscribe();
    machine.start();

    let settled = machine.settled();
    tokio::pin!(settled);

    let print = |view: LoadView<S::Output>| -> anyhow::Result<()> {
        let line = ViewLine {
            target: name,
            elapsed_ms: started.elapsed().as_millis() as u64,
            data: view.data,
            placeholder_visible: view.placeholder_visible,
        };
        println!("{}", serde_json::to_string(&line)?);
        Ok(())
    };

    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => {
                machine.teardown();
                return Ok(());
            }
            Some(view) = views.next() => print(view)?,
            result = &mut settled => {
                while let Some(view) = views.try_next() {
                    print(view)?;
                }
                if let Some(LoadResult::Failure(failure)) = result {
                    tracing::info!(source = name, error = %failure, "Load ended without data");
                }
                return Ok(());
            }
        }
    }
}
