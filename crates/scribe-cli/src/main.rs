//! # scribe-cli
//!
//! The `scribe` daemon: reads newline-delimited JSON transport events on
//! stdin, runs them through the recording/selection pipeline, and writes
//! replies to stdout. SIGHUP reloads the configuration.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scribe_archive::GithubArchive;
use scribe_core::{Config, ConfigHandle, ContentRenderer};
use scribe_engine::Orchestrator;
use scribe_history::HistoryRegistry;

mod stdio;

/// Scribe - channel chat recorder and archiver
#[derive(Parser)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Extra config file merged over the standard sources
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Load configuration
    let config = Config::load_validated(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    log_config_summary(&config);
    let config = ConfigHandle::new(config).with_extra_path(cli.config.clone());

    // Wire the pipeline
    let registry = Arc::new(HistoryRegistry::new());
    let renderer = Arc::new(ContentRenderer::new(Arc::new(stdio::PassthroughResolver)));
    let sink = Arc::new(GithubArchive::new(config.clone()));
    let transport = Arc::new(stdio::StdoutReplies::new());
    let orchestrator = Arc::new(Orchestrator::new(
        config.clone(),
        registry,
        renderer,
        sink,
        transport,
    ));

    spawn_reload_on_sighup(config);

    let (tx, rx) = mpsc::channel(256);
    let pipeline = tokio::spawn(orchestrator.run(rx));

    // Returns on stdin EOF; dropping the sender lets the pipeline drain.
    stdio::read_events(tx).await?;
    pipeline.await?;

    Ok(())
}

fn log_config_summary(config: &Config) {
    tracing::info!("Scribe starting");
    tracing::info!(
        "Channel -> repository mappings: {}",
        summarize(&config.channel_repos)
    );
    tracing::info!(
        "User -> display-name overrides: {}",
        summarize(&config.display_names)
    );
}

fn summarize(map: &std::collections::HashMap<String, String>) -> String {
    if map.is_empty() {
        return "(none)".to_string();
    }
    let mut entries: Vec<_> = map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
    entries.sort();
    entries.join("; ")
}

#[cfg(unix)]
fn spawn_reload_on_sighup(config: ConfigHandle) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let mut hangups = match signal(SignalKind::hangup()) {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!("SIGHUP handler unavailable: {}", err);
                return;
            }
        };
        while hangups.recv().await.is_some() {
            match config.reload() {
                Ok(()) => tracing::info!("configuration reloaded"),
                Err(err) => tracing::warn!("configuration reload failed: {}", err),
            }
        }
    });
}

#[cfg(not(unix))]
fn spawn_reload_on_sighup(_config: ConfigHandle) {}
