use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use heartbeat_source::config::{Config, LogFormat};
use heartbeat_source::{HeartbeatAdapter, Sink, create_sink, logging};

/// Heartbeat source - emits a CloudEvent to a sink at a fixed interval.
#[derive(Parser, Debug)]
#[command(name = "heartbeat-source", version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, env = "HEARTBEAT_CONFIG")]
    config: Option<PathBuf>,

    /// Interval between events, for example "5s" or "100ms"
    #[arg(short, long, env = "INTERVAL")]
    interval: Option<String>,

    /// Sink URI events are POSTed to
    #[arg(long = "sink", env = "K_SINK")]
    sink_uri: Option<String>,

    /// Sink kind: "http" or "log"
    #[arg(long, env = "SINK_KIND")]
    sink_kind: Option<String>,

    /// Namespace the source runs in (log context only)
    #[arg(long, env = "NAMESPACE")]
    namespace: Option<String>,

    #[arg(long, env = "LOG_FORMAT", value_enum)]
    log_format: Option<LogFormat>,
}

impl Cli {
    /// Command line and environment win over the config file.
    fn apply(self, config: &mut Config) {
        if let Some(interval) = self.interval {
            config.interval = Some(interval);
        }
        if let Some(uri) = self.sink_uri {
            config.sink.uri = Some(uri);
        }
        if let Some(kind) = self.sink_kind {
            config.sink.kind = kind;
        }
        if let Some(namespace) = self.namespace {
            config.namespace = Some(namespace);
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);

    logging::init(&config.logging)?;

    let adapter_config = config.validate().context("invalid configuration")?;
    let sink = create_sink(&adapter_config.sink).context("failed to create sink")?;

    info!(
        namespace = config.namespace.as_deref().unwrap_or("-"),
        sink = sink.name(),
        "Starting heartbeat source"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let mut adapter = HeartbeatAdapter::from_config(&adapter_config, sink);
    adapter
        .run(cancel)
        .await
        .context("heartbeat adapter stopped with an error")?;

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load {}", path.display())),
        None => Ok(Config::default()),
    }
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
    token.cancel();
}
