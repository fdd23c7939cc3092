use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use live_status::console::ConsoleTransport;
use live_status::script::{parse_script, replay};
use live_status::{ChatTarget, StatusConfig, StatusUpdater};

/// Replay a timed event script against a console transport and print every
/// remote call the status updater makes.
#[derive(Debug, Parser)]
#[command(name = "live-status", version)]
struct Args {
    /// JSONL event script; read from stdin when omitted.
    #[arg(long)]
    script: Option<PathBuf>,

    /// JSON config file (defaults to the platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the minimum interval between remote updates.
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Simulated duration of each remote call.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,

    /// Chat the status message is posted to.
    #[arg(long, default_value = "console")]
    target: String,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();

    let mut config = StatusConfig::load_or_default(args.config.as_deref())?;
    if let Some(interval_ms) = args.interval_ms {
        config.thinking.interval_ms = interval_ms;
    }
    debug!(?config, "resolved configuration");

    let input = match &args.script {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read script from stdin")?;
            buf
        }
    };
    let steps = parse_script(&input).context("invalid script")?;
    info!(steps = steps.len(), "replaying script");

    let transport = Arc::new(ConsoleTransport::stdout(Duration::from_millis(
        args.latency_ms,
    )));
    let updater = StatusUpdater::new(config, transport, ChatTarget::new(args.target));
    replay(&updater, &steps).await;

    info!("replay finished");
    Ok(())
}
