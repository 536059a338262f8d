use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgGroup, Parser};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use drainwatch::{
    FileSource, RetryPolicy, ServerCheck, SocketSource, StatsSource,
};

#[derive(Parser, Debug)]
#[command(name = "drainwatch")]
#[command(about = "Deployment gate for HAProxy backend server state")]
#[command(group(ArgGroup::new("mode").required(true).args(["ready", "drain"])))]
struct Args {
    /// Backend server name as it appears in the stats svname field
    #[arg(short, long)]
    backend: String,

    /// Check that every reporting row for the server is UP
    #[arg(long)]
    ready: bool,

    /// Check that the server's active sessions have drained to zero
    #[arg(long)]
    drain: bool,

    /// Path to the HAProxy admin socket
    #[arg(long, default_value = SocketSource::DEFAULT_SOCKET, conflicts_with = "stats_file")]
    socket: PathBuf,

    /// Read stats from a CSV dump file instead of the admin socket
    #[arg(long)]
    stats_file: Option<PathBuf>,

    /// Seconds to sleep between drain polls
    #[arg(long, default_value_t = 20.0)]
    sleep_for: f64,

    /// Maximum number of drain retries after the first poll
    #[arg(long, default_value_t = 15)]
    loop_for: u32,
}

fn main() -> Result<()> {
    // Diagnostics go to stderr so stdout carries only the status lines
    // automation greps for.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drainwatch=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let source: Box<dyn StatsSource> = match &args.stats_file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(SocketSource::new(&args.socket)),
    };
    tracing::debug!(
        source = source.description(),
        backend = %args.backend,
        "Starting check"
    );

    let mut check = ServerCheck::new(source, &args.backend);

    if args.ready {
        check.check_enabled()?;
    } else {
        let policy = RetryPolicy::new(args.sleep_for, args.loop_for);
        check.check_drained(&policy)?;
    }

    Ok(())
}
