//! system-stats binary
//!
//! Samples CPU, memory and disk usage and forwards it to statsd until
//! interrupted.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use system_stats::{
    config::resolve_namespace, metrics::take_snapshot, shutdown, CollectionParameters, Collector,
    Snapshot, DEFAULT_STATSD_ADDRESS,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "system-stats")]
#[command(about = "Host metrics agent reporting cpu, memory and disk usage to statsd")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// statsd address
    #[arg(long, env = "STATSD_ADDRESS", default_value = DEFAULT_STATSD_ADDRESS)]
    statsd_address: String,

    /// Memory reporting interval
    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    memory_interval: Duration,

    /// Disk reporting interval
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    disk_interval: Duration,

    /// CPU reporting interval
    #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
    cpu_interval: Duration,

    /// Output additional extended metrics
    #[arg(long)]
    extended: bool,

    /// Node name used as the metric namespace, defaulting to the host name
    #[arg(long, env = "SYSTEM_STATS_NAME", default_value = "hostname")]
    name: String,

    /// Give up on resources that have not stopped after this long
    #[arg(long, value_parser = humantime::parse_duration)]
    stop_timeout: Option<Duration>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Report metrics to statsd until interrupted (default)
    Run,

    /// Collect for one window and print the metrics instead of sending them
    Snapshot(SnapshotArgs),
}

#[derive(Args)]
struct SnapshotArgs {
    /// Output format: json or pretty
    #[arg(short, long, default_value = "pretty")]
    format: String,

    /// How long to collect for
    #[arg(short, long, default_value = "1s", value_parser = humantime::parse_duration)]
    window: Duration,
}

impl Cli {
    fn parameters(&self) -> anyhow::Result<CollectionParameters> {
        let namespace = resolve_namespace(&self.name)?;
        let parameters = CollectionParameters::new(namespace)
            .with_statsd_address(&self.statsd_address)
            .with_extended(self.extended)
            .with_memory_interval(self.memory_interval)
            .with_cpu_interval(self.cpu_interval)
            .with_disk_interval(self.disk_interval)
            .with_stop_timeout(self.stop_timeout);
        parameters.validate()?;
        Ok(parameters)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Snapshot(args)) => snapshot_command(&cli, args).await,
        Some(Commands::Run) | None => run_command(&cli).await,
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

async fn run_command(cli: &Cli) -> anyhow::Result<()> {
    info!("Starting system-stats {}", env!("CARGO_PKG_VERSION"));

    let parameters = cli.parameters()?;
    info!(
        statsd = %parameters.statsd_address,
        namespace = %parameters.namespace,
        extended = parameters.extended,
        memory_interval = ?parameters.memory_interval,
        cpu_interval = ?parameters.cpu_interval,
        disk_interval = ?parameters.disk_interval,
        "Collection parameters"
    );

    let mut collector = Collector::from_parameters(&parameters)
        .await
        .context("Failed to build collector")?;
    collector.start().await.context("Failed to start collector")?;

    let signal = shutdown::wait_for_signal().await?;
    info!(%signal, "Received shutdown signal");

    // A second signal while shutting down skips the graceful path.
    tokio::spawn(async {
        if let Ok(signal) = shutdown::wait_for_signal().await {
            error!(%signal, "Received second signal, exiting immediately");
            std::process::exit(1);
        }
    });

    match collector.stop().await {
        Ok(()) => {
            info!("Shutdown complete");
            Ok(())
        }
        Err(err) if err.is_timeout() => {
            warn!(error = %err, "Shutdown completed with stuck resources");
            Err(err.into())
        }
        Err(err) => Err(anyhow::Error::new(err).context("Failed to flush stats")),
    }
}

async fn snapshot_command(cli: &Cli, args: &SnapshotArgs) -> anyhow::Result<()> {
    if args.window < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
        anyhow::bail!(
            "Snapshot window must be at least {:?}",
            sysinfo::MINIMUM_CPU_UPDATE_INTERVAL
        );
    }

    let snapshot = take_snapshot(args.window, cli.extended).await?;

    match args.format.as_str() {
        "json" => {
            let json = serde_json::to_string_pretty(&snapshot)?;
            println!("{}", json);
        }
        "pretty" => print_pretty_snapshot(&snapshot),
        other => anyhow::bail!("Unsupported format: {}. Use 'json' or 'pretty'", other),
    }

    Ok(())
}

fn print_pretty_snapshot(snapshot: &Snapshot) {
    println!(
        "System Snapshot ({}, {}ms window)",
        chrono::DateTime::from_timestamp_millis(snapshot.timestamp)
            .unwrap_or_default()
            .format("%Y-%m-%d %H:%M:%S UTC"),
        snapshot.window_ms
    );
    println!("==========================================");

    for (resource, metrics) in &snapshot.resources {
        println!();
        println!("{}:", resource);
        for metric in metrics {
            println!("  {:<24} {:>16.2}", metric.name, metric.value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "system-stats",
            "--statsd-address",
            "10.0.0.5:8125",
            "--cpu-interval",
            "500ms",
            "--extended",
            "--name",
            "web-01",
        ])
        .unwrap();

        assert_eq!(cli.statsd_address, "10.0.0.5:8125");
        assert_eq!(cli.cpu_interval, Duration::from_millis(500));
        assert!(cli.extended);

        let parameters = cli.parameters().unwrap();
        assert_eq!(parameters.namespace, "web-01");
        assert_eq!(parameters.cpu_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["system-stats"]).unwrap();
        assert_eq!(cli.memory_interval, Duration::from_secs(10));
        assert_eq!(cli.disk_interval, Duration::from_secs(30));
        assert_eq!(cli.cpu_interval, Duration::from_secs(5));
        assert_eq!(cli.name, "hostname");
        assert!(cli.stop_timeout.is_none());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_invalid_interval_rejected() {
        assert!(Cli::try_parse_from(["system-stats", "--disk-interval", "soon"]).is_err());
    }

    #[test]
    fn test_zero_interval_fails_validation() {
        let cli = Cli::try_parse_from(["system-stats", "--name", "n", "--cpu-interval", "0s"])
            .unwrap();
        assert!(cli.parameters().is_err());
    }

    #[test]
    fn test_snapshot_subcommand() {
        let cli =
            Cli::try_parse_from(["system-stats", "snapshot", "--format", "json", "--window", "2s"])
                .unwrap();
        match cli.command {
            Some(Commands::Snapshot(args)) => {
                assert_eq!(args.format, "json");
                assert_eq!(args.window, Duration::from_secs(2));
            }
            _ => panic!("expected snapshot command"),
        }
    }
}
