//! redis-fleet-status - topology and health scanner for Redis deployments
//!
//! Scans standalone, sentinel and cluster deployments and reports one
//! status snapshot per deployment.

use std::io;

use anyhow::{Context, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use redis_fleet_status::client::ConnectionFactory;
use redis_fleet_status::config::{CliArgs, ScanConfig};
use redis_fleet_status::metrics::SnapshotReporter;
use redis_fleet_status::probe::RespQueries;
use redis_fleet_status::scan::Scanner;

/// Exit code when `--fail-on-abort` is set and a scan aborted
const EXIT_ABORTED: i32 = 2;

fn setup_logging(verbose: bool, quiet: bool) -> Result<()> {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    // Reports go to stdout; logs stay on stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Returns the number of aborted scans
fn run() -> Result<usize> {
    let args = CliArgs::parse_args();
    setup_logging(args.verbose, args.quiet)?;

    let config = ScanConfig::from_cli(&args).context("Configuration error")?;
    info!(
        "Scanning {} deployment(s), connect timeout {:?}, probe timeout {:?}",
        config.deployments.len(),
        config.connect_timeout,
        config.probe_timeout
    );

    let factory = ConnectionFactory::new(config.connect_timeout, config.probe_timeout);
    let scanner = Scanner::new(RespQueries::new(factory));
    let reporter = SnapshotReporter::new(config.output);

    reporter
        .write_header(&mut io::stdout().lock())
        .context("Failed to write report")?;

    let mut aborted = 0;
    for deployment in &config.deployments {
        let outcome = scanner.scan(deployment);
        if outcome.is_err() {
            aborted += 1;
        }
        reporter
            .report(deployment, &outcome)
            .context("Failed to write report")?;
    }

    if aborted > 0 && !config.fail_on_abort {
        info!("{} of {} scan(s) aborted", aborted, config.deployments.len());
    }
    Ok(if config.fail_on_abort { aborted } else { 0 })
}

fn main() {
    match run() {
        Ok(0) => {}
        Ok(aborted) => {
            error!("{} scan(s) aborted", aborted);
            std::process::exit(EXIT_ABORTED);
        }
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
