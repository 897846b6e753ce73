//! Command-line argument parsing

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::scan::Mode;

/// Topology and health scanner for Redis deployments
#[derive(Parser, Debug, Clone)]
#[command(name = "redis-fleet-status")]
#[command(version, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct CliArgs {
    /// Print help information
    #[arg(long = "help", action = clap::ArgAction::Help)]
    help: (),

    // ===== Deployment =====
    /// Server hostname (can be specified multiple times, all share --port)
    #[arg(short = 'h', long = "host", action = clap::ArgAction::Append)]
    pub hosts: Vec<String>,

    /// Server port for every --host
    #[arg(short = 'p', long = "port", default_value_t = 6379)]
    pub port: u16,

    /// Endpoint as host:port (can be specified multiple times)
    #[arg(long = "node", action = clap::ArgAction::Append)]
    pub nodes: Vec<String>,

    /// Deployment name used in reports
    #[arg(long = "name", default_value = "default")]
    pub name: String,

    /// Declared mode; the scan aborts if the server reports another
    #[arg(long = "mode", value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// TOML inventory of deployments (replaces --host/--node)
    #[arg(long = "inventory")]
    pub inventory: Option<PathBuf>,

    // ===== Authentication =====
    /// Password for AUTH command
    #[arg(short = 'a', long = "auth")]
    pub password: Option<String>,

    /// Username for ACL AUTH (requires --auth)
    #[arg(long = "user")]
    pub username: Option<String>,

    // ===== Timing =====
    /// Connection timeout in milliseconds
    #[arg(long = "connect-timeout", default_value_t = 2000)]
    pub connect_timeout_ms: u64,

    /// Deadline for each probe command and its reply, in milliseconds
    #[arg(long = "probe-timeout", default_value_t = 2000)]
    pub probe_timeout_ms: u64,

    // ===== Output =====
    /// Output format
    #[arg(long = "output", value_enum, default_value_t = OutputFormat::Console)]
    pub output: OutputFormat,

    /// Exit non-zero if any scan aborted
    #[arg(long = "fail-on-abort")]
    pub fail_on_abort: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

/// Output format for scan results
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Console,
    Json,
    Csv,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse().map_err(|e: crate::utils::ConfigurationError| e.to_string())
}

impl CliArgs {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.username.is_some() && self.password.is_none() {
            return Err("--user requires --auth to be set".to_string());
        }

        if self.inventory.is_some() && (!self.hosts.is_empty() || !self.nodes.is_empty()) {
            return Err("--inventory cannot be combined with --host or --node".to_string());
        }

        if self.connect_timeout_ms == 0 || self.probe_timeout_ms == 0 {
            return Err("timeouts must be at least 1 ms".to_string());
        }

        if self.verbose && self.quiet {
            return Err("--verbose and --quiet are mutually exclusive".to_string());
        }

        Ok(())
    }
}
