//! Scan configuration derived from CLI arguments

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::cli::{CliArgs, OutputFormat};
use crate::scan::{Credentials, Deployment, Endpoint};
use crate::utils::ConfigurationError;

const DEFAULT_HOST: &str = "127.0.0.1";

/// Complete scan configuration
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub deployments: Vec<Deployment>,
    pub connect_timeout: Duration,
    pub probe_timeout: Duration,

    // Output
    pub output: OutputFormat,
    pub fail_on_abort: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl ScanConfig {
    /// Create configuration from CLI arguments
    pub fn from_cli(args: &CliArgs) -> Result<Self, ConfigurationError> {
        args.validate().map_err(ConfigurationError::Invalid)?;

        let credentials = args.password.as_ref().map(|p| Credentials {
            password: p.clone(),
            username: args.username.clone(),
        });

        let deployments = match args.inventory {
            Some(ref path) => {
                let mut deployments = load_inventory(path)?;
                // Inventory entries without credentials fall back to --auth
                for deployment in &mut deployments {
                    if deployment.credentials.is_none() {
                        deployment.credentials = credentials.clone();
                    }
                }
                deployments
            }
            None => {
                let mut deployment = Deployment::new(&args.name, endpoints_from_cli(args)?);
                deployment.id = 1;
                deployment.mode = args.mode;
                deployment.credentials = credentials;
                vec![deployment]
            }
        };

        Ok(Self {
            deployments,
            connect_timeout: Duration::from_millis(args.connect_timeout_ms),
            probe_timeout: Duration::from_millis(args.probe_timeout_ms),
            output: args.output,
            fail_on_abort: args.fail_on_abort,
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }
}

/// `--node host:port` entries first, then each `--host` on `--port`.
/// With neither, the local default server.
fn endpoints_from_cli(args: &CliArgs) -> Result<Vec<Endpoint>, ConfigurationError> {
    let mut endpoints = args
        .nodes
        .iter()
        .map(|n| n.parse())
        .collect::<Result<Vec<Endpoint>, _>>()?;

    endpoints.extend(args.hosts.iter().map(|h| Endpoint::new(h.as_str(), args.port)));

    if endpoints.is_empty() {
        endpoints.push(Endpoint::new(DEFAULT_HOST, args.port));
    }
    Ok(endpoints)
}

/// Inventory file: one `[[deployment]]` table per deployment
#[derive(Debug, Deserialize)]
struct Inventory {
    #[serde(default, rename = "deployment")]
    deployments: Vec<Deployment>,
}

/// Load a TOML inventory of deployments
pub fn load_inventory(path: &Path) -> Result<Vec<Deployment>, ConfigurationError> {
    let text = fs::read_to_string(path).map_err(|e| {
        ConfigurationError::Invalid(format!("cannot read inventory {}: {}", path.display(), e))
    })?;
    parse_inventory(&text)
}

/// Parse inventory text. Entries without an id are numbered by position.
pub fn parse_inventory(text: &str) -> Result<Vec<Deployment>, ConfigurationError> {
    let inventory: Inventory = toml::from_str(text)
        .map_err(|e| ConfigurationError::Invalid(format!("inventory: {}", e)))?;
    let mut deployments = inventory.deployments;

    if deployments.is_empty() {
        return Err(ConfigurationError::Invalid("inventory lists no deployments".to_string()));
    }

    for (i, deployment) in deployments.iter_mut().enumerate() {
        if deployment.id == 0 {
            deployment.id = i as u32 + 1;
        }
    }
    Ok(deployments)
}
