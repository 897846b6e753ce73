//! Configuration module

pub mod cli;
pub mod scan_config;

pub use cli::{CliArgs, OutputFormat};
pub use scan_config::{load_inventory, parse_inventory, ScanConfig};
