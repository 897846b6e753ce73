//! redis-fleet-status library
//!
//! Probes Redis/Valkey deployments (standalone, sentinel, cluster) and
//! aggregates their topology and health into one status snapshot per scan.

pub mod client;
pub mod cluster;
pub mod config;
pub mod metrics;
pub mod probe;
pub mod scan;
pub mod utils;
