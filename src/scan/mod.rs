//! Deployment scanning: base info, totals and per-mode aggregation

pub mod aggregator;
pub mod base_info;
pub mod cluster;
pub mod model;
pub mod orchestrator;
pub mod sentinel;
pub mod standalone;
pub mod totals;

#[cfg(test)]
pub(crate) mod mock;

pub use aggregator::{ModeAggregator, PartialSnapshot};
pub use model::{
    Credentials, Deployment, Endpoint, FieldGroup, KeyspaceSample, Mode, PartialFailure, State,
    StatusSnapshot,
};
pub use orchestrator::{ScanPhase, Scanner};
