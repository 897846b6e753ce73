//! INFO parsing and snapshot reporting

pub mod info_fields;
pub mod reporter;

pub use info_fields::{format_memory_human, kv_lookup, InfoFields};
pub use reporter::SnapshotReporter;
