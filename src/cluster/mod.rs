//! Cluster topology parsing
//!
//! CLUSTER NODES is used to locate the primaries that hold data, so keyspace
//! and memory figures can be collected from every shard.

pub mod node;
pub mod topology;

pub use node::ClusterNode;
pub use topology::{ClusterTopology, SLOT_COUNT};
