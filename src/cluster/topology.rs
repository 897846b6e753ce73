//! Cluster topology as reported by one node

use super::node::{parse_cluster_node_line, ClusterNode};
use crate::scan::Endpoint;
use crate::utils::ClusterError;

/// Total number of hash slots in a Redis/Valkey cluster
pub const SLOT_COUNT: u32 = 16384;

/// Cluster topology snapshot
#[derive(Debug, Clone)]
pub struct ClusterTopology {
    /// All nodes in the cluster
    pub nodes: Vec<ClusterNode>,
}

impl ClusterTopology {
    /// Parse CLUSTER NODES response
    pub fn from_cluster_nodes(response: &str) -> Result<Self, ClusterError> {
        let mut nodes = Vec::new();

        for line in response.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match parse_cluster_node_line(line) {
                Some(node) => nodes.push(node),
                None if line.split_whitespace().count() < 8 => {
                    return Err(ClusterError::ParseFailed(line.to_string()))
                }
                // Address-less nodes still joining; nothing to probe
                None => {}
            }
        }

        if !nodes.iter().any(|n| n.is_primary) {
            return Err(ClusterError::NoPrimaries);
        }

        Ok(Self { nodes })
    }

    /// Get all primary nodes
    pub fn primaries(&self) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter().filter(|n| n.is_primary)
    }

    /// Endpoints of primaries that own slots, i.e. the nodes holding data
    pub fn data_endpoints(&self) -> Vec<Endpoint> {
        self.primaries()
            .filter(|n| n.slot_count > 0)
            .map(|n| n.endpoint.clone())
            .collect()
    }
}
