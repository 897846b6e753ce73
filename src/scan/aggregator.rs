//! Mode-specific aggregation, selected once per scan

use super::model::{Deployment, Mode, PartialFailure, State};
use super::{cluster, sentinel, standalone};
use crate::probe::{DeploymentQuery, NodeQuery};

/// Fields contributed by a mode aggregator
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialSnapshot {
    pub state: State,
    pub known_nodes: Option<u64>,
    pub cluster_size: Option<u64>,

    pub slots_assigned: Option<u64>,
    pub slots_ok: Option<u64>,
    pub slots_fail: Option<u64>,
    pub slots_pfail: Option<u64>,

    pub sentinel_ok: Option<u64>,
    pub sentinel_down: Option<u64>,
    pub master_ok: Option<u64>,
    pub sentinel_masters: Option<u64>,

    pub failures: Vec<PartialFailure>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeAggregator {
    Standalone,
    Sentinel,
    Cluster,
}

impl ModeAggregator {
    pub fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Standalone => ModeAggregator::Standalone,
            Mode::Sentinel => ModeAggregator::Sentinel,
            Mode::Cluster => ModeAggregator::Cluster,
        }
    }

    /// Never fails: each variant turns its own failures into markers
    pub fn aggregate<Q>(&self, queries: &Q, deployment: &Deployment) -> PartialSnapshot
    where
        Q: NodeQuery + DeploymentQuery + ?Sized,
    {
        match self {
            ModeAggregator::Standalone => standalone::aggregate(queries, deployment),
            ModeAggregator::Sentinel => sentinel::aggregate(queries, deployment),
            ModeAggregator::Cluster => cluster::aggregate(queries, deployment),
        }
    }
}
