//! Scan orchestrator
//!
//! `START -> BASE_INFO -> TOTALS | MODE_AGGREGATE -> DONE`, with the only
//! abort edge out of `BASE_INFO`. Totals and mode aggregation run on scoped
//! threads once the mode is known.

use std::fmt;
use std::panic;
use std::thread;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use tracing::{debug, error, info};

use super::aggregator::{ModeAggregator, PartialSnapshot};
use super::base_info::{self, BaseInfo};
use super::model::{Deployment, StatusSnapshot};
use super::totals::{self, Totals};
use crate::probe::{DeploymentQuery, NodeQuery};
use crate::utils::ScanAborted;

/// Scan lifecycle phases, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    Start,
    BaseInfo,
    Totals,
    ModeAggregate,
    Done,
    Aborted,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScanPhase::Start => "START",
            ScanPhase::BaseInfo => "BASE_INFO",
            ScanPhase::Totals => "TOTALS",
            ScanPhase::ModeAggregate => "MODE_AGGREGATE",
            ScanPhase::Done => "DONE",
            ScanPhase::Aborted => "ABORTED",
        };
        f.write_str(s)
    }
}

/// Runs scans against any query backend. Holds no per-scan state.
pub struct Scanner<Q> {
    queries: Q,
}

impl<Q> Scanner<Q>
where
    Q: NodeQuery + DeploymentQuery,
{
    pub fn new(queries: Q) -> Self {
        Self { queries }
    }

    pub fn queries(&self) -> &Q {
        &self.queries
    }

    /// Scan one deployment.
    ///
    /// Returns `Err` only when base info cannot be trusted. Every later
    /// failure is recorded on the snapshot as a partial failure.
    pub fn scan(&self, deployment: &Deployment) -> Result<StatusSnapshot, ScanAborted> {
        let started = Instant::now();
        let scanned_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        transition(deployment, ScanPhase::Start);
        transition(deployment, ScanPhase::BaseInfo);
        let base = match base_info::resolve(&self.queries, deployment) {
            Ok(base) => base,
            Err(e) => {
                transition(deployment, ScanPhase::Aborted);
                error!(deployment = %deployment.name, "scan aborted: {}", e);
                return Err(e);
            }
        };

        let aggregator = ModeAggregator::for_mode(base.mode);
        let queries = &self.queries;
        let (totals, partial) = thread::scope(|s| {
            let totals_handle = s.spawn(|| {
                transition(deployment, ScanPhase::Totals);
                totals::collect(queries, deployment, base.mode)
            });

            transition(deployment, ScanPhase::ModeAggregate);
            let partial = aggregator.aggregate(queries, deployment);

            let totals = totals_handle
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            (totals, partial)
        });

        let mut snapshot = assemble(deployment, base, totals, partial);
        snapshot.scanned_at_ms = scanned_at_ms;
        snapshot.scan_duration = started.elapsed();

        transition(deployment, ScanPhase::Done);
        info!(
            deployment = %deployment.name,
            state = %snapshot.state,
            partial_failures = snapshot.partial_failures.len(),
            elapsed_ms = snapshot.scan_duration.as_millis() as u64,
            "scan complete"
        );
        Ok(snapshot)
    }
}

fn transition(deployment: &Deployment, phase: ScanPhase) {
    debug!(deployment = %deployment.name, %phase, "scan phase");
}

fn assemble(
    deployment: &Deployment,
    base: BaseInfo,
    totals: Totals,
    partial: PartialSnapshot,
) -> StatusSnapshot {
    let mut partial_failures = totals.failures;
    partial_failures.extend(partial.failures);

    StatusSnapshot {
        deployment_id: deployment.id,
        deployment_name: deployment.name.clone(),
        state: partial.state,
        mode: Some(base.mode),
        os: base.os,
        version: base.version,

        known_nodes: partial.known_nodes,
        cluster_size: partial.cluster_size,

        slots_assigned: partial.slots_assigned,
        slots_ok: partial.slots_ok,
        slots_fail: partial.slots_fail,
        slots_pfail: partial.slots_pfail,

        sentinel_ok: partial.sentinel_ok,
        sentinel_down: partial.sentinel_down,
        master_ok: partial.master_ok,
        sentinel_masters: partial.sentinel_masters,

        db_count: totals.db_count,
        total_keys: totals.total_keys,
        total_expires: totals.total_expires,
        used_memory: totals.used_memory,

        partial_failures,
        ..Default::default()
    }
}
