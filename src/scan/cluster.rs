//! Cluster aggregation from `CLUSTER INFO`

use tracing::{debug, warn};

use super::aggregator::PartialSnapshot;
use super::model::{Deployment, FieldGroup, PartialFailure, State};
use crate::cluster::SLOT_COUNT;
use crate::metrics::InfoFields;
use crate::probe::DeploymentQuery;

/// Numeric `CLUSTER INFO` fields carried onto the snapshot
const MAPPED_FIELDS: [&str; 6] = [
    "cluster_known_nodes",
    "cluster_size",
    "cluster_slots_assigned",
    "cluster_slots_ok",
    "cluster_slots_fail",
    "cluster_slots_pfail",
];

/// Map `CLUSTER INFO` fields onto the snapshot.
///
/// A mapped field that is missing or not a number stays `None`, and a single
/// `cluster_status` failure names every such field. The state mirrors
/// `cluster_state`; without it, full healthy slot coverage counts as healthy.
pub fn from_cluster_info(info: &InfoFields) -> PartialSnapshot {
    let mut partial = PartialSnapshot {
        known_nodes: info.get_u64("cluster_known_nodes"),
        cluster_size: info.get_u64("cluster_size"),
        slots_assigned: info.get_u64("cluster_slots_assigned"),
        slots_ok: info.get_u64("cluster_slots_ok"),
        slots_fail: info.get_u64("cluster_slots_fail"),
        slots_pfail: info.get_u64("cluster_slots_pfail"),
        ..Default::default()
    };

    partial.state = match info.get("cluster_state") {
        Some("ok") => State::Healthy,
        Some(_) => State::Degraded,
        None => {
            let covered = partial.slots_ok == Some(u64::from(SLOT_COUNT));
            let clean = partial.slots_fail == Some(0) && partial.slots_pfail == Some(0);
            if covered && clean {
                State::Healthy
            } else {
                State::Degraded
            }
        }
    };

    let mut bad: Vec<String> = MAPPED_FIELDS
        .iter()
        .filter_map(|&key| match info.get(key) {
            None => Some(format!("{} missing", key)),
            Some(raw) if raw.parse::<u64>().is_err() => Some(format!("{} not a number", key)),
            Some(_) => None,
        })
        .collect();
    if info.get("cluster_state").is_none() {
        bad.push("cluster_state missing".to_string());
    }
    if !bad.is_empty() {
        partial
            .failures
            .push(PartialFailure::new(FieldGroup::ClusterStatus, bad.join(", ")));
    }
    partial
}

pub fn aggregate<Q>(queries: &Q, deployment: &Deployment) -> PartialSnapshot
where
    Q: DeploymentQuery + ?Sized,
{
    match queries.cluster_status(deployment) {
        Ok(info) => {
            let partial = from_cluster_info(&info);
            debug!(
                deployment = %deployment.name,
                state = %partial.state,
                slots_ok = ?partial.slots_ok,
                "cluster info"
            );
            partial
        }
        Err(e) => {
            warn!(deployment = %deployment.name, "cluster status unavailable: {}", e);
            PartialSnapshot {
                state: State::Degraded,
                failures: vec![PartialFailure::new(FieldGroup::ClusterStatus, e)],
                ..Default::default()
            }
        }
    }
}
