//! Standalone aggregation: one data node plus its replicas

use tracing::warn;

use super::aggregator::PartialSnapshot;
use super::model::{Deployment, FieldGroup, PartialFailure, State};
use crate::probe::DeploymentQuery;

pub fn aggregate<Q>(queries: &Q, deployment: &Deployment) -> PartialSnapshot
where
    Q: DeploymentQuery + ?Sized,
{
    let mut partial = PartialSnapshot {
        state: State::Healthy,
        ..Default::default()
    };

    match queries.members(deployment) {
        Ok(members) => {
            partial.known_nodes = Some(members.len() as u64);
            partial.cluster_size = Some(1);
        }
        Err(e) => {
            warn!(deployment = %deployment.name, "member list unavailable: {}", e);
            partial.failures.push(PartialFailure::new(FieldGroup::Members, e));
        }
    }

    partial
}
