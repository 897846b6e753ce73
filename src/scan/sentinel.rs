//! Sentinel aggregation
//!
//! Master health (as reported by sentinels) and sentinel liveness are
//! independent signals, collected by independent phases.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::aggregator::PartialSnapshot;
use super::model::{Credentials, Deployment, Endpoint, FieldGroup, PartialFailure, State};
use crate::metrics::{kv_lookup, InfoFields};
use crate::probe::parse::is_numbered;
use crate::probe::{DeploymentQuery, NodeQuery};
use crate::utils::{ProbeError, ProtocolError};

/// Master-status phase result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterStatus {
    /// `sentinel_masters`
    pub declared: u64,
    /// `master<N>` lines with `status=ok`
    pub ok: u64,
}

/// Parse `INFO sentinel`.
///
/// `master0:name=mymaster,status=ok,address=10.0.0.1:6379,slaves=2,sentinels=3`
/// counts as ok only when `status` is exactly `ok` (`sdown`/`odown` do not).
pub fn parse_master_status(info: &InfoFields) -> Result<MasterStatus, ProtocolError> {
    let declared = info.require_u64("sentinel_masters")?;
    let ok = info
        .with_prefix("master")
        .filter(|(name, _)| is_numbered(name, "master"))
        .filter(|(_, value)| kv_lookup(value, "status") == Some("ok"))
        .count() as u64;
    Ok(MasterStatus { declared, ok })
}

/// Liveness phase result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Liveness {
    pub ok: u64,
    pub down: Vec<Endpoint>,
}

/// Ping every sentinel in parallel. One endpoint failing never stops the others.
pub fn probe_liveness<Q>(
    queries: &Q,
    endpoints: &[Endpoint],
    credentials: Option<&Credentials>,
) -> Liveness
where
    Q: NodeQuery + ?Sized,
{
    let ok = AtomicUsize::new(0);
    let down = Mutex::new(Vec::new());

    thread::scope(|s| {
        for endpoint in endpoints {
            let (ok, down) = (&ok, &down);
            s.spawn(move || match queries.ping(endpoint, credentials) {
                Ok(()) => {
                    ok.fetch_add(1, Ordering::Relaxed);
                }
                Err(e) => {
                    warn!("sentinel {} is down: {}", endpoint, e);
                    down.lock().push(endpoint.clone());
                }
            });
        }
    });

    let mut down = down.into_inner();
    down.sort();
    Liveness {
        ok: ok.into_inner() as u64,
        down,
    }
}

pub fn aggregate<Q>(queries: &Q, deployment: &Deployment) -> PartialSnapshot
where
    Q: NodeQuery + DeploymentQuery + ?Sized,
{
    let endpoints = &deployment.endpoints;
    let credentials = deployment.credentials();

    let mut partial = PartialSnapshot {
        known_nodes: Some(endpoints.len() as u64),
        ..Default::default()
    };

    // Phase 1: master status. On failure the fields stay None for this scan.
    let masters = queries
        .sentinel_masters(endpoints, credentials)
        .and_then(|info| {
            parse_master_status(&info).map_err(|e| ProbeError::protocol(&deployment.name, e))
        });
    let masters_healthy = match masters {
        Ok(status) => {
            debug!(deployment = %deployment.name, declared = status.declared, ok = status.ok, "sentinel masters");
            partial.sentinel_masters = Some(status.declared);
            partial.master_ok = Some(status.ok);
            status.ok == status.declared
        }
        Err(e) => {
            warn!(deployment = %deployment.name, "sentinel master status unavailable: {}", e);
            partial
                .failures
                .push(PartialFailure::new(FieldGroup::SentinelMasters, e));
            false
        }
    };

    // Phase 2: liveness
    let liveness = probe_liveness(queries, endpoints, credentials);
    partial.sentinel_ok = Some(liveness.ok);
    partial.sentinel_down = Some(liveness.down.len() as u64);
    if !liveness.down.is_empty() {
        let down: Vec<String> = liveness.down.iter().map(ToString::to_string).collect();
        partial.failures.push(PartialFailure::new(
            FieldGroup::SentinelLiveness,
            format!("unreachable sentinels: {}", down.join(", ")),
        ));
    }

    partial.state = if masters_healthy && liveness.down.is_empty() {
        State::Healthy
    } else {
        State::Degraded
    };
    partial
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::mock::MockQueries;

    const SENTINEL_INFO: &str = "# Sentinel\r\n\
sentinel_masters:2\r\n\
sentinel_tilt:0\r\n\
master0:name=orders,status=ok,address=10.0.0.1:6379,slaves=2,sentinels=3\r\n\
master1:name=carts,status=odown,address=10.0.0.2:6379,slaves=2,sentinels=3\r\n";

    fn sentinels() -> Deployment {
        Deployment::new(
            "sentinels",
            vec![
                Endpoint::new("10.0.1.1", 26379),
                Endpoint::new("10.0.1.2", 26379),
                Endpoint::new("10.0.1.3", 26379),
            ],
        )
    }

    #[test]
    fn test_parse_master_status() {
        let status = parse_master_status(&InfoFields::parse(SENTINEL_INFO)).unwrap();
        assert_eq!(status, MasterStatus { declared: 2, ok: 1 });
    }

    #[test]
    fn test_status_must_equal_ok() {
        // "ok" appears in the name but the status is down
        let info = InfoFields::parse(
            "sentinel_masters:1\r\nmaster0:name=lookup,status=sdown,address=10.0.0.3:6379\r\n",
        );
        assert_eq!(parse_master_status(&info).unwrap().ok, 0);
    }

    #[test]
    fn test_two_of_three_sentinels_alive() {
        let queries = MockQueries::new().with_alive(&["10.0.1.1:26379", "10.0.1.3:26379"]);
        let deployment = sentinels();
        let liveness = probe_liveness(&queries, &deployment.endpoints, None);

        assert_eq!(liveness.ok, 2);
        assert_eq!(liveness.down, vec![Endpoint::new("10.0.1.2", 26379)]);
        // Every endpoint was probed despite the failure
        assert_eq!(queries.calls.lock().len(), 3);
    }

    #[test]
    fn test_aggregate_degraded_by_down_master() {
        let queries = MockQueries::new()
            .with_sentinel_info(SENTINEL_INFO)
            .with_alive(&["10.0.1.1:26379", "10.0.1.2:26379", "10.0.1.3:26379"]);
        let partial = aggregate(&queries, &sentinels());

        assert_eq!(partial.sentinel_masters, Some(2));
        assert_eq!(partial.master_ok, Some(1));
        assert_eq!(partial.sentinel_ok, Some(3));
        assert_eq!(partial.sentinel_down, Some(0));
        assert_eq!(partial.known_nodes, Some(3));
        assert_eq!(partial.state, State::Degraded);
        assert!(partial.failures.is_empty());
    }

    #[test]
    fn test_aggregate_healthy() {
        let queries = MockQueries::new()
            .with_sentinel_info(
                "sentinel_masters:1\r\nmaster0:name=orders,status=ok,address=10.0.0.1:6379\r\n",
            )
            .with_alive(&["10.0.1.1:26379", "10.0.1.2:26379", "10.0.1.3:26379"]);
        let partial = aggregate(&queries, &sentinels());
        assert_eq!(partial.state, State::Healthy);
    }

    #[test]
    fn test_master_phase_failure_leaves_fields_unavailable() {
        let queries = MockQueries::new().with_alive(&["10.0.1.1:26379", "10.0.1.2:26379"]);
        let partial = aggregate(&queries, &sentinels());

        assert_eq!(partial.sentinel_masters, None);
        assert_eq!(partial.master_ok, None);
        // Liveness still ran
        assert_eq!(partial.sentinel_ok, Some(2));
        assert_eq!(partial.sentinel_down, Some(1));
        assert_eq!(partial.state, State::Degraded);

        let groups: Vec<FieldGroup> = partial.failures.iter().map(|f| f.group).collect();
        assert_eq!(
            groups,
            vec![FieldGroup::SentinelMasters, FieldGroup::SentinelLiveness]
        );
    }
}
