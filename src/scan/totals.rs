//! Keyspace and memory totals
//!
//! Keyspace and memory are collected independently; either one failing only
//! blanks its own fields.

use tracing::warn;

use super::model::{Deployment, FieldGroup, KeyspaceSample, Mode, PartialFailure};
use crate::probe::DeploymentQuery;
use crate::utils::ProtocolError;

/// Deployment-wide totals of one scan. `None` = not collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Totals {
    pub db_count: Option<u64>,
    pub total_keys: Option<u64>,
    pub total_expires: Option<u64>,
    pub used_memory: Option<u64>,
    pub failures: Vec<PartialFailure>,
}

/// Sum keys and expires over the samples of this scan
pub fn sum_samples(samples: &[KeyspaceSample]) -> Result<(u64, u64), ProtocolError> {
    samples.iter().try_fold((0u64, 0u64), |(keys, expires), s| {
        let keys = keys
            .checked_add(s.keys)
            .ok_or_else(|| ProtocolError::Parse(format!("key total overflows at {}", s.db)))?;
        let expires = expires
            .checked_add(s.expires)
            .ok_or_else(|| ProtocolError::Parse(format!("expires total overflows at {}", s.db)))?;
        Ok((keys, expires))
    })
}

pub fn collect<Q>(queries: &Q, deployment: &Deployment, mode: Mode) -> Totals
where
    Q: DeploymentQuery + ?Sized,
{
    let mut totals = Totals::default();

    let keyspace = queries
        .keyspace(deployment, mode)
        .map_err(|e| e.to_string())
        .and_then(|samples| {
            sum_samples(&samples)
                .map(|sums| (samples.len(), sums))
                .map_err(|e| e.to_string())
        });
    match keyspace {
        Ok((dbs, (keys, expires))) => {
            totals.db_count = Some(dbs as u64);
            totals.total_keys = Some(keys);
            totals.total_expires = Some(expires);
        }
        Err(e) => {
            warn!(deployment = %deployment.name, "keyspace unavailable: {}", e);
            totals.failures.push(PartialFailure::new(FieldGroup::Keyspace, e));
        }
    }

    // used_memory is process-wide, never derived from per-db samples
    match queries.memory(deployment, mode) {
        Ok(bytes) => totals.used_memory = Some(bytes),
        Err(e) => {
            warn!(deployment = %deployment.name, "memory unavailable: {}", e);
            totals.failures.push(PartialFailure::new(FieldGroup::Memory, e));
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::mock::MockQueries;
    use crate::scan::Endpoint;

    fn deployment() -> Deployment {
        Deployment::new("cache", vec![Endpoint::new("10.0.0.1", 6379)])
    }

    #[test]
    fn test_totals_sum_over_samples() {
        let queries = MockQueries::new()
            .with_keyspace(&[("db0", 100, 10), ("db1", 50, 5)])
            .with_memory(1_048_576);
        let totals = collect(&queries, &deployment(), Mode::Standalone);

        assert_eq!(totals.total_keys, Some(150));
        assert_eq!(totals.total_expires, Some(15));
        assert_eq!(totals.db_count, Some(2));
        assert_eq!(totals.used_memory, Some(1_048_576));
        assert!(totals.failures.is_empty());
    }

    #[test]
    fn test_empty_keyspace_is_zero_not_unavailable() {
        let queries = MockQueries::new().with_keyspace(&[]).with_memory(900_000);
        let totals = collect(&queries, &deployment(), Mode::Standalone);
        assert_eq!(totals.total_keys, Some(0));
        assert_eq!(totals.db_count, Some(0));
    }

    #[test]
    fn test_keyspace_failure_marks_unavailable() {
        let queries = MockQueries::new().with_memory(2048);
        let totals = collect(&queries, &deployment(), Mode::Standalone);

        assert_eq!(totals.total_keys, None);
        assert_eq!(totals.total_expires, None);
        assert_eq!(totals.db_count, None);
        assert_eq!(totals.used_memory, Some(2048));
        assert_eq!(totals.failures.len(), 1);
        assert_eq!(totals.failures[0].group, FieldGroup::Keyspace);
    }

    #[test]
    fn test_key_total_overflow_marks_unavailable() {
        let queries = MockQueries::new()
            .with_keyspace(&[("db0", u64::MAX, 0), ("db1", 1, 0)])
            .with_memory(4096);
        let totals = collect(&queries, &deployment(), Mode::Standalone);

        assert_eq!(totals.total_keys, None);
        assert_eq!(totals.db_count, None);
        assert_eq!(totals.used_memory, Some(4096));
        assert_eq!(totals.failures[0].group, FieldGroup::Keyspace);
        assert!(totals.failures[0].reason.contains("overflows"));
    }

    #[test]
    fn test_memory_failure_independent_of_keyspace() {
        let queries = MockQueries::new().with_keyspace(&[("db0", 3, 0)]);
        let totals = collect(&queries, &deployment(), Mode::Standalone);

        assert_eq!(totals.total_keys, Some(3));
        assert_eq!(totals.used_memory, None);
        assert_eq!(totals.failures[0].group, FieldGroup::Memory);
    }
}
