//! Section-specific INFO parsing: keyspace, replication, sentinel masters

use std::collections::BTreeMap;

use crate::metrics::{kv_lookup, InfoFields};
use crate::scan::{Endpoint, KeyspaceSample};
use crate::utils::ProtocolError;

/// Parse `INFO keyspace` lines like `db0:keys=100,expires=10,avg_ttl=3600`.
///
/// An empty section is valid (no databases hold keys). A db line without
/// `keys` or `expires` is a protocol error rather than a zero.
pub fn parse_keyspace(info: &InfoFields) -> Result<Vec<KeyspaceSample>, ProtocolError> {
    info.with_prefix("db")
        .filter(|(name, _)| is_numbered(name, "db"))
        .map(|(name, value)| {
            let field = |key: &str| -> Result<u64, ProtocolError> {
                kv_lookup(value, key)
                    .and_then(|v| v.parse().ok())
                    .ok_or_else(|| ProtocolError::Parse(format!("{}: bad {} in '{}'", name, key, value)))
            };
            Ok(KeyspaceSample {
                db: name.to_string(),
                keys: field("keys")?,
                expires: field("expires")?,
                avg_ttl: kv_lookup(value, "avg_ttl")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0),
            })
        })
        .collect()
}

/// Merge samples from several data nodes by database name.
///
/// Keys and expires add up; avg_ttl is re-weighted by each node's expires.
/// Sums that overflow are a protocol error.
pub fn merge_keyspace(
    per_node: Vec<Vec<KeyspaceSample>>,
) -> Result<Vec<KeyspaceSample>, ProtocolError> {
    let mut merged: BTreeMap<String, (KeyspaceSample, u128)> = BTreeMap::new();

    for sample in per_node.into_iter().flatten() {
        let weighted = u128::from(sample.avg_ttl) * u128::from(sample.expires);
        let entry = merged.entry(sample.db.clone()).or_insert_with(|| {
            (
                KeyspaceSample {
                    db: sample.db.clone(),
                    keys: 0,
                    expires: 0,
                    avg_ttl: 0,
                },
                0,
            )
        });
        entry.0.keys = checked_sum(entry.0.keys, sample.keys, &sample.db, "keys")?;
        entry.0.expires = checked_sum(entry.0.expires, sample.expires, &sample.db, "expires")?;
        entry.1 = entry.1.checked_add(weighted).ok_or_else(|| {
            ProtocolError::Parse(format!("{}: avg_ttl weights overflow", sample.db))
        })?;
    }

    Ok(merged
        .into_values()
        .map(|(mut sample, weighted)| {
            if sample.expires > 0 {
                sample.avg_ttl = (weighted / u128::from(sample.expires)) as u64;
            }
            sample
        })
        .collect())
}

/// `a + b`, or a protocol error naming what overflowed
pub(crate) fn checked_sum(a: u64, b: u64, owner: &str, what: &str) -> Result<u64, ProtocolError> {
    a.checked_add(b)
        .ok_or_else(|| ProtocolError::Parse(format!("{}: {} sum overflows u64", owner, what)))
}

/// Members from `INFO replication` of `node`: the master first, then replicas.
pub fn replication_members(
    info: &InfoFields,
    node: &Endpoint,
) -> Result<Vec<Endpoint>, ProtocolError> {
    match info.get("role") {
        Some("master") => {
            let mut members = vec![node.clone()];
            // slave0:ip=10.0.0.2,port=6379,state=online,offset=1234,lag=0
            for (name, value) in info.with_prefix("slave") {
                if !is_numbered(name, "slave") {
                    continue;
                }
                let ip = kv_lookup(value, "ip");
                let port = kv_lookup(value, "port").and_then(|p| p.parse().ok());
                match (ip, port) {
                    (Some(ip), Some(port)) => members.push(Endpoint::new(ip, port)),
                    _ => {
                        return Err(ProtocolError::Parse(format!(
                            "bad replica line {}:{}",
                            name, value
                        )))
                    }
                }
            }
            Ok(members)
        }
        Some("slave") | Some("replica") => {
            let host = info.get("master_host");
            let port = info.get("master_port").and_then(|p| p.parse().ok());
            match (host, port) {
                (Some(host), Some(port)) => Ok(vec![Endpoint::new(host, port), node.clone()]),
                _ => Err(ProtocolError::Parse(
                    "replica without master_host/master_port".to_string(),
                )),
            }
        }
        Some(other) => Err(ProtocolError::Parse(format!("unknown role {}", other))),
        None => Err(ProtocolError::Parse("missing role".to_string())),
    }
}

/// Master addresses from `INFO sentinel` master lines
pub fn sentinel_master_addresses(info: &InfoFields) -> Result<Vec<Endpoint>, ProtocolError> {
    info.with_prefix("master")
        .filter(|(name, _)| is_numbered(name, "master"))
        .map(|(name, value)| {
            kv_lookup(value, "address")
                .and_then(|a| a.parse().ok())
                .ok_or_else(|| ProtocolError::Parse(format!("{} has no usable address", name)))
        })
        .collect()
}

/// `db0`, `slave12`, `master3`: prefix followed by a non-empty index
pub(crate) fn is_numbered(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .map(|idx| !idx.is_empty() && idx.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keyspace() {
        let info = InfoFields::parse(
            "# Keyspace\r\ndb0:keys=100,expires=10,avg_ttl=0\r\ndb1:keys=50,expires=5,avg_ttl=1000\r\n",
        );
        let samples = parse_keyspace(&info).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].db, "db0");
        assert_eq!(samples[0].keys, 100);
        assert_eq!(samples[1].expires, 5);
        assert_eq!(samples[1].avg_ttl, 1000);
    }

    #[test]
    fn test_parse_empty_keyspace() {
        let info = InfoFields::parse("# Keyspace\r\n");
        assert!(parse_keyspace(&info).unwrap().is_empty());
    }

    #[test]
    fn test_parse_keyspace_malformed() {
        let info = InfoFields::parse("db0:keys=many,expires=1\r\n");
        assert!(parse_keyspace(&info).is_err());
    }

    #[test]
    fn test_merge_keyspace() {
        let node = |db: &str, keys, expires, avg_ttl| KeyspaceSample {
            db: db.to_string(),
            keys,
            expires,
            avg_ttl,
        };
        let merged = merge_keyspace(vec![
            vec![node("db0", 100, 10, 1000)],
            vec![node("db0", 50, 30, 2000), node("db3", 7, 0, 0)],
        ])
        .unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].keys, 150);
        assert_eq!(merged[0].expires, 40);
        assert_eq!(merged[0].avg_ttl, 1750);
        assert_eq!(merged[1].db, "db3");
        assert_eq!(merged[1].avg_ttl, 0);
    }

    #[test]
    fn test_merge_keyspace_overflow_is_error() {
        let sample = |keys| KeyspaceSample {
            db: "db0".to_string(),
            keys,
            expires: 0,
            avg_ttl: 0,
        };
        let result = merge_keyspace(vec![vec![sample(u64::MAX)], vec![sample(1)]]);
        assert!(matches!(result, Err(ProtocolError::Parse(_))));
    }

    #[test]
    fn test_replication_members_master() {
        let info = InfoFields::parse(
            "# Replication\r\nrole:master\r\nconnected_slaves:2\r\n\
slave0:ip=10.0.0.2,port=6379,state=online,offset=1,lag=0\r\n\
slave1:ip=10.0.0.3,port=6379,state=online,offset=1,lag=1\r\n\
master_replid:abc\r\n",
        );
        let me = Endpoint::new("10.0.0.1", 6379);
        let members = replication_members(&info, &me).unwrap();
        assert_eq!(
            members,
            vec![
                me,
                Endpoint::new("10.0.0.2", 6379),
                Endpoint::new("10.0.0.3", 6379),
            ]
        );
    }

    #[test]
    fn test_replication_members_replica() {
        let info = InfoFields::parse("role:slave\r\nmaster_host:10.0.0.1\r\nmaster_port:6380\r\n");
        let me = Endpoint::new("10.0.0.2", 6379);
        let members = replication_members(&info, &me).unwrap();
        assert_eq!(members, vec![Endpoint::new("10.0.0.1", 6380), me]);
    }

    #[test]
    fn test_sentinel_master_addresses() {
        let info = InfoFields::parse(
            "sentinel_masters:2\r\n\
master0:name=a,status=ok,address=10.16.50.219:16379,slaves=3,sentinels=6\r\n\
master1:name=b,status=odown,address=10.16.50.220:16379,slaves=3,sentinels=6\r\n",
        );
        let addrs = sentinel_master_addresses(&info).unwrap();
        assert_eq!(
            addrs,
            vec![
                Endpoint::new("10.16.50.219", 16379),
                Endpoint::new("10.16.50.220", 16379),
            ]
        );
    }
}
