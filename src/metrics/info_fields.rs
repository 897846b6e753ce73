//! INFO reply parsing
//!
//! INFO replies are `key:value` lines grouped under `# Section` headers.
//! Several values are themselves `k=v,k=v` lists (keyspace, sentinel
//! masters, replicas); helpers for both layers live here, along with the
//! human-readable memory format used in console output.

use std::collections::BTreeMap;

use crate::utils::ProtocolError;

/// Parsed `key:value` fields of one INFO (or CLUSTER INFO) reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfoFields {
    fields: BTreeMap<String, String>,
}

impl InfoFields {
    /// Parse reply text, skipping blank lines and section headers.
    ///
    /// Values may contain ':' (addresses, paths), so only the first one splits.
    pub fn parse(text: &str) -> Self {
        let fields = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Self { fields }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// Numeric field that must be present
    pub fn require_u64(&self, key: &str) -> Result<u64, ProtocolError> {
        let raw = self
            .get(key)
            .ok_or_else(|| ProtocolError::Parse(format!("missing field {}", key)))?;
        raw.parse()
            .map_err(|_| ProtocolError::Parse(format!("field {} is not a number: {}", key, raw)))
    }

    /// Fields whose name starts with `prefix`, in name order
    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.fields
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for InfoFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Look up `key` in a `k=v,k=v` list such as
/// `name=mymaster,status=ok,address=10.0.0.1:6379,slaves=2,sentinels=3`
pub fn kv_lookup<'a>(list: &'a str, key: &str) -> Option<&'a str> {
    list.split(',')
        .filter_map(|part| part.split_once('='))
        .find(|(k, _)| k.trim() == key)
        .map(|(_, v)| v.trim())
}

/// Format bytes as human-readable string
pub fn format_memory_human(bytes: u64) -> String {
    const K: u64 = 1024;
    if bytes >= K * K * K * K {
        format!("{:.2}T", bytes as f64 / (K * K * K * K) as f64)
    } else if bytes >= K * K * K {
        format!("{:.2}G", bytes as f64 / (K * K * K) as f64)
    } else if bytes >= K * K {
        format!("{:.2}M", bytes as f64 / (K * K) as f64)
    } else if bytes >= K {
        format!("{:.2}K", bytes as f64 / K as f64)
    } else {
        format!("{}B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_INFO: &str = "# Server\r\n\
redis_version:7.2.4\r\n\
redis_mode:standalone\r\n\
os:Linux 5.15.0-91-generic x86_64\r\n\
executable:/usr/local/bin/redis-server\r\n\
\r\n\
# Clients\r\n\
connected_clients:3\r\n";

    #[test]
    fn test_parse_info_sections() {
        let info = InfoFields::parse(SERVER_INFO);
        assert_eq!(info.get("redis_version"), Some("7.2.4"));
        assert_eq!(info.get("os"), Some("Linux 5.15.0-91-generic x86_64"));
        assert_eq!(info.get("executable"), Some("/usr/local/bin/redis-server"));
        assert_eq!(info.get_u64("connected_clients"), Some(3));
        assert_eq!(info.len(), 5);
    }

    #[test]
    fn test_require_u64() {
        let info = InfoFields::parse("sentinel_masters:2\nsentinel_tilt:x\n");
        assert_eq!(info.require_u64("sentinel_masters").unwrap(), 2);
        assert!(info.require_u64("sentinel_tilt").is_err());
        assert!(info.require_u64("missing").is_err());
    }

    #[test]
    fn test_with_prefix() {
        let info = InfoFields::parse(
            "sentinel_masters:2\n\
master0:name=a,status=ok,address=10.0.0.1:6379,slaves=1,sentinels=3\n\
master1:name=b,status=odown,address=10.0.0.2:6379,slaves=1,sentinels=3\n\
masters_ok:bogus\n",
        );
        let masters: Vec<&str> = info.with_prefix("master").map(|(k, _)| k).collect();
        assert_eq!(masters, vec!["master0", "master1", "masters_ok"]);
    }

    #[test]
    fn test_kv_lookup() {
        let line = "name=mymaster,status=ok,address=10.16.50.219:16379,slaves=3,sentinels=6";
        assert_eq!(kv_lookup(line, "status"), Some("ok"));
        assert_eq!(kv_lookup(line, "address"), Some("10.16.50.219:16379"));
        assert_eq!(kv_lookup(line, "missing"), None);
    }

    #[test]
    fn test_format_memory_human() {
        assert_eq!(format_memory_human(500), "500B");
        assert_eq!(format_memory_human(1024), "1.00K");
        assert_eq!(format_memory_human(1024 * 1024), "1.00M");
        assert_eq!(format_memory_human(1024 * 1024 * 1024), "1.00G");
    }
}
