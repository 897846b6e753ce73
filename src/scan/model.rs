//! Deployment and snapshot data model

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::utils::ConfigurationError;

/// Deployment topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Standalone,
    Sentinel,
    Cluster,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Standalone => "standalone",
            Mode::Sentinel => "sentinel",
            Mode::Cluster => "cluster",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigurationError;

    /// Accepts the `redis_mode` values reported by INFO server
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standalone" => Ok(Mode::Standalone),
            "sentinel" => Ok(Mode::Sentinel),
            "cluster" => Ok(Mode::Cluster),
            "" => Err(ConfigurationError::MissingMode),
            other => Err(ConfigurationError::UnrecognizedMode(other.to_string())),
        }
    }
}

/// Member address; equality and hashing are by (host, port)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for Endpoint {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigurationError::InvalidEndpoint(s.to_string());
        let (host, port) = s.trim().rsplit_once(':').ok_or_else(invalid)?;
        let port: u16 = port.parse().map_err(|_| invalid())?;
        if host.is_empty() || port == 0 {
            return Err(invalid());
        }
        Ok(Endpoint::new(host, port))
    }
}

impl TryFrom<String> for Endpoint {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.to_string()
    }
}

/// AUTH credentials
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub password: String,
    #[serde(default)]
    pub username: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("password", &"***")
            .field("username", &self.username)
            .finish()
    }
}

/// A declared deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    #[serde(default)]
    pub id: u32,
    pub name: String,
    /// Mode recorded for the deployment; `None` trusts whatever the server reports
    #[serde(default)]
    pub mode: Option<Mode>,
    /// Member endpoints in declared order; the first one is the representative
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
}

impl Deployment {
    pub fn new(name: impl Into<String>, endpoints: Vec<Endpoint>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            mode: None,
            endpoints,
            credentials: None,
        }
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn first_endpoint(&self) -> Option<&Endpoint> {
        self.endpoints.first()
    }
}

/// Derived health of a deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum State {
    #[default]
    Unknown,
    Healthy,
    Degraded,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Unknown => "UNKNOWN",
            State::Healthy => "HEALTHY",
            State::Degraded => "DEGRADED",
        })
    }
}

/// Key counts of one logical database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyspaceSample {
    /// Database name as reported, e.g. `db0`
    pub db: String,
    pub keys: u64,
    pub expires: u64,
    /// Average TTL in milliseconds of keys with an expiry
    pub avg_ttl: u64,
}

/// Field group that could not be collected in a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroup {
    Keyspace,
    Memory,
    Members,
    SentinelMasters,
    SentinelLiveness,
    ClusterStatus,
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FieldGroup::Keyspace => "keyspace",
            FieldGroup::Memory => "memory",
            FieldGroup::Members => "members",
            FieldGroup::SentinelMasters => "sentinel_masters",
            FieldGroup::SentinelLiveness => "sentinel_liveness",
            FieldGroup::ClusterStatus => "cluster_status",
        })
    }
}

/// Marker for fields left unavailable, with the error that caused it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFailure {
    pub group: FieldGroup,
    pub reason: String,
}

impl PartialFailure {
    pub fn new(group: FieldGroup, reason: impl ToString) -> Self {
        Self {
            group,
            reason: reason.to_string(),
        }
    }
}

/// Result of one scan of one deployment.
///
/// Numeric fields are `None` when they could not be collected in this scan;
/// the matching `PartialFailure` says why. `None` never means zero.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub deployment_id: u32,
    pub deployment_name: String,
    pub state: State,
    pub mode: Option<Mode>,
    pub os: Option<String>,
    pub version: Option<String>,

    pub known_nodes: Option<u64>,
    pub cluster_size: Option<u64>,

    // Cluster mode
    pub slots_assigned: Option<u64>,
    pub slots_ok: Option<u64>,
    pub slots_fail: Option<u64>,
    pub slots_pfail: Option<u64>,

    // Sentinel mode
    pub sentinel_ok: Option<u64>,
    pub sentinel_down: Option<u64>,
    pub master_ok: Option<u64>,
    pub sentinel_masters: Option<u64>,

    // Totals
    pub db_count: Option<u64>,
    pub total_keys: Option<u64>,
    pub total_expires: Option<u64>,
    pub used_memory: Option<u64>,

    pub partial_failures: Vec<PartialFailure>,

    /// Unix time in milliseconds when the scan started
    pub scanned_at_ms: u64,
    #[serde(with = "duration_ms")]
    pub scan_duration: Duration,
}

impl StatusSnapshot {
    pub fn is_partial(&self) -> bool {
        !self.partial_failures.is_empty()
    }

    pub fn failed(&self, group: FieldGroup) -> bool {
        self.partial_failures.iter().any(|f| f.group == group)
    }

    /// Copy with timing fields cleared, for comparing two scans
    pub fn without_timing(&self) -> Self {
        Self {
            scanned_at_ms: 0,
            scan_duration: Duration::ZERO,
            ..self.clone()
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mode_from_redis_mode() {
        assert_eq!("cluster".parse::<Mode>().unwrap(), Mode::Cluster);
        assert_eq!("Sentinel".parse::<Mode>().unwrap(), Mode::Sentinel);
        assert_eq!("".parse::<Mode>(), Err(ConfigurationError::MissingMode));
        assert_eq!(
            "replicated".parse::<Mode>(),
            Err(ConfigurationError::UnrecognizedMode("replicated".to_string()))
        );
    }

    #[test]
    fn test_endpoint_parse_and_display() {
        let ep: Endpoint = "10.0.0.1:6379".parse().unwrap();
        assert_eq!(ep, Endpoint::new("10.0.0.1", 6379));
        assert_eq!(ep.to_string(), "10.0.0.1:6379");

        let v6: Endpoint = "::1:7000".parse().unwrap();
        assert_eq!(v6.host, "::1");

        assert!("10.0.0.1".parse::<Endpoint>().is_err());
        assert!("host:notaport".parse::<Endpoint>().is_err());
        assert!(":6379".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_endpoint_identity() {
        let mut set = HashSet::new();
        set.insert(Endpoint::new("a", 1));
        set.insert(Endpoint::new("a", 1));
        set.insert(Endpoint::new("a", 2));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let creds = Credentials {
            password: "hunter2".to_string(),
            username: None,
        };
        assert!(!format!("{:?}", creds).contains("hunter2"));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = StatusSnapshot {
            deployment_name: "orders".to_string(),
            state: State::Degraded,
            mode: Some(Mode::Cluster),
            scan_duration: Duration::from_millis(42),
            partial_failures: vec![PartialFailure::new(FieldGroup::Memory, "timeout")],
            ..Default::default()
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["state"], "DEGRADED");
        assert_eq!(json["mode"], "cluster");
        assert_eq!(json["scan_duration"], 42);
        assert!(json["used_memory"].is_null());
        assert_eq!(json["partial_failures"][0]["group"], "memory");
    }
}
