//! Scripted query backend for scan tests

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use super::model::{Credentials, Deployment, Endpoint, KeyspaceSample, Mode};
use crate::metrics::InfoFields;
use crate::probe::{DeploymentQuery, NodeQuery};
use crate::utils::{ConnectionError, ProbeError, ProtocolError};

/// Every reply not scripted fails as unreachable
#[derive(Default)]
pub struct MockQueries {
    server: HashMap<Endpoint, String>,
    alive: HashSet<Endpoint>,
    sentinel: Option<String>,
    keyspace: Option<Vec<KeyspaceSample>>,
    memory: Option<u64>,
    cluster: Option<String>,
    members: Option<Vec<Endpoint>>,
    pub calls: Mutex<Vec<String>>,
}

fn ep(addr: &str) -> Endpoint {
    addr.parse().expect("test endpoint")
}

fn unreachable(what: &str) -> ProbeError {
    ProbeError::unreachable(what, ConnectionError::Timeout(2000))
}

impl MockQueries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(self, addr: &str, mode: &str) -> Self {
        let info = format!(
            "# Server\r\nredis_version:7.2.4\r\nredis_mode:{}\r\nos:Linux 6.1.0 x86_64\r\n",
            mode
        );
        self.with_server_info(addr, &info)
    }

    pub fn with_server_info(mut self, addr: &str, info: &str) -> Self {
        self.server.insert(ep(addr), info.to_string());
        self
    }

    pub fn with_alive(mut self, addrs: &[&str]) -> Self {
        self.alive.extend(addrs.iter().map(|a| ep(a)));
        self
    }

    pub fn with_sentinel_info(mut self, info: &str) -> Self {
        self.sentinel = Some(info.to_string());
        self
    }

    pub fn with_keyspace(mut self, samples: &[(&str, u64, u64)]) -> Self {
        self.keyspace = Some(
            samples
                .iter()
                .map(|&(db, keys, expires)| KeyspaceSample {
                    db: db.to_string(),
                    keys,
                    expires,
                    avg_ttl: 0,
                })
                .collect(),
        );
        self
    }

    pub fn with_memory(mut self, bytes: u64) -> Self {
        self.memory = Some(bytes);
        self
    }

    pub fn with_cluster_info(mut self, info: &str) -> Self {
        self.cluster = Some(info.to_string());
        self
    }

    pub fn with_members(mut self, addrs: &[&str]) -> Self {
        self.members = Some(addrs.iter().map(|a| ep(a)).collect());
        self
    }

    pub fn called(&self, what: &str) -> bool {
        self.calls.lock().iter().any(|c| c.starts_with(what))
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

impl NodeQuery for MockQueries {
    fn query(
        &self,
        endpoint: &Endpoint,
        _credentials: Option<&Credentials>,
        section: &str,
    ) -> Result<InfoFields, ProbeError> {
        self.record(format!("query {} {}", endpoint, section));
        match (section, self.server.get(endpoint)) {
            ("server", Some(info)) => Ok(InfoFields::parse(info)),
            ("server", None) => Err(unreachable(&endpoint.to_string())),
            _ => Err(ProbeError::protocol(
                endpoint,
                ProtocolError::ServerError(format!("unscripted section {}", section)),
            )),
        }
    }

    fn ping(&self, endpoint: &Endpoint, _credentials: Option<&Credentials>) -> Result<(), ProbeError> {
        self.record(format!("ping {}", endpoint));
        if self.alive.contains(endpoint) {
            Ok(())
        } else {
            Err(unreachable(&endpoint.to_string()))
        }
    }
}

impl DeploymentQuery for MockQueries {
    fn sentinel_masters(
        &self,
        _endpoints: &[Endpoint],
        _credentials: Option<&Credentials>,
    ) -> Result<InfoFields, ProbeError> {
        self.record("sentinel_masters".to_string());
        self.sentinel
            .as_deref()
            .map(InfoFields::parse)
            .ok_or_else(|| unreachable("sentinels"))
    }

    fn keyspace(
        &self,
        _deployment: &Deployment,
        _mode: Mode,
    ) -> Result<Vec<KeyspaceSample>, ProbeError> {
        self.record("keyspace".to_string());
        self.keyspace.clone().ok_or_else(|| unreachable("keyspace"))
    }

    fn memory(&self, _deployment: &Deployment, _mode: Mode) -> Result<u64, ProbeError> {
        self.record("memory".to_string());
        self.memory.ok_or_else(|| unreachable("memory"))
    }

    fn cluster_status(&self, _deployment: &Deployment) -> Result<InfoFields, ProbeError> {
        self.record("cluster_status".to_string());
        self.cluster
            .as_deref()
            .map(InfoFields::parse)
            .ok_or_else(|| unreachable("cluster"))
    }

    fn members(&self, _deployment: &Deployment) -> Result<Vec<Endpoint>, ProbeError> {
        self.record("members".to_string());
        self.members.clone().ok_or_else(|| unreachable("members"))
    }
}
