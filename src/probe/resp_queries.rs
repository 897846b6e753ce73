//! Query implementations over RESP connections
//!
//! Every probe opens its own short-lived connection through the
//! `ConnectionFactory`, so probes are independent and safe to run from
//! several threads at once.

use std::io;

use tracing::{debug, warn};

use super::parse::{
    checked_sum, merge_keyspace, parse_keyspace, replication_members, sentinel_master_addresses,
};
use super::query::{DeploymentQuery, NodeQuery};
use crate::client::{ConnectionFactory, ControlPlaneExt, RawConnection};
use crate::cluster::ClusterTopology;
use crate::metrics::InfoFields;
use crate::scan::{Credentials, Deployment, Endpoint, KeyspaceSample, Mode};
use crate::utils::{ConnectionError, ProbeError, ProtocolError};

/// `NodeQuery` + `DeploymentQuery` against live servers
#[derive(Debug, Clone)]
pub struct RespQueries {
    factory: ConnectionFactory,
}

impl RespQueries {
    pub fn new(factory: ConnectionFactory) -> Self {
        Self { factory }
    }

    fn connect(
        &self,
        endpoint: &Endpoint,
        credentials: Option<&Credentials>,
    ) -> Result<RawConnection, ProbeError> {
        self.factory
            .create(endpoint, credentials)
            .map_err(|e| ProbeError::unreachable(endpoint, e))
    }

    /// Run `op` against each endpoint in order until one answers.
    ///
    /// Only unreachable endpoints are skipped; a protocol error from a node
    /// that did answer is returned as is.
    fn first_answering<T>(
        &self,
        endpoints: &[Endpoint],
        credentials: Option<&Credentials>,
        mut op: impl FnMut(&mut RawConnection) -> io::Result<T>,
    ) -> Result<T, ProbeError> {
        let mut last_err = None;
        for endpoint in endpoints {
            let result = self
                .connect(endpoint, credentials)
                .and_then(|mut conn| op(&mut conn).map_err(|e| ProbeError::from_io(endpoint, e)));
            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_unreachable() => {
                    debug!("{}", e);
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| ProbeError::unreachable("<none>", ConnectionError::NoEndpoints)))
    }

    /// Nodes that hold data for `mode`
    fn data_nodes(&self, deployment: &Deployment, mode: Mode) -> Result<Vec<Endpoint>, ProbeError> {
        let creds = deployment.credentials();
        let nodes = match mode {
            Mode::Standalone => deployment.first_endpoint().cloned().into_iter().collect(),
            Mode::Sentinel => {
                let info = self.sentinel_masters(&deployment.endpoints, creds)?;
                sentinel_master_addresses(&info)
                    .map_err(|e| ProbeError::protocol(&deployment.name, e))?
            }
            Mode::Cluster => {
                let text = self.first_answering(&deployment.endpoints, creds, |conn| {
                    conn.cluster_nodes()
                })?;
                ClusterTopology::from_cluster_nodes(&text)
                    .map_err(|e| ProbeError::protocol(&deployment.name, ProtocolError::Parse(e.to_string())))?
                    .data_endpoints()
            }
        };

        if nodes.is_empty() {
            return Err(ProbeError::protocol(
                &deployment.name,
                ProtocolError::Parse(format!("no data nodes found in {} deployment", mode)),
            ));
        }
        Ok(nodes)
    }

    /// `INFO <section>` on every data node; any failure fails the whole query
    fn query_data_nodes(
        &self,
        deployment: &Deployment,
        mode: Mode,
        section: &str,
    ) -> Result<Vec<(Endpoint, InfoFields)>, ProbeError> {
        self.data_nodes(deployment, mode)?
            .into_iter()
            .map(|node| {
                let info = self.query(&node, deployment.credentials(), section)?;
                Ok((node, info))
            })
            .collect()
    }
}

impl NodeQuery for RespQueries {
    fn query(
        &self,
        endpoint: &Endpoint,
        credentials: Option<&Credentials>,
        section: &str,
    ) -> Result<InfoFields, ProbeError> {
        let mut conn = self.connect(endpoint, credentials)?;
        let text = conn
            .info(section)
            .map_err(|e| ProbeError::from_io(endpoint, e))?;
        Ok(InfoFields::parse(&text))
    }

    fn ping(&self, endpoint: &Endpoint, credentials: Option<&Credentials>) -> Result<(), ProbeError> {
        let mut conn = self.connect(endpoint, credentials)?;
        match conn.ping() {
            Ok(true) => Ok(()),
            Ok(false) => Err(ProbeError::protocol(
                endpoint,
                ProtocolError::UnexpectedResponse {
                    expected: "PONG".to_string(),
                    actual: "other reply".to_string(),
                },
            )),
            Err(e) => Err(ProbeError::from_io(endpoint, e)),
        }
    }
}

impl DeploymentQuery for RespQueries {
    fn sentinel_masters(
        &self,
        endpoints: &[Endpoint],
        credentials: Option<&Credentials>,
    ) -> Result<InfoFields, ProbeError> {
        let text = self.first_answering(endpoints, credentials, |conn| conn.info("sentinel"))?;
        Ok(InfoFields::parse(&text))
    }

    fn keyspace(
        &self,
        deployment: &Deployment,
        mode: Mode,
    ) -> Result<Vec<KeyspaceSample>, ProbeError> {
        let per_node = self
            .query_data_nodes(deployment, mode, "keyspace")?
            .into_iter()
            .map(|(node, info)| parse_keyspace(&info).map_err(|e| ProbeError::protocol(&node, e)))
            .collect::<Result<Vec<_>, _>>()?;
        merge_keyspace(per_node).map_err(|e| ProbeError::protocol(&deployment.name, e))
    }

    fn memory(&self, deployment: &Deployment, mode: Mode) -> Result<u64, ProbeError> {
        self.query_data_nodes(deployment, mode, "memory")?
            .into_iter()
            .try_fold(0u64, |total, (node, info)| {
                let used = info
                    .require_u64("used_memory")
                    .map_err(|e| ProbeError::protocol(&node, e))?;
                checked_sum(total, used, &deployment.name, "used_memory")
                    .map_err(|e| ProbeError::protocol(&deployment.name, e))
            })
    }

    fn cluster_status(&self, deployment: &Deployment) -> Result<InfoFields, ProbeError> {
        let text = self.first_answering(&deployment.endpoints, deployment.credentials(), |conn| {
            conn.cluster_info()
        })?;
        let info = InfoFields::parse(&text);
        if info.is_empty() {
            warn!(deployment = %deployment.name, "CLUSTER INFO returned no fields");
        }
        Ok(info)
    }

    fn members(&self, deployment: &Deployment) -> Result<Vec<Endpoint>, ProbeError> {
        let node = deployment
            .first_endpoint()
            .ok_or_else(|| ProbeError::unreachable(&deployment.name, ConnectionError::NoEndpoints))?;
        let info = self.query(node, deployment.credentials(), "replication")?;
        replication_members(&info, node).map_err(|e| ProbeError::protocol(node, e))
    }
}
