//! Query interfaces the scanner fans out over
//!
//! The scanner only talks to these traits. `RespQueries` implements them over
//! real connections; tests script them in memory.

use crate::metrics::InfoFields;
use crate::scan::{Credentials, Deployment, Endpoint, KeyspaceSample, Mode};
use crate::utils::ProbeError;

/// Single-endpoint probes. Implementations must not retry.
pub trait NodeQuery: Send + Sync {
    /// `INFO <section>` against one endpoint
    fn query(
        &self,
        endpoint: &Endpoint,
        credentials: Option<&Credentials>,
        section: &str,
    ) -> Result<InfoFields, ProbeError>;

    /// Lightweight liveness check
    fn ping(&self, endpoint: &Endpoint, credentials: Option<&Credentials>) -> Result<(), ProbeError>;
}

/// Deployment-wide queries. `mode` is the mode resolved from base info.
pub trait DeploymentQuery: Send + Sync {
    /// `INFO sentinel` from the sentinel set
    fn sentinel_masters(
        &self,
        endpoints: &[Endpoint],
        credentials: Option<&Credentials>,
    ) -> Result<InfoFields, ProbeError>;

    /// Per-database key counts across every data node
    fn keyspace(&self, deployment: &Deployment, mode: Mode)
        -> Result<Vec<KeyspaceSample>, ProbeError>;

    /// `used_memory` in bytes across every data node
    fn memory(&self, deployment: &Deployment, mode: Mode) -> Result<u64, ProbeError>;

    /// `CLUSTER INFO` fields
    fn cluster_status(&self, deployment: &Deployment) -> Result<InfoFields, ProbeError>;

    /// Members of a standalone deployment: the node and its replicas
    fn members(&self, deployment: &Deployment) -> Result<Vec<Endpoint>, ProbeError>;
}
