//! Base info: mode, version and OS from the representative endpoint

use tracing::debug;

use super::model::{Deployment, Mode};
use crate::probe::NodeQuery;
use crate::utils::{ConfigurationError, ScanAborted};

/// Ground truth every later phase depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseInfo {
    pub mode: Mode,
    pub version: Option<String>,
    pub os: Option<String>,
}

/// Probe `INFO server` on the first endpoint.
///
/// Any failure aborts the scan: without a trusted mode no aggregator can run.
pub fn resolve<Q>(queries: &Q, deployment: &Deployment) -> Result<BaseInfo, ScanAborted>
where
    Q: NodeQuery + ?Sized,
{
    let endpoint = deployment
        .first_endpoint()
        .ok_or(ConfigurationError::NoEndpoints)?;

    let info = queries
        .query(endpoint, deployment.credentials(), "server")
        .map_err(ScanAborted::BaseInfoUnavailable)?;

    let mode: Mode = info
        .get("redis_mode")
        .ok_or(ConfigurationError::MissingMode)?
        .parse()?;

    if let Some(declared) = deployment.mode {
        if declared != mode {
            return Err(ConfigurationError::ModeMismatch {
                declared,
                reported: mode,
            }
            .into());
        }
    }

    let base = BaseInfo {
        mode,
        version: info.get("redis_version").map(str::to_string),
        os: info.get("os").map(str::to_string),
    };
    debug!(deployment = %deployment.name, %endpoint, mode = %base.mode, "base info resolved");
    Ok(base)
}
