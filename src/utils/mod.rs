//! Utility modules

pub mod error;
pub mod resp;

pub use error::{
    ClusterError, ConfigurationError, ConnectionError, ProbeError, ProtocolError, ScanAborted,
};
pub use resp::{RespDecoder, RespEncoder, RespValue};
