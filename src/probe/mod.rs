//! Node probing
//!
//! `NodeQuery` and `DeploymentQuery` are the seams between the scan core and
//! the network. `RespQueries` is the production implementation.

pub mod parse;
pub mod query;
pub mod resp_queries;

pub use query::{DeploymentQuery, NodeQuery};
pub use resp_queries::RespQueries;
