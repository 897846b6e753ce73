//! Control Plane trait for server communication
//!
//! Status probes only need a handful of commands; they are built on top of a
//! single `execute` so tests can script replies without a server.

use std::io;

use crate::utils::RespValue;

/// Control plane operations trait
pub trait ControlPlane {
    /// Execute a command with string arguments
    fn execute(&mut self, args: &[&str]) -> io::Result<RespValue>;
}

/// Extension trait with the probe commands
pub trait ControlPlaneExt: ControlPlane {
    /// Send PING and verify PONG response
    fn ping(&mut self) -> io::Result<bool> {
        match self.execute(&["PING"])? {
            RespValue::SimpleString(s) => Ok(s == "PONG"),
            RespValue::Error(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
            _ => Ok(false),
        }
    }

    /// Get INFO for a section (empty string returns the default sections)
    fn info(&mut self, section: &str) -> io::Result<String> {
        let response = if section.is_empty() {
            self.execute(&["INFO"])?
        } else {
            self.execute(&["INFO", section])?
        };
        text_reply(response, "INFO")
    }

    /// Get CLUSTER INFO response as string
    fn cluster_info(&mut self) -> io::Result<String> {
        text_reply(self.execute(&["CLUSTER", "INFO"])?, "CLUSTER INFO")
    }

    /// Get CLUSTER NODES response as string
    fn cluster_nodes(&mut self) -> io::Result<String> {
        text_reply(self.execute(&["CLUSTER", "NODES"])?, "CLUSTER NODES")
    }

    /// Send AUTH command
    fn authenticate(&mut self, password: &str, username: Option<&str>) -> io::Result<()> {
        let response = match username {
            Some(user) => self.execute(&["AUTH", user, password])?,
            None => self.execute(&["AUTH", password])?,
        };

        match response {
            RespValue::SimpleString(s) if s == "OK" => Ok(()),
            RespValue::Error(e) => Err(io::Error::new(io::ErrorKind::PermissionDenied, e)),
            other => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Unexpected AUTH response: {:?}", other),
            )),
        }
    }
}

// Blanket implementation: any ControlPlane automatically gets ControlPlaneExt
impl<T: ControlPlane> ControlPlaneExt for T {}

/// Server errors surface as `Other`, undecodable replies as `InvalidData`
fn text_reply(response: RespValue, command: &str) -> io::Result<String> {
    match response {
        RespValue::Error(e) => Err(io::Error::new(io::ErrorKind::Other, e)),
        other => other
            .into_text(command)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string())),
    }
}
