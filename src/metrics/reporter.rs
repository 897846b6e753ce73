//! Snapshot reporter - output formatting
//!
//! Supports multiple output formats:
//! - Console (human-readable)
//! - JSON
//! - CSV

use std::fmt::Display;
use std::io::{self, Write};

use super::info_fields::format_memory_human;
use crate::config::OutputFormat;
use crate::scan::{Deployment, StatusSnapshot};
use crate::utils::ScanAborted;

const CSV_COLUMNS: &[&str] = &[
    "deployment_id",
    "deployment_name",
    "state",
    "mode",
    "version",
    "known_nodes",
    "cluster_size",
    "slots_assigned",
    "slots_ok",
    "slots_fail",
    "slots_pfail",
    "sentinel_ok",
    "sentinel_down",
    "master_ok",
    "sentinel_masters",
    "db_count",
    "total_keys",
    "total_expires",
    "used_memory",
    "partial_failures",
    "scan_ms",
    "error",
];

/// Renders scan outcomes
pub struct SnapshotReporter {
    format: OutputFormat,
}

impl SnapshotReporter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Header line, only for CSV
    pub fn write_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if self.format == OutputFormat::Csv {
            writeln!(out, "{}", CSV_COLUMNS.join(","))?;
        }
        Ok(())
    }

    pub fn write_snapshot<W: Write>(&self, out: &mut W, snapshot: &StatusSnapshot) -> io::Result<()> {
        match self.format {
            OutputFormat::Console => write_console(out, snapshot),
            OutputFormat::Json => {
                writeln!(out, "{}", serde_json::to_string_pretty(snapshot)?)
            }
            OutputFormat::Csv => writeln!(out, "{}", csv_row(snapshot)),
        }
    }

    pub fn write_aborted<W: Write>(
        &self,
        out: &mut W,
        deployment: &Deployment,
        error: &ScanAborted,
    ) -> io::Result<()> {
        match self.format {
            OutputFormat::Console => {
                writeln!(out, "\n=== {} ===", deployment.name)?;
                writeln!(out, "State: ABORTED")?;
                writeln!(out, "Error: {}", error)
            }
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "deployment_id": deployment.id,
                    "deployment_name": deployment.name,
                    "state": "ABORTED",
                    "error": error.to_string(),
                });
                writeln!(out, "{}", serde_json::to_string_pretty(&json)?)
            }
            OutputFormat::Csv => {
                let mut fields = vec![
                    deployment.id.to_string(),
                    csv_escape(&deployment.name),
                    "ABORTED".to_string(),
                ];
                fields.resize(CSV_COLUMNS.len() - 1, String::new());
                fields.push(csv_escape(&error.to_string()));
                writeln!(out, "{}", fields.join(","))
            }
        }
    }

    /// Report a scan outcome to stdout
    pub fn report(
        &self,
        deployment: &Deployment,
        outcome: &Result<StatusSnapshot, ScanAborted>,
    ) -> io::Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        match outcome {
            Ok(snapshot) => self.write_snapshot(&mut out, snapshot),
            Err(e) => self.write_aborted(&mut out, deployment, e),
        }
    }
}

fn or_na<T: Display>(value: Option<T>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn write_console<W: Write>(out: &mut W, s: &StatusSnapshot) -> io::Result<()> {
    writeln!(out, "\n=== {} ===", s.deployment_name)?;
    writeln!(out, "State: {}", s.state)?;
    writeln!(out, "Mode: {}", or_na(s.mode))?;
    writeln!(
        out,
        "Version: {}  OS: {}",
        s.version.as_deref().unwrap_or("n/a"),
        s.os.as_deref().unwrap_or("n/a")
    )?;
    writeln!(
        out,
        "Nodes: {} known, size {}",
        or_na(s.known_nodes),
        or_na(s.cluster_size)
    )?;

    if s.slots_assigned.is_some() || s.slots_ok.is_some() {
        writeln!(
            out,
            "Slots: assigned={} ok={} fail={} pfail={}",
            or_na(s.slots_assigned),
            or_na(s.slots_ok),
            or_na(s.slots_fail),
            or_na(s.slots_pfail)
        )?;
    }
    if s.sentinel_ok.is_some() || s.sentinel_masters.is_some() {
        writeln!(
            out,
            "Sentinels: {} ok, {} down; masters {}/{} ok",
            or_na(s.sentinel_ok),
            or_na(s.sentinel_down),
            or_na(s.master_ok),
            or_na(s.sentinel_masters)
        )?;
    }

    writeln!(
        out,
        "Keys: {} ({} expiring) in {} dbs",
        or_na(s.total_keys),
        or_na(s.total_expires),
        or_na(s.db_count)
    )?;
    writeln!(
        out,
        "Memory: {}",
        s.used_memory
            .map_or_else(|| "n/a".to_string(), format_memory_human)
    )?;

    for failure in &s.partial_failures {
        writeln!(out, "  unavailable [{}]: {}", failure.group, failure.reason)?;
    }
    writeln!(out, "Scan time: {} ms", s.scan_duration.as_millis())
}

fn csv_row(s: &StatusSnapshot) -> String {
    let opt = |v: Option<u64>| v.map(|v| v.to_string()).unwrap_or_default();
    let failures: Vec<String> = s.partial_failures.iter().map(|f| f.group.to_string()).collect();

    [
        s.deployment_id.to_string(),
        csv_escape(&s.deployment_name),
        s.state.to_string(),
        s.mode.map(|m| m.to_string()).unwrap_or_default(),
        csv_escape(s.version.as_deref().unwrap_or("")),
        opt(s.known_nodes),
        opt(s.cluster_size),
        opt(s.slots_assigned),
        opt(s.slots_ok),
        opt(s.slots_fail),
        opt(s.slots_pfail),
        opt(s.sentinel_ok),
        opt(s.sentinel_down),
        opt(s.master_ok),
        opt(s.sentinel_masters),
        opt(s.db_count),
        opt(s.total_keys),
        opt(s.total_expires),
        opt(s.used_memory),
        failures.join(";"),
        s.scan_duration.as_millis().to_string(),
        String::new(),
    ]
    .join(",")
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
