//! Machine-readable run report
//!
//! When requested, the harness writes one JSON object describing the run so
//! that a test runner can collect results without scraping diagnostics.

use super::abi::GuestExit;
use super::driver::exit_code_for;
use crate::config::HarnessConfig;
use crate::error::Fault;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Final state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Passed,
    Failed,
    Abort,
    Ubsan,
    Trap,
    MissingExport,
    IoFailure,
    InstantiationFailure,
    ExecutionError,
}

impl RunStatus {
    fn from_fault(fault: &Fault) -> Self {
        match fault {
            Fault::Guest(GuestExit::Abort { .. }) => RunStatus::Abort,
            Fault::Guest(GuestExit::Ubsan(_)) => RunStatus::Ubsan,
            Fault::RuntimeTrap(_) => RunStatus::Trap,
            Fault::MissingExport(_) | Fault::EntrySignature { .. } => RunStatus::MissingExport,
            Fault::Io { .. } => RunStatus::IoFailure,
            Fault::Instantiation(_) => RunStatus::InstantiationFailure,
            Fault::Usage(_) | Fault::Execution(_) => RunStatus::ExecutionError,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub module: String,
    pub entry_point: String,
    pub status: RunStatus,
    /// Status the process exits with
    pub exit_code: i32,
    /// Value returned by the entry point, at full width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RunReport {
    pub fn new(config: &HarnessConfig, outcome: &Result<i64, Fault>) -> Self {
        let (status, exit_code, result, message) = match outcome {
            Ok(0) => (RunStatus::Passed, 0, Some(0), None),
            Ok(value) => (RunStatus::Failed, exit_code_for(*value), Some(*value), None),
            Err(fault) => (RunStatus::from_fault(fault), fault.exit_code(), None, Some(fault.to_string())),
        };

        Self {
            module: config.module_path.display().to_string(),
            entry_point: config.entry_point.clone(),
            status,
            exit_code,
            result,
            message,
        }
    }

    /// Write the report as pretty-printed JSON
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }
}
