//! Fault taxonomy for a harness run
//!
//! Every fault is fatal to the process and exits with [`FAULT_EXIT_CODE`].
//! The only other exit code comes from an entry point that returns normally.

use crate::runtime::abi::GuestExit;
use crate::runtime::memory::MemoryError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for every non-success outcome
pub const FAULT_EXIT_CODE: i32 = 1;

pub type Result<T> = std::result::Result<T, Fault>;

#[derive(Debug, Error)]
pub enum Fault {
    #[error("{0}")]
    Usage(String),
    #[error("couldn't read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to instantiate module: {0}")]
    Instantiation(String),
    #[error("'{0}' function not exported")]
    MissingExport(String),
    #[error("'{name}' is not a zero-argument integer function: {signature}")]
    EntrySignature { name: String, signature: String },
    #[error(transparent)]
    Guest(#[from] GuestExit),
    #[error("VM error: {0}")]
    RuntimeTrap(String),
    #[error("{0}")]
    Execution(String),
}

impl Fault {
    pub fn exit_code(&self) -> i32 {
        FAULT_EXIT_CODE
    }

    /// Short stable name for the fault category
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::Usage(_) => "usage",
            Fault::Io { .. } => "io_failure",
            Fault::Instantiation(_) => "instantiation_failure",
            Fault::MissingExport(_) | Fault::EntrySignature { .. } => "missing_export",
            Fault::Guest(GuestExit::Abort { .. }) => "abort",
            Fault::Guest(GuestExit::Ubsan(_)) => "ubsan",
            Fault::RuntimeTrap(_) => "trap",
            Fault::Execution(_) => "execution_error",
        }
    }
}

impl From<MemoryError> for Fault {
    fn from(err: MemoryError) -> Self {
        Fault::Execution(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::abi::UbsanReport;

    #[test]
    fn test_every_fault_exits_one() {
        let faults = vec![
            Fault::Usage("usage".to_string()),
            Fault::Io {
                path: PathBuf::from("missing.wasm"),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
            },
            Fault::Instantiation("bad magic".to_string()),
            Fault::MissingExport("run_test".to_string()),
            Fault::Guest(GuestExit::Abort { line: 3 }),
            Fault::RuntimeTrap("unreachable".to_string()),
            Fault::Execution("boom".to_string()),
        ];

        for fault in faults {
            assert_eq!(fault.exit_code(), 1, "{fault:?}");
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(Fault::MissingExport("run_test".to_string()).to_string(), "'run_test' function not exported");
        assert_eq!(
            Fault::RuntimeTrap("out of bounds memory access".to_string()).to_string(),
            "VM error: out of bounds memory access"
        );

        let io = Fault::Io {
            path: PathBuf::from("tests/missing.wasm"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(io.to_string(), "couldn't read tests/missing.wasm: not found");
    }

    #[test]
    fn test_guest_fault_is_transparent() {
        let report = UbsanReport {
            name: "overflow".to_string(),
            filename: "a.c".to_string(),
            line: 1,
            column: 2,
        };
        let fault = Fault::from(GuestExit::Ubsan(report));

        assert_eq!(fault.to_string(), "[UBSEN] overflow at a.c:1:2");
        assert_eq!(fault.kind(), "ubsan");
    }

    #[test]
    fn test_memory_errors_are_execution_faults() {
        let fault = Fault::from(MemoryError::Unbound);

        assert_eq!(fault.kind(), "execution_error");
        assert_eq!(fault.to_string(), "linear memory is not bound");
    }
}
