//! Entry point invocation and fault classification
//!
//! The driver resolves the entry export, calls it once, and turns the result
//! into an exit code:
//!
//! | Outcome                              | Exit code |
//! |--------------------------------------|-----------|
//! | entry point returns `N` in `0..=255` | `N`       |
//! | entry point returns any other value  | 1         |
//! | missing or non-callable entry point  | 1         |
//! | guest `abort` / `ubsanReport`        | 1         |
//! | runtime trap                         | 1         |
//! | read or instantiation failure        | 1         |
//!
//! Every path ends in a single exit code returned from [`Harness::execute`].

use super::abi::GuestExit;
use super::console::Console;
use super::loader::{self, LoadedModule};
use super::memory::MemoryError;
use super::report::RunReport;
use crate::config::{HarnessBuilder, HarnessConfig};
use crate::error::{Fault, Result, FAULT_EXIT_CODE};
use std::path::PathBuf;
use wasmtime::{Trap, Val, ValType};

/// Runs one entry point of one guest module
#[derive(Debug)]
pub struct Harness {
    config: HarnessConfig,
    console: Console,
}

impl Harness {
    /// Start building a harness for the module at `module_path`
    pub fn builder(module_path: impl Into<PathBuf>) -> HarnessBuilder {
        HarnessBuilder::new(module_path)
    }

    pub(crate) fn new(config: HarnessConfig, console: Console) -> Self {
        Self { config, console }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Load the module and invoke the entry point
    ///
    /// Returns the entry point's result, or the fault that ended the run.
    /// Nothing is reported; see [`Harness::execute`].
    pub fn run(&self) -> Result<i64> {
        let mut loaded = loader::load(&self.config.module_path, self.config.profile, self.console.clone())?;
        invoke_entry(&mut loaded, &self.config.entry_point)
    }

    /// Run, report any fault, write the run report, and return the exit code
    pub fn execute(self) -> i32 {
        let outcome = self.run();

        let exit_code = match &outcome {
            Ok(result) => {
                tracing::debug!(result, "entry point returned");
                exit_code_for(*result)
            }
            Err(fault) => {
                tracing::debug!(kind = fault.kind(), "run faulted");
                self.report_fault(fault);
                fault.exit_code()
            }
        };

        if let Some(path) = &self.config.report_path {
            let report = RunReport::new(&self.config, &outcome);
            if let Err(e) = report.write(path) {
                tracing::warn!(path = %path.display(), "failed to write run report: {}", e);
            }
        }

        exit_code
    }

    fn report_fault(&self, fault: &Fault) {
        match fault {
            Fault::Guest(exit) => self.console.guest_fatal(&exit.to_string()),
            Fault::RuntimeTrap(_) | Fault::Usage(_) => self.console.error(&fault.to_string()),
            _ => self
                .console
                .error(&format!("Execution error {}: {}", self.config.module_path.display(), fault)),
        }
    }
}

/// Resolve `name` in the instance's exports and call it with no arguments
///
/// The export must be a function of type `() -> i32` or `() -> i64`. The
/// result is returned at full width; see [`exit_code_for`].
pub fn invoke_entry(loaded: &mut LoadedModule, name: &str) -> Result<i64> {
    let func = loaded
        .instance
        .get_func(&mut loaded.store, name)
        .ok_or_else(|| Fault::MissingExport(name.to_string()))?;

    let ty = func.ty(&loaded.store);
    let result_ty = ty.results().next();
    let callable = ty.params().len() == 0
        && ty.results().len() == 1
        && matches!(result_ty, Some(ValType::I32) | Some(ValType::I64));
    if !callable {
        return Err(Fault::EntrySignature {
            name: name.to_string(),
            signature: ty.to_string(),
        });
    }

    tracing::debug!(entry = name, "invoking entry point");
    let mut results = [Val::I32(0)];
    func.call(&mut loaded.store, &[], &mut results)
        .map_err(|e| classify(e, Fault::Execution))?;

    match results[0] {
        Val::I32(result) => Ok(i64::from(result)),
        Val::I64(result) => Ok(result),
        ref other => Err(Fault::Execution(format!("entry point '{}' returned {:?}", name, other))),
    }
}

/// Process exit code for an entry point result
///
/// Only the low 8 bits of an exit status survive, so a result outside
/// `0..=255` becomes [`FAULT_EXIT_CODE`] and still reads as a failure.
pub fn exit_code_for(result: i64) -> i32 {
    u8::try_from(result).map(i32::from).unwrap_or(FAULT_EXIT_CODE)
}

/// Classify an error raised out of guest execution
///
/// Guest exits and traps keep their own category; any other error is wrapped
/// with `fallback`.
pub fn classify(err: wasmtime::Error, fallback: fn(String) -> Fault) -> Fault {
    if let Some(exit) = err.downcast_ref::<GuestExit>() {
        return Fault::Guest(exit.clone());
    }
    if let Some(trap) = err.downcast_ref::<Trap>() {
        tracing::debug!("guest trapped: {:?}", err);
        return Fault::RuntimeTrap(trap.to_string());
    }
    if let Some(memory_error) = err.downcast_ref::<MemoryError>() {
        return Fault::from(memory_error.clone());
    }
    fallback(format!("{err:#}"))
}
