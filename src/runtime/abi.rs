//! Host ABI exposed to guest modules
//!
//! The guest imports a small set of functions from the `env` namespace:
//!
//! - `abort(line)` -- an expected assertion failure; never returns
//! - `log(ptr, len)` -- write guest text to the output stream
//! - `ubsanReport(name_ptr, filename_ptr, line, column)` -- an undefined
//!   behavior sanitizer violation; never returns
//!
//! The guest C library imports the same functions as `__lea_abort`,
//! `__lea_log` and `__lea_ubsen`; both spellings resolve to the same host
//! implementation.
//!
//! # Memory binding
//!
//! Imports are defined before the instance exists, so the exported memory is
//! not available when the import table is built. [`HostState`] holds an empty
//! memory slot that the loader fills once after instantiation via
//! [`HostState::bind_memory`]. Every host call reads the slot at call time.
//!
//! # Fatal calls
//!
//! `abort` and `ubsanReport` do not exit the process. They return a
//! [`GuestExit`] error through the wasmtime call boundary, which unwinds the
//! guest and is classified by the driver.

use super::console::Console;
use super::memory::{read_c_string, read_string, LinearMemory};
use crate::error::Fault;
use thiserror::Error;
use wasmtime::{Caller, ExternType, FuncType, Linker, Memory, Module, Val, ValType};

/// Import namespace for all host ABI functions
pub const ABI_NAMESPACE: &str = "env";

/// Export name of the guest's linear memory
pub const MEMORY_EXPORT: &str = "memory";

/// State shared between host functions and the driver
#[derive(Debug)]
pub struct HostState {
    /// Linear memory, bound after instantiation
    memory: Option<Memory>,
    console: Console,
}

impl HostState {
    pub fn new(console: Console) -> Self {
        Self { memory: None, console }
    }

    /// Bind the guest's exported memory
    ///
    /// Must be called after instantiation and before the entry point runs.
    pub fn bind_memory(&mut self, memory: Memory) {
        self.memory = Some(memory);
    }

    /// Check if memory is bound
    pub fn has_memory(&self) -> bool {
        self.memory.is_some()
    }
}

/// Source location attached to a sanitizer report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UbsanReport {
    pub name: String,
    pub filename: String,
    pub line: i64,
    pub column: i64,
}

/// A guest-initiated termination raised from inside a host call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuestExit {
    #[error("[ABORT] at line {line}")]
    Abort { line: i64 },
    #[error("[UBSEN] {} at {}:{}:{}", .0.name, .0.filename, .0.line, .0.column)]
    Ubsan(UbsanReport),
}

/// Functions the guest may import from [`ABI_NAMESPACE`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiFunction {
    Abort,
    Log,
    UbsanReport,
}

impl AbiFunction {
    pub const ALL: [AbiFunction; 3] = [AbiFunction::Abort, AbiFunction::Log, AbiFunction::UbsanReport];

    /// Resolve an import name, accepting both the canonical and the C library spelling
    pub fn from_import_name(name: &str) -> Option<Self> {
        match name {
            "abort" | "__lea_abort" => Some(AbiFunction::Abort),
            "log" | "__lea_log" => Some(AbiFunction::Log),
            "ubsanReport" | "__lea_ubsen" => Some(AbiFunction::UbsanReport),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AbiFunction::Abort => "abort",
            AbiFunction::Log => "log",
            AbiFunction::UbsanReport => "ubsanReport",
        }
    }

    /// Number of integer parameters the function takes
    pub fn arity(&self) -> usize {
        match self {
            AbiFunction::Abort => 1,
            AbiFunction::Log => 2,
            AbiFunction::UbsanReport => 4,
        }
    }

    /// Check a declared import type against the ABI
    ///
    /// Each parameter may be `i32` or `i64` so that 64-bit memory guests can
    /// pass pointers and sizes at full width. No results are allowed.
    pub fn check_signature(&self, ty: &FuncType) -> Result<(), String> {
        let params_ok = ty.params().len() == self.arity() && ty.params().all(|p| matches!(p, ValType::I32 | ValType::I64));
        if !params_ok || ty.results().len() != 0 {
            return Err(format!(
                "import {}.{} has type {}, expected {} integer parameter(s) and no results",
                ABI_NAMESPACE,
                self.name(),
                ty,
                self.arity()
            ));
        }
        Ok(())
    }

    /// Run the host implementation for one guest call
    pub fn call(&self, mut caller: Caller<'_, HostState>, params: &[Val]) -> wasmtime::Result<()> {
        match self {
            AbiFunction::Abort => {
                let line = int_arg(params, 0)?;
                tracing::debug!(line, "guest abort");
                Err(wasmtime::Error::new(GuestExit::Abort { line }))
            }
            AbiFunction::Log => {
                let ptr = pointer_arg(params, 0)?;
                let len = pointer_arg(params, 1)?;
                let text = read_string(linear_memory(&caller), ptr, len).map_err(wasmtime::Error::new)?;
                tracing::trace!(ptr, len, "guest log");
                caller.data_mut().console.guest_log(&text);
                Ok(())
            }
            AbiFunction::UbsanReport => {
                let name = read_c_string(linear_memory(&caller), pointer_arg(params, 0)?).map_err(wasmtime::Error::new)?;
                let filename =
                    read_c_string(linear_memory(&caller), pointer_arg(params, 1)?).map_err(wasmtime::Error::new)?;
                let report = UbsanReport {
                    name,
                    filename,
                    line: int_arg(params, 2)?,
                    column: int_arg(params, 3)?,
                };
                tracing::debug!(?report, "guest sanitizer report");
                Err(wasmtime::Error::new(GuestExit::Ubsan(report)))
            }
        }
    }
}

/// Register host implementations for every ABI function `module` imports
///
/// Each function is defined with the exact type the module declares, after
/// checking it against the ABI. Imports in [`ABI_NAMESPACE`] that are not ABI
/// functions are left for instantiation to reject.
pub fn define_imports(linker: &mut Linker<HostState>, module: &Module) -> Result<(), Fault> {
    linker.allow_shadowing(true);

    for import in module.imports() {
        if import.module() != ABI_NAMESPACE {
            continue;
        }
        let Some(function) = AbiFunction::from_import_name(import.name()) else {
            continue;
        };
        let ExternType::Func(ty) = import.ty() else {
            return Err(Fault::Instantiation(format!(
                "import {}.{} must be a function",
                ABI_NAMESPACE,
                import.name()
            )));
        };
        function.check_signature(&ty).map_err(Fault::Instantiation)?;

        tracing::debug!(import = import.name(), abi = function.name(), "defining host import");
        linker
            .func_new(ABI_NAMESPACE, import.name(), ty, move |caller, params, _results| {
                function.call(caller, params)
            })
            .map_err(|e| Fault::Instantiation(format!("failed to define {}.{}: {}", ABI_NAMESPACE, import.name(), e)))?;
    }

    Ok(())
}

fn linear_memory<'a>(caller: &'a Caller<'_, HostState>) -> Option<LinearMemory<'a>> {
    caller.data().memory.map(|memory| LinearMemory::new(memory.data(caller)))
}

/// Extract a signed integer argument, widening `i32` to `i64`
fn int_arg(params: &[Val], index: usize) -> wasmtime::Result<i64> {
    match params.get(index) {
        Some(Val::I32(v)) => Ok(i64::from(*v)),
        Some(Val::I64(v)) => Ok(*v),
        other => Err(wasmtime::Error::msg(format!("expected integer argument {index}, got {other:?}"))),
    }
}

/// Extract a pointer or size argument; `i32` values are unsigned offsets
fn pointer_arg(params: &[Val], index: usize) -> wasmtime::Result<u64> {
    match params.get(index) {
        Some(Val::I32(v)) => Ok(u64::from(*v as u32)),
        Some(Val::I64(v)) => Ok(*v as u64),
        other => Err(wasmtime::Error::msg(format!("expected pointer argument {index}, got {other:?}"))),
    }
}
