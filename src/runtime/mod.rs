//! Guest execution runtime
//!
//! This module hosts a single guest module: the host ABI it imports, the
//! string decoding those imports rely on, loading and instantiation, and the
//! driver that invokes the entry point and classifies its outcome.

pub mod abi;
pub mod console;
pub mod driver;
pub mod loader;
pub mod memory;
pub mod report;

pub use abi::{AbiFunction, GuestExit, HostState, UbsanReport};
pub use console::{Console, StreamColors};
pub use driver::Harness;
pub use loader::LoadedModule;
pub use memory::{GuestStr, LinearMemory, MemoryError};
pub use report::{RunReport, RunStatus};
