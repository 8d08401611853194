//! A host-side harness for running WebAssembly test modules.
//!
//! lea-harness loads one compiled guest module, provides it a minimal host
//! ABI, invokes one exported entry point, and turns the outcome into a
//! process exit code for an automated test runner.
//!
//! # Modules
//!
//! - [`runtime`] -- Host ABI, linear memory decoding, loading, and the driver.
//! - [`config`] -- Harness settings and the [`HarnessBuilder`].
//! - [`error`] -- The [`Fault`] taxonomy; every fault exits with code 1.
//!
//! # Host ABI
//!
//! Guests import from the `env` namespace:
//!
//! | Import | Signature | Effect |
//! |--------|-----------|--------|
//! | `abort` / `__lea_abort` | `(line)` | prints `[ABORT] at line <line>`, exits 1 |
//! | `log` / `__lea_log` | `(ptr, len)` | prints the text verbatim |
//! | `ubsanReport` / `__lea_ubsen` | `(name, file, line, column)` | prints `[UBSEN] <name> at <file>:<line>:<column>`, exits 1 |
//!
//! # Example
//!
//! ```
//! use lea_harness::Harness;
//! use std::io::Write;
//!
//! let dir = std::env::temp_dir().join("lea-harness-doc");
//! std::fs::create_dir_all(&dir).unwrap();
//! let path = dir.join("pass.wat");
//! std::fs::File::create(&path)
//!     .unwrap()
//!     .write_all(br#"(module (func (export "run_test") (result i32) i32.const 0))"#)
//!     .unwrap();
//!
//! let exit_code = Harness::builder(&path).build().execute();
//! assert_eq!(exit_code, 0);
//! ```

pub mod config;
pub mod error;
pub mod runtime;

pub use config::{FeatureProfile, HarnessBuilder, HarnessConfig, DEFAULT_ENTRY_POINT};
pub use error::{Fault, FAULT_EXIT_CODE};
pub use runtime::{Harness, StreamColors};
