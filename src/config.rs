//! Harness configuration
//!
//! A [`Harness`] is assembled with [`HarnessBuilder`]:
//!
//! ```no_run
//! use lea_harness::{FeatureProfile, Harness};
//!
//! let harness = Harness::builder("tests/build/test_string.wasm")
//!     .entry_point("run_test")
//!     .profile(FeatureProfile::Vm)
//!     .color(false)
//!     .build();
//!
//! std::process::exit(harness.execute());
//! ```

use crate::runtime::console::{Console, StreamColors};
use crate::runtime::driver::Harness;
use std::io::Write;
use std::path::PathBuf;

/// Entry point invoked when none is given
pub const DEFAULT_ENTRY_POINT: &str = "run_test";

/// WebAssembly proposal sets the engine can be restricted to
///
/// `Mvp` and `Vm` mirror the two build environments of the guest C library:
/// a bare MVP target and a VM target that relies on the post-MVP proposals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FeatureProfile {
    /// Whatever the engine enables by default
    #[default]
    Default,
    /// WebAssembly 1.0 only
    Mvp,
    /// Post-MVP proposals used by the VM build, including 64-bit memories
    Vm,
}

impl FeatureProfile {
    /// Apply this profile to an engine configuration
    pub fn apply(&self, config: &mut wasmtime::Config) {
        match self {
            FeatureProfile::Default => {}
            FeatureProfile::Mvp => {
                config
                    .wasm_relaxed_simd(false)
                    .wasm_simd(false)
                    .wasm_exceptions(false)
                    .wasm_gc(false)
                    .wasm_function_references(false)
                    .wasm_tail_call(false)
                    .wasm_reference_types(false)
                    .wasm_bulk_memory(false)
                    .wasm_multi_value(false)
                    .wasm_multi_memory(false)
                    .wasm_memory64(false)
                    .wasm_threads(false);
            }
            FeatureProfile::Vm => {
                config
                    .wasm_simd(true)
                    .wasm_bulk_memory(true)
                    .wasm_reference_types(true)
                    .wasm_tail_call(true)
                    .wasm_multi_value(true)
                    .wasm_memory64(true)
                    .wasm_multi_memory(false)
                    .wasm_threads(false);
            }
        }
    }
}

/// Settings for a single harness run
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Path to the compiled guest module
    pub module_path: PathBuf,
    /// Name of the exported entry point
    pub entry_point: String,
    pub profile: FeatureProfile,
    /// Optional path for a JSON run report
    pub report_path: Option<PathBuf>,
}

impl HarnessConfig {
    pub fn new(module_path: impl Into<PathBuf>) -> Self {
        Self {
            module_path: module_path.into(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
            profile: FeatureProfile::default(),
            report_path: None,
        }
    }
}

/// Builder for [`Harness`]
pub struct HarnessBuilder {
    config: HarnessConfig,
    colors: StreamColors,
    stdout: Option<Box<dyn Write>>,
    stderr: Option<Box<dyn Write>>,
}

impl HarnessBuilder {
    /// Create a new builder for the module at `module_path`
    pub fn new(module_path: impl Into<PathBuf>) -> Self {
        Self {
            config: HarnessConfig::new(module_path),
            colors: StreamColors::default(),
            stdout: None,
            stderr: None,
        }
    }

    /// Set the exported function to invoke
    pub fn entry_point(mut self, name: impl Into<String>) -> Self {
        self.config.entry_point = name.into();
        self
    }

    /// Restrict the engine to a feature profile
    pub fn profile(mut self, profile: FeatureProfile) -> Self {
        self.config.profile = profile;
        self
    }

    /// Colorize diagnostics on both streams
    pub fn color(mut self, color: bool) -> Self {
        self.colors = StreamColors::both(color);
        self
    }

    /// Colorize each stream separately
    pub fn colors(mut self, colors: StreamColors) -> Self {
        self.colors = colors;
        self
    }

    /// Write a JSON run report to `path` after the run
    pub fn report(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report_path = Some(path.into());
        self
    }

    /// Set the sink for guest diagnostics (defaults to stdout)
    pub fn stdout(mut self, stdout: Box<dyn Write>) -> Self {
        self.stdout = Some(stdout);
        self
    }

    /// Set the sink for harness errors (defaults to stderr)
    pub fn stderr(mut self, stderr: Box<dyn Write>) -> Self {
        self.stderr = Some(stderr);
        self
    }

    pub fn build(self) -> Harness {
        let stdout = self.stdout.unwrap_or_else(|| Box::new(std::io::stdout()));
        let stderr = self.stderr.unwrap_or_else(|| Box::new(std::io::stderr()));
        Harness::new(self.config, Console::new(stdout, stderr, self.colors))
    }
}
