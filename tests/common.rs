//! Common test utilities shared between integration tests
#![allow(dead_code)]

use lea_harness::{FeatureProfile, Harness};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Captured writer that stores output for testing
pub struct CapturedWriter(pub Arc<Mutex<Vec<u8>>>);

impl Write for CapturedWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Result of a harness run with captured streams
#[derive(Debug)]
pub struct Run {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Compile WAT and write the binary module into `dir`
pub fn write_module(dir: &Path, name: &str, wat: &str) -> PathBuf {
    let wasm = wat::parse_str(wat).expect("Failed to parse WAT");
    let path = dir.join(name);
    std::fs::write(&path, wasm).expect("Failed to write module");
    path
}

/// Run `path` through the harness, capturing both streams
pub fn run_path(path: &Path, entry_point: &str, profile: FeatureProfile, report: Option<&Path>) -> Run {
    let stdout = Arc::new(Mutex::new(Vec::<u8>::new()));
    let stderr = Arc::new(Mutex::new(Vec::<u8>::new()));

    let mut builder = Harness::builder(path)
        .entry_point(entry_point)
        .profile(profile)
        .stdout(Box::new(CapturedWriter(stdout.clone())))
        .stderr(Box::new(CapturedWriter(stderr.clone())));
    if let Some(report) = report {
        builder = builder.report(report);
    }
    let exit_code = builder.build().execute();

    let stdout = String::from_utf8(stdout.lock().unwrap().clone()).unwrap();
    let stderr = String::from_utf8(stderr.lock().unwrap().clone()).unwrap();
    Run {
        exit_code,
        stdout,
        stderr,
    }
}

/// Compile and run a WAT module with the given entry point
pub fn run_wat_entry(wat: &str, entry_point: &str) -> Run {
    let dir = TempDir::new().unwrap();
    let path = write_module(dir.path(), "test.wasm", wat);
    run_path(&path, entry_point, FeatureProfile::Default, None)
}

/// Compile and run a WAT module's `run_test` export
pub fn run_wat(wat: &str) -> Run {
    run_wat_entry(wat, "run_test")
}
