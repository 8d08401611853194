//! Module loading and instantiation
//!
//! Loading is two-phase. The import table is defined against a
//! [`HostState`] whose memory slot is empty; once the instance exists, its
//! exported memory is bound into that slot. No partial or retried
//! instantiation is attempted: any failure here is a fault.

use super::abi::{define_imports, HostState, MEMORY_EXPORT};
use super::console::Console;
use super::driver::classify;
use crate::config::FeatureProfile;
use crate::error::{Fault, Result};
use std::path::Path;
use wasmtime::{Config, Engine, Instance, Linker, Memory, Module, Store};

/// An instantiated guest with its memory bound
pub struct LoadedModule {
    pub store: Store<HostState>,
    pub instance: Instance,
    /// Exported linear memory, if the guest has one
    pub memory: Option<Memory>,
}

impl std::fmt::Debug for LoadedModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModule")
            .field("has_memory", &self.memory.is_some())
            .finish()
    }
}

/// Create an engine restricted to `profile`
pub fn create_engine(profile: FeatureProfile) -> Result<Engine> {
    let mut config = Config::new();
    profile.apply(&mut config);
    Engine::new(&config).map_err(|e| Fault::Instantiation(format!("invalid engine configuration: {e:#}")))
}

/// Read a module's bytes from storage
pub fn read_module(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|source| Fault::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), len = bytes.len(), "read module");
    Ok(bytes)
}

/// Compile and instantiate `bytes` against the host ABI
///
/// Binary and text encodings are both accepted.
pub fn instantiate(engine: &Engine, bytes: &[u8], console: Console) -> Result<LoadedModule> {
    let module = Module::new(engine, bytes).map_err(|e| Fault::Instantiation(format!("{e:#}")))?;

    let mut linker = Linker::new(engine);
    define_imports(&mut linker, &module)?;

    let mut store = Store::new(engine, HostState::new(console));
    // A start function runs during instantiation and can already abort or trap
    let instance = linker
        .instantiate(&mut store, &module)
        .map_err(|e| classify(e, Fault::Instantiation))?;

    let memory = instance.get_memory(&mut store, MEMORY_EXPORT);
    match memory {
        Some(memory) => {
            store.data_mut().bind_memory(memory);
            tracing::debug!(size = memory.data_size(&store), "bound guest memory");
        }
        None => tracing::debug!("module exports no memory"),
    }

    Ok(LoadedModule { store, instance, memory })
}

/// Read the module at `path` and instantiate it
pub fn load(path: &Path, profile: FeatureProfile, console: Console) -> Result<LoadedModule> {
    let engine = create_engine(profile)?;
    let bytes = read_module(path)?;
    instantiate(&engine, &bytes, console)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::console::StreamColors;

    fn console() -> Console {
        Console::new(Box::new(std::io::sink()), Box::new(std::io::sink()), StreamColors::default())
    }

    #[test]
    fn test_instantiate_binds_memory() {
        let engine = create_engine(FeatureProfile::Default).unwrap();
        let loaded = instantiate(&engine, br#"(module (memory (export "memory") 1))"#, console()).unwrap();

        assert!(loaded.memory.is_some());
        assert!(loaded.store.data().has_memory());
    }

    #[test]
    fn test_instantiate_without_memory() {
        let engine = create_engine(FeatureProfile::Default).unwrap();
        let loaded = instantiate(&engine, b"(module)", console()).unwrap();

        assert!(loaded.memory.is_none());
        assert!(!loaded.store.data().has_memory());
    }

    #[test]
    fn test_malformed_module() {
        let engine = create_engine(FeatureProfile::Default).unwrap();
        let result = instantiate(&engine, b"\0asm\x02\0\0\0", console());

        assert!(matches!(result, Err(Fault::Instantiation(_))));
    }

    #[test]
    fn test_unknown_import() {
        let engine = create_engine(FeatureProfile::Default).unwrap();
        let wat = r#"(module (import "env" "printf" (func (param i32))))"#;

        assert!(matches!(instantiate(&engine, wat.as_bytes(), console()), Err(Fault::Instantiation(_))));
    }

    #[test]
    fn test_bad_abi_signature() {
        let engine = create_engine(FeatureProfile::Default).unwrap();
        let wat = r#"(module (import "env" "abort" (func (param f64))))"#;

        match instantiate(&engine, wat.as_bytes(), console()) {
            Err(Fault::Instantiation(msg)) => assert!(msg.contains("env.abort"), "unexpected message: {msg}"),
            other => panic!("Expected instantiation fault, got {:?}", other),
        }
    }

    #[test]
    fn test_read_missing_module() {
        let result = read_module(Path::new("does/not/exist.wasm"));

        assert!(matches!(result, Err(Fault::Io { .. })));
    }
}
