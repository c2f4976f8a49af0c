//! OS-level loading of core shared objects.

use std::path::{Path, PathBuf};

use or_core::error::LoadError;

use crate::symbols::{RawEntryFn, SymbolSource};

/// RAII handle over a mapped core shared object. Dropping it unmaps the
/// library; every function pointer resolved from it dies with it, which is
/// why the table and the handle travel together in `LoadedCore`.
pub struct CoreLibrary {
    inner: libloading::Library,
    path: PathBuf,
}

impl CoreLibrary {
    /// Map the shared object at `path` into the process. A missing file and
    /// a file the dynamic linker rejects are distinct, recoverable errors.
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        // Safety: loading runs the library's initializers on this thread.
        let inner = unsafe { libloading::Library::new(path) }.map_err(|e| LoadError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        tracing::debug!("Opened core library {}", path.display());

        Ok(Self {
            inner,
            path: path.to_path_buf(),
        })
    }

    /// Path this library was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SymbolSource for CoreLibrary {
    fn lookup(&self, name: &'static str) -> Option<RawEntryFn> {
        // Safety: the address is treated as opaque here; the typed cast
        // happens in the table bind, which fixes the signature per name.
        unsafe {
            self.inner
                .get::<RawEntryFn>(name.as_bytes())
                .ok()
                .map(|sym| *sym)
        }
    }
}

impl Drop for CoreLibrary {
    fn drop(&mut self) {
        tracing::debug!("Unloading core library {}", self.path.display());
    }
}
