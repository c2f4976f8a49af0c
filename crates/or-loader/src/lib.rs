//! Core library loading: maps a libretro core shared object into the
//! process and binds its fixed entry-point table, atomically.

mod library;
mod symbols;

pub use library::CoreLibrary;
pub use symbols::{CoreSymbols, RawEntryFn, SymbolSource, REQUIRED_SYMBOLS};

use std::ffi::CStr;
use std::path::Path;

use or_core::error::LoadError;
use or_core::SystemInfo;

/// A fully resolved core: the mapped shared object (if any) plus its typed
/// entry-point table. Construction is atomic, so an instance always holds a
/// complete table; dropping it unmaps the library.
pub struct LoadedCore {
    // Kept alive for the table's sake; None for statically linked cores.
    library: Option<CoreLibrary>,
    symbols: CoreSymbols,
    name: String,
}

impl LoadedCore {
    /// Open the shared object at `path` and bind all required entry points.
    /// On a bind failure the library is unmapped before this returns.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let library = CoreLibrary::open(path)?;
        let symbols = CoreSymbols::bind(&library)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "core".to_string());

        tracing::info!("Bound core library {}", path.display());

        Ok(Self {
            library: Some(library),
            symbols,
            name,
        })
    }

    /// Wrap an already-complete table for a core linked into the process
    /// itself. No shared object is involved; unload is a no-op.
    pub fn from_table(symbols: CoreSymbols, name: &str) -> Self {
        Self {
            library: None,
            symbols,
            name: name.to_string(),
        }
    }

    /// Path of the underlying shared object, if dynamically loaded.
    pub fn path(&self) -> Option<&Path> {
        self.library.as_ref().map(|l| l.path())
    }

    /// Short name for logs, derived from the file stem.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resolved entry-point table. Invoking any entry is unsafe and must
    /// respect the lifecycle ordering enforced by the session layer.
    pub fn symbols(&self) -> &CoreSymbols {
        &self.symbols
    }

    /// Query the core's identity. The ABI allows this entry at any phase,
    /// including before `init`.
    pub fn system_info(&self) -> SystemInfo {
        let mut raw = or_abi::RetroSystemInfo::default();
        // Safety: the out-pointer is valid for the call; returned strings
        // point into the core's static storage and are copied right here.
        unsafe {
            (self.symbols.get_system_info)(&mut raw);
        }

        SystemInfo {
            library_name: copy_c_str(raw.library_name),
            library_version: copy_c_str(raw.library_version),
            valid_extensions: copy_c_str(raw.valid_extensions),
            need_fullpath: raw.need_fullpath,
            block_extract: raw.block_extract,
        }
    }
}

/// Copy a possibly-null C string into owned UTF-8, lossily.
fn copy_c_str(ptr: *const std::os::raw::c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}
