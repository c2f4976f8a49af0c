//! Core-to-host logging
//!
//! GET_LOG_INTERFACE hands the core a printf-style callback. The variadic
//! entry point lives in shim/retro_log.c; it formats the message and calls
//! [`or_retro_log_line`] here, which routes the finished line into
//! `tracing` under the `core` target so core output is filterable
//! separately from frontend output.

use std::ffi::CStr;
use std::os::raw::{c_char, c_uint};

use or_abi as abi;

extern "C" {
    /// Variadic logging entry point given to cores. Defined in
    /// shim/retro_log.c; stable Rust cannot define variadic functions.
    pub fn or_retro_log_printf(level: c_uint, fmt: *const c_char, ...);
}

/// Receives one formatted line from the C shim.
///
/// Runs on the core's call stack, possibly mid-`retro_run`; it must not
/// call back into the core or take the session lock.
///
/// # Safety
///
/// `message` must be null or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn or_retro_log_line(level: c_uint, message: *const c_char) {
    if message.is_null() {
        return;
    }
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    let text = text.trim_end_matches('\n');

    match level {
        abi::LOG_DEBUG => tracing::debug!(target: "core", "{text}"),
        abi::LOG_WARN => tracing::warn!(target: "core", "{text}"),
        abi::LOG_ERROR => tracing::error!(target: "core", "{text}"),
        _ => tracing::info!(target: "core", "{text}"),
    }
}
