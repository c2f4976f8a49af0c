//! Environment command dispatch
//!
//! The environment callback is the core's query channel into the frontend:
//! a command code plus an opaque payload pointer, answered synchronously
//! with a handled/unhandled flag. Every command the frontend understands is
//! decoded here; everything else is logged and reported unhandled, which
//! cores treat as "feature absent", never as an error.

use std::ffi::CStr;
use std::os::raw::{c_char, c_uint, c_void};

use or_abi as abi;
use or_core::{HwContextType, PixelFormat};

use crate::context::{self, HwRenderParams, SessionContext};
use crate::log;

/// Environment commands the frontend answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvCommand {
    GetCanDupe,
    GetSystemDirectory,
    SetPixelFormat,
    SetHwRender,
    GetVariable,
    GetVariableUpdate,
    GetLogInterface,
    GetSaveDirectory,
    SetMemoryMaps,
    SetHwRenderContextNegotiationInterface,
    GetPreferredHwRender,
    SetMinimumAudioLatency,
    Unknown(c_uint),
}

impl EnvCommand {
    pub fn from_code(cmd: c_uint) -> Self {
        match cmd {
            abi::ENVIRONMENT_GET_CAN_DUPE => Self::GetCanDupe,
            abi::ENVIRONMENT_GET_SYSTEM_DIRECTORY => Self::GetSystemDirectory,
            abi::ENVIRONMENT_SET_PIXEL_FORMAT => Self::SetPixelFormat,
            abi::ENVIRONMENT_SET_HW_RENDER => Self::SetHwRender,
            abi::ENVIRONMENT_GET_VARIABLE => Self::GetVariable,
            abi::ENVIRONMENT_GET_VARIABLE_UPDATE => Self::GetVariableUpdate,
            abi::ENVIRONMENT_GET_LOG_INTERFACE => Self::GetLogInterface,
            abi::ENVIRONMENT_GET_SAVE_DIRECTORY => Self::GetSaveDirectory,
            abi::ENVIRONMENT_SET_MEMORY_MAPS => Self::SetMemoryMaps,
            abi::ENVIRONMENT_SET_HW_RENDER_CONTEXT_NEGOTIATION_INTERFACE => {
                Self::SetHwRenderContextNegotiationInterface
            }
            abi::ENVIRONMENT_GET_PREFERRED_HW_RENDER => Self::GetPreferredHwRender,
            abi::ENVIRONMENT_SET_MINIMUM_AUDIO_LATENCY => Self::SetMinimumAudioLatency,
            other => Self::Unknown(other),
        }
    }
}

/// Handle one environment call against `ctx`. Returns whether the command
/// was handled.
///
/// # Safety
///
/// `data` must be the payload the libretro ABI defines for `cmd`: null or
/// a pointer to the command's payload type, valid for the duration of the
/// call. Out-pointers must be writable.
pub unsafe fn dispatch(ctx: &mut SessionContext, cmd: c_uint, data: *mut c_void) -> bool {
    let command = EnvCommand::from_code(cmd);
    tracing::trace!("environment command {:?}", command);

    unsafe {
        match command {
            EnvCommand::GetCanDupe => write_out(data, true),
            EnvCommand::GetSystemDirectory => write_out(data, ctx.system_dir().as_ptr()),
            EnvCommand::GetSaveDirectory => write_out(data, ctx.save_dir().as_ptr()),
            EnvCommand::SetPixelFormat => set_pixel_format(ctx, data),
            EnvCommand::SetHwRender => set_hw_render(ctx, data),
            EnvCommand::GetVariable => get_variable(ctx, data),
            EnvCommand::GetVariableUpdate => {
                // Variables never change mid-session; report "no update"
                // and leave the command unhandled.
                let _ = write_out(data, false);
                false
            }
            EnvCommand::GetLogInterface => write_out(
                data,
                abi::RetroLogCallback {
                    log: Some(log::or_retro_log_printf as abi::LogPrintfFn),
                },
            ),
            EnvCommand::SetMemoryMaps => {
                tracing::debug!("memory map description received and discarded");
                true
            }
            EnvCommand::SetHwRenderContextNegotiationInterface => {
                tracing::debug!("hw render context negotiation interface not supported");
                false
            }
            EnvCommand::GetPreferredHwRender => {
                write_out(data, ctx.preferred_hw_context.to_abi())
            }
            EnvCommand::SetMinimumAudioLatency => set_minimum_audio_latency(ctx, data),
            EnvCommand::Unknown(code) => {
                tracing::debug!(
                    "unhandled environment command {} (0x{:x})",
                    code & !abi::ENVIRONMENT_EXPERIMENTAL,
                    code
                );
                false
            }
        }
    }
}

/// Trampoline registered through `retro_set_environment`. Locks the
/// session slot and delegates; without a session every command reads
/// unhandled.
///
/// # Safety
///
/// Same payload contract as [`dispatch`].
pub unsafe extern "C" fn environment_callback(cmd: c_uint, data: *mut c_void) -> bool {
    context::with_session(|ctx| unsafe { dispatch(ctx, cmd, data) }).unwrap_or_else(|| {
        tracing::warn!("environment command 0x{cmd:x} arrived with no active session");
        false
    })
}

/// Write `value` through a core-owned out-pointer. A null payload means
/// the command cannot be answered.
///
/// # Safety
///
/// A non-null `data` must point to writable storage for a `T`.
unsafe fn write_out<T>(data: *mut c_void, value: T) -> bool {
    if data.is_null() {
        return false;
    }
    unsafe { *(data as *mut T) = value };
    true
}

unsafe fn set_pixel_format(ctx: &mut SessionContext, data: *mut c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let raw = unsafe { *(data as *const c_uint) };
    match PixelFormat::from_abi(raw) {
        Some(format) => {
            tracing::debug!("core set pixel format {format}");
            ctx.pixel_format = format;
            true
        }
        None => {
            tracing::warn!("core requested unknown pixel format {raw}");
            false
        }
    }
}

unsafe fn get_variable(ctx: &SessionContext, data: *mut c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let var = unsafe { &mut *(data as *mut abi::RetroVariable) };
    var.value = std::ptr::null();
    if var.key.is_null() {
        return false;
    }
    let Ok(key) = unsafe { CStr::from_ptr(var.key) }.to_str() else {
        return false;
    };
    match ctx.variable(key) {
        Some(value) => {
            var.value = value.as_ptr();
            true
        }
        None => {
            tracing::trace!("core asked for unset variable {key}");
            false
        }
    }
}

unsafe fn set_hw_render(ctx: &mut SessionContext, data: *mut c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let cb = unsafe { &mut *(data as *mut abi::RetroHwRenderCallback) };

    if ctx.hw_render.is_some() {
        tracing::warn!("hardware context already negotiated, rejecting renegotiation");
        return false;
    }
    let supported = ctx.preferred_hw_context;
    let requested = match HwContextType::from_abi(cb.context_type) {
        Some(requested) => requested,
        None => {
            tracing::warn!(
                "core requested unsupported hardware context type {}",
                cb.context_type
            );
            return false;
        }
    };
    if requested == HwContextType::None || requested != supported {
        tracing::warn!(
            "hardware render negotiation rejected: core wants {requested}, host offers {supported}"
        );
        return false;
    }

    // Host policy decides the ancillary buffers, whatever the core asked.
    cb.depth = ctx.hw_depth;
    cb.stencil = ctx.hw_stencil;
    cb.debug_context = ctx.hw_debug;
    cb.get_current_framebuffer = Some(hw_get_current_framebuffer);
    cb.get_proc_address = Some(hw_get_proc_address);

    let params = HwRenderParams {
        context_type: requested,
        version_major: cb.version_major,
        version_minor: cb.version_minor,
        depth: cb.depth,
        stencil: cb.stencil,
        bottom_left_origin: cb.bottom_left_origin,
        debug_context: cb.debug_context,
        context_reset: cb.context_reset,
        context_destroy: cb.context_destroy,
    };
    tracing::info!(
        "hardware render negotiated: {} {}.{}",
        requested,
        params.version_major,
        params.version_minor
    );
    ctx.hw_render = Some(params);
    true
}

unsafe fn set_minimum_audio_latency(ctx: &mut SessionContext, data: *mut c_void) -> bool {
    if data.is_null() {
        return false;
    }
    let ms = unsafe { *(data as *const c_uint) };
    tracing::debug!("core requests minimum audio latency of {ms} ms");
    ctx.minimum_audio_latency_ms = Some(ms);
    true
}

/// Software frames only; the default framebuffer is handle 0.
extern "C" fn hw_get_current_framebuffer() -> usize {
    0
}

/// Headless sessions have no GL/Vulkan loader to forward to.
extern "C" fn hw_get_proc_address(_sym: *const c_char) -> Option<abi::ProcAddressFn> {
    None
}
