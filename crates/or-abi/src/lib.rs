//! Raw libretro ABI surface.
//!
//! Everything the core's shared object and the frontend agree on at the
//! binary level lives here: environment command codes, `#[repr(C)]` payload
//! structs, and the `extern "C"` function-pointer types for the callback
//! slots. No logic, no allocation; the other crates build safe wrappers on
//! top of these definitions.
//!
//! Layouts follow the C header of the wrapped ABI exactly. Nullable function
//! pointers are `Option<fn>` so that a null on the wire is representable
//! without undefined behavior.

use std::os::raw::{c_char, c_uint, c_void};

// ============================================================================
// Environment command codes
// ============================================================================

/// Flag bit marking a command code as experimental.
pub const ENVIRONMENT_EXPERIMENTAL: c_uint = 0x10000;

pub const ENVIRONMENT_GET_CAN_DUPE: c_uint = 3;
pub const ENVIRONMENT_GET_SYSTEM_DIRECTORY: c_uint = 9;
pub const ENVIRONMENT_SET_PIXEL_FORMAT: c_uint = 10;
pub const ENVIRONMENT_SET_HW_RENDER: c_uint = 14;
pub const ENVIRONMENT_GET_VARIABLE: c_uint = 15;
pub const ENVIRONMENT_GET_VARIABLE_UPDATE: c_uint = 17;
pub const ENVIRONMENT_GET_LOG_INTERFACE: c_uint = 27;
pub const ENVIRONMENT_GET_SAVE_DIRECTORY: c_uint = 31;
pub const ENVIRONMENT_SET_MEMORY_MAPS: c_uint = 36 | ENVIRONMENT_EXPERIMENTAL;
pub const ENVIRONMENT_SET_HW_RENDER_CONTEXT_NEGOTIATION_INTERFACE: c_uint =
    43 | ENVIRONMENT_EXPERIMENTAL;
pub const ENVIRONMENT_GET_PREFERRED_HW_RENDER: c_uint = 56;
pub const ENVIRONMENT_SET_MINIMUM_AUDIO_LATENCY: c_uint = 63 | ENVIRONMENT_EXPERIMENTAL;

// ============================================================================
// Pixel formats
// ============================================================================

pub const PIXEL_FORMAT_0RGB1555: c_uint = 0;
pub const PIXEL_FORMAT_XRGB8888: c_uint = 1;
pub const PIXEL_FORMAT_RGB565: c_uint = 2;

// ============================================================================
// Input devices and ids
// ============================================================================

pub const DEVICE_NONE: c_uint = 0;
pub const DEVICE_JOYPAD: c_uint = 1;
pub const DEVICE_MOUSE: c_uint = 2;
pub const DEVICE_KEYBOARD: c_uint = 3;
pub const DEVICE_LIGHTGUN: c_uint = 4;
pub const DEVICE_ANALOG: c_uint = 5;
pub const DEVICE_POINTER: c_uint = 6;

pub const DEVICE_ID_JOYPAD_B: c_uint = 0;
pub const DEVICE_ID_JOYPAD_Y: c_uint = 1;
pub const DEVICE_ID_JOYPAD_SELECT: c_uint = 2;
pub const DEVICE_ID_JOYPAD_START: c_uint = 3;
pub const DEVICE_ID_JOYPAD_UP: c_uint = 4;
pub const DEVICE_ID_JOYPAD_DOWN: c_uint = 5;
pub const DEVICE_ID_JOYPAD_LEFT: c_uint = 6;
pub const DEVICE_ID_JOYPAD_RIGHT: c_uint = 7;
pub const DEVICE_ID_JOYPAD_A: c_uint = 8;
pub const DEVICE_ID_JOYPAD_X: c_uint = 9;
pub const DEVICE_ID_JOYPAD_L: c_uint = 10;
pub const DEVICE_ID_JOYPAD_R: c_uint = 11;
pub const DEVICE_ID_JOYPAD_L2: c_uint = 12;
pub const DEVICE_ID_JOYPAD_R2: c_uint = 13;
pub const DEVICE_ID_JOYPAD_L3: c_uint = 14;
pub const DEVICE_ID_JOYPAD_R3: c_uint = 15;

pub const DEVICE_INDEX_ANALOG_LEFT: c_uint = 0;
pub const DEVICE_INDEX_ANALOG_RIGHT: c_uint = 1;
pub const DEVICE_INDEX_ANALOG_BUTTON: c_uint = 2;

pub const DEVICE_ID_ANALOG_X: c_uint = 0;
pub const DEVICE_ID_ANALOG_Y: c_uint = 1;

// ============================================================================
// Log levels
// ============================================================================

pub const LOG_DEBUG: c_uint = 0;
pub const LOG_INFO: c_uint = 1;
pub const LOG_WARN: c_uint = 2;
pub const LOG_ERROR: c_uint = 3;

// ============================================================================
// Hardware render context types
// ============================================================================

pub const HW_CONTEXT_NONE: c_uint = 0;
pub const HW_CONTEXT_OPENGL: c_uint = 1;
pub const HW_CONTEXT_OPENGLES2: c_uint = 2;
pub const HW_CONTEXT_OPENGL_CORE: c_uint = 3;
pub const HW_CONTEXT_OPENGLES3: c_uint = 4;
pub const HW_CONTEXT_OPENGLES_VERSION: c_uint = 5;
pub const HW_CONTEXT_VULKAN: c_uint = 6;
pub const HW_CONTEXT_D3D11: c_uint = 7;
pub const HW_CONTEXT_D3D10: c_uint = 8;
pub const HW_CONTEXT_D3D12: c_uint = 9;

/// Sentinel passed as the `video_refresh` data pointer when a hardware
/// rendering core has drawn the frame into the negotiated context instead of
/// a client-memory buffer. Defined as `(void *)-1` in the C header; must
/// never be dereferenced.
pub const HW_FRAME_BUFFER_VALID: usize = usize::MAX;

// ============================================================================
// Callback function types
// ============================================================================

/// Environment callback: the core asks the frontend a question or hands it a
/// negotiation payload. Returns whether the command was handled.
pub type EnvironmentFn = unsafe extern "C" fn(cmd: c_uint, data: *mut c_void) -> bool;

/// Video refresh: one frame of output. `data` may be null (duplicate the
/// previous frame) or [`HW_FRAME_BUFFER_VALID`]; `pitch` is in bytes.
pub type VideoRefreshFn =
    unsafe extern "C" fn(data: *const c_void, width: c_uint, height: c_uint, pitch: usize);

/// Single stereo sample pair.
pub type AudioSampleFn = unsafe extern "C" fn(left: i16, right: i16);

/// Batch of interleaved stereo frames; returns the number of frames consumed.
pub type AudioSampleBatchFn = unsafe extern "C" fn(data: *const i16, frames: usize) -> usize;

/// Tells the frontend to snapshot input state for the coming queries.
pub type InputPollFn = unsafe extern "C" fn();

/// Queries one digital or analog input value from the latest snapshot.
pub type InputStateFn =
    unsafe extern "C" fn(port: c_uint, device: c_uint, index: c_uint, id: c_uint) -> i16;

/// Printf-style logging sink handed to the core via GET_LOG_INTERFACE.
pub type LogPrintfFn = unsafe extern "C" fn(level: c_uint, fmt: *const c_char, ...);

/// Invoked when the negotiated hardware context is created or destroyed.
pub type HwContextResetFn = unsafe extern "C" fn();

/// Returns the handle of the framebuffer the core should render into.
pub type HwGetCurrentFramebufferFn = unsafe extern "C" fn() -> usize;

/// Generic function address as returned by a graphics-API symbol loader.
pub type ProcAddressFn = unsafe extern "C" fn();

/// Resolves a graphics-API symbol by name for the core.
pub type HwGetProcAddressFn =
    unsafe extern "C" fn(sym: *const c_char) -> Option<ProcAddressFn>;

// ============================================================================
// Payload structs
// ============================================================================

/// Static identity of a core, filled by `retro_get_system_info`. All strings
/// point into the core's own storage and stay valid while it is loaded.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RetroSystemInfo {
    pub library_name: *const c_char,
    pub library_version: *const c_char,
    pub valid_extensions: *const c_char,
    pub need_fullpath: bool,
    pub block_extract: bool,
}

impl Default for RetroSystemInfo {
    fn default() -> Self {
        Self {
            library_name: std::ptr::null(),
            library_version: std::ptr::null(),
            valid_extensions: std::ptr::null(),
            need_fullpath: false,
            block_extract: false,
        }
    }
}

/// Frame geometry reported by the core after a game is loaded.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroGameGeometry {
    pub base_width: c_uint,
    pub base_height: c_uint,
    pub max_width: c_uint,
    pub max_height: c_uint,
    pub aspect_ratio: f32,
}

/// Timing reported by the core after a game is loaded.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroSystemTiming {
    pub fps: f64,
    pub sample_rate: f64,
}

/// Combined AV parameters, filled by `retro_get_system_av_info`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroSystemAvInfo {
    pub geometry: RetroGameGeometry,
    pub timing: RetroSystemTiming,
}

/// Game image handed to `retro_load_game`. The frontend owns `path` and
/// `data`; the core may keep reading `data` until `retro_unload_game`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RetroGameInfo {
    pub path: *const c_char,
    pub data: *const c_void,
    pub size: usize,
    pub meta: *const c_char,
}

/// Key/value query for GET_VARIABLE. The core fills `key`; the frontend
/// points `value` at a string that outlives the call.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RetroVariable {
    pub key: *const c_char,
    pub value: *const c_char,
}

impl Default for RetroVariable {
    fn default() -> Self {
        Self {
            key: std::ptr::null(),
            value: std::ptr::null(),
        }
    }
}

/// Out-parameter for GET_LOG_INTERFACE.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct RetroLogCallback {
    pub log: Option<LogPrintfFn>,
}

/// Hardware-render negotiation payload for SET_HW_RENDER. The core fills the
/// request fields (context type, versions, `context_reset`/`context_destroy`,
/// flag wishes); the frontend answers by installing its framebuffer and
/// proc-address hooks and fixing the feature flags to its policy.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RetroHwRenderCallback {
    pub context_type: c_uint,
    pub context_reset: Option<HwContextResetFn>,
    pub get_current_framebuffer: Option<HwGetCurrentFramebufferFn>,
    pub get_proc_address: Option<HwGetProcAddressFn>,
    pub depth: bool,
    pub stencil: bool,
    pub bottom_left_origin: bool,
    pub version_major: c_uint,
    pub version_minor: c_uint,
    pub cache_context: bool,
    pub context_destroy: Option<HwContextResetFn>,
    pub debug_context: bool,
}

impl Default for RetroHwRenderCallback {
    fn default() -> Self {
        Self {
            context_type: HW_CONTEXT_NONE,
            context_reset: None,
            get_current_framebuffer: None,
            get_proc_address: None,
            depth: false,
            stencil: false,
            bottom_left_origin: false,
            version_major: 0,
            version_minor: 0,
            cache_context: false,
            context_destroy: None,
            debug_context: false,
        }
    }
}

// ============================================================================
// Core entry point signatures
// ============================================================================

pub type RetroInitFn = unsafe extern "C" fn();
pub type RetroDeinitFn = unsafe extern "C" fn();
pub type RetroRunFn = unsafe extern "C" fn();
pub type RetroResetFn = unsafe extern "C" fn();
pub type RetroGetSystemInfoFn = unsafe extern "C" fn(info: *mut RetroSystemInfo);
pub type RetroGetSystemAvInfoFn = unsafe extern "C" fn(info: *mut RetroSystemAvInfo);
pub type RetroLoadGameFn = unsafe extern "C" fn(game: *const RetroGameInfo) -> bool;
pub type RetroUnloadGameFn = unsafe extern "C" fn();
pub type RetroSerializeSizeFn = unsafe extern "C" fn() -> usize;
pub type RetroSerializeFn = unsafe extern "C" fn(data: *mut c_void, size: usize) -> bool;
pub type RetroUnserializeFn = unsafe extern "C" fn(data: *const c_void, size: usize) -> bool;
pub type RetroSetEnvironmentFn = unsafe extern "C" fn(cb: EnvironmentFn);
pub type RetroSetVideoRefreshFn = unsafe extern "C" fn(cb: VideoRefreshFn);
pub type RetroSetAudioSampleFn = unsafe extern "C" fn(cb: AudioSampleFn);
pub type RetroSetAudioSampleBatchFn = unsafe extern "C" fn(cb: AudioSampleBatchFn);
pub type RetroSetInputPollFn = unsafe extern "C" fn(cb: InputPollFn);
pub type RetroSetInputStateFn = unsafe extern "C" fn(cb: InputStateFn);
