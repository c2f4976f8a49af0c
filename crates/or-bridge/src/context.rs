//! Session context shared with the callback trampolines
//!
//! The libretro callbacks carry no userdata pointer, so everything a
//! trampoline needs lives in one process-wide slot. The runtime installs a
//! context before registering callbacks and clears it after deinit; at most
//! one core session exists per process.

use std::collections::BTreeMap;
use std::ffi::{CStr, CString};
use std::path::Path;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use or_abi as abi;
use or_core::{Config, FrontendError, HwContextType, PixelFormat, UsageError};

use crate::audio::AudioBuffer;
use crate::input::InputSnapshot;
use crate::sink::InputSource;
use crate::video::VideoBuffer;

/// Hardware-render parameters recorded when a SET_HW_RENDER negotiation
/// succeeds. The reset/destroy hooks are the core's own functions, to be
/// invoked when the host context comes and goes.
#[derive(Debug, Clone, Copy)]
pub struct HwRenderParams {
    pub context_type: HwContextType,
    pub version_major: u32,
    pub version_minor: u32,
    pub depth: bool,
    pub stencil: bool,
    pub bottom_left_origin: bool,
    pub debug_context: bool,
    pub context_reset: Option<abi::HwContextResetFn>,
    pub context_destroy: Option<abi::HwContextResetFn>,
}

/// Everything a live core session shares with the callback layer.
pub struct SessionContext {
    system_dir: CString,
    save_dir: CString,
    variables: BTreeMap<String, CString>,

    /// Format the core declared through SET_PIXEL_FORMAT. Defaults to
    /// [`PixelFormat::Unknown`], which reads as 0RGB1555.
    pub pixel_format: PixelFormat,

    /// Context type offered through GET_PREFERRED_HW_RENDER and accepted
    /// in SET_HW_RENDER negotiation.
    pub preferred_hw_context: HwContextType,
    pub hw_depth: bool,
    pub hw_stencil: bool,
    pub hw_debug: bool,
    pub hw_render: Option<HwRenderParams>,

    pub minimum_audio_latency_ms: Option<u32>,

    pub video: VideoBuffer,
    pub audio: AudioBuffer,
    pub input_source: Box<dyn InputSource>,
    pub input_snapshot: InputSnapshot,
}

impl SessionContext {
    /// Build a context from frontend configuration. Directory paths are
    /// handed to the core as C strings, so they must survive conversion.
    pub fn from_config(
        config: &Config,
        input_source: Box<dyn InputSource>,
    ) -> Result<Self, FrontendError> {
        let mut variables = BTreeMap::new();
        for (key, value) in &config.variables {
            variables.insert(key.clone(), string_to_c(value)?);
        }

        Ok(Self {
            system_dir: path_to_c(&config.paths.system_dir)?,
            save_dir: path_to_c(&config.paths.save_dir)?,
            variables,
            pixel_format: PixelFormat::Unknown,
            preferred_hw_context: config.video.preferred_hw_context,
            hw_depth: config.video.hw_depth,
            hw_stencil: config.video.hw_stencil,
            hw_debug: config.video.hw_debug,
            hw_render: None,
            minimum_audio_latency_ms: None,
            video: VideoBuffer::new(),
            audio: AudioBuffer::new(),
            input_source,
            input_snapshot: InputSnapshot::default(),
        })
    }

    /// System directory as a C string whose pointer stays valid for the
    /// whole session.
    pub fn system_dir(&self) -> &CStr {
        &self.system_dir
    }

    /// Save directory, same lifetime guarantee as [`Self::system_dir`].
    pub fn save_dir(&self) -> &CStr {
        &self.save_dir
    }

    /// Look up a core option value. The pointer stays valid for the whole
    /// session; variables never change while a core runs.
    pub fn variable(&self, key: &str) -> Option<&CStr> {
        self.variables.get(key).map(CString::as_c_str)
    }
}

fn path_to_c(path: &Path) -> Result<CString, FrontendError> {
    CString::new(path.to_string_lossy().into_owned())
        .map_err(|_| FrontendError::Config(format!("path contains NUL: {}", path.display())))
}

fn string_to_c(value: &str) -> Result<CString, FrontendError> {
    CString::new(value)
        .map_err(|_| FrontendError::Config(format!("variable value contains NUL: {value}")))
}

/// The process-wide session slot. Trampolines lock it on every callback;
/// the runtime must never call into the core while holding it.
static SESSION: Lazy<RwLock<Option<SessionContext>>> = Lazy::new(|| RwLock::new(None));

/// Install the context for a new session. Fails if one is already active.
pub fn install_session(ctx: SessionContext) -> Result<(), FrontendError> {
    let mut guard = SESSION.write();
    if guard.is_some() {
        return Err(UsageError::SessionAlreadyActive.into());
    }
    *guard = Some(ctx);
    Ok(())
}

/// Tear down the session slot. Idempotent.
pub fn clear_session() {
    let mut guard = SESSION.write();
    *guard = None;
}

pub fn is_session_active() -> bool {
    SESSION.read().is_some()
}

/// Run `f` against the active context, or return `None` when no session
/// is installed. Callbacks arriving outside a session fall through to
/// their documented defaults this way.
pub fn with_session<R>(f: impl FnOnce(&mut SessionContext) -> R) -> Option<R> {
    let mut guard = SESSION.write();
    guard.as_mut().map(f)
}
