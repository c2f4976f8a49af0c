//! Core session lifecycle
//!
//! [`CoreSession`] is the only place core entry points get invoked. Every
//! wrapper checks the current phase first and refuses out-of-order calls
//! before the core is touched, because the wrapped ABI makes misordered
//! calls undefined behavior rather than errors. The allowed order is
//!
//! ```text
//! Bound → CallbacksRegistered → Initialized → GameLoaded ⇄ Running
//!       → GameUnloaded → Deinitialized
//! ```
//!
//! with `reset`/`serialize`/`unserialize` available while a game is loaded.
//! Dropping the session performs whatever teardown is still outstanding, so
//! the library is never unmapped under a live core.

use std::ffi::CString;
use std::os::raw::c_void;
use std::path::{Path, PathBuf};

use or_abi as abi;
use or_bridge::{audio, context, env, input, video};
use or_bridge::{AudioSink, SessionContext, VideoSink};
use or_core::error::{CoreError, FrontendError, Result, UsageError};
use or_core::{SystemAvInfo, SystemInfo};
use or_loader::LoadedCore;

/// Where a session currently sits in the core call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Core is bound but no callbacks are registered yet.
    Bound,
    /// Callback trampolines are registered and the session context is live.
    CallbacksRegistered,
    /// `retro_init` has run; no game is loaded.
    Initialized,
    /// A game is loaded and `retro_run` has not been called yet.
    GameLoaded,
    /// At least one frame has run since the game was loaded.
    Running,
    /// The game is unloaded; only `retro_deinit` remains.
    GameUnloaded,
    /// `retro_deinit` has run; the core must not be entered again.
    Deinitialized,
}

impl LifecyclePhase {
    /// Phase name as it appears in out-of-order errors and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bound => "Bound",
            Self::CallbacksRegistered => "CallbacksRegistered",
            Self::Initialized => "Initialized",
            Self::GameLoaded => "GameLoaded",
            Self::Running => "Running",
            Self::GameUnloaded => "GameUnloaded",
            Self::Deinitialized => "Deinitialized",
        }
    }
}

/// A game image about to be handed to the core.
#[derive(Debug, Clone)]
pub struct GameSource {
    pub path: PathBuf,
    pub data: Vec<u8>,
    /// Free-form metadata string some cores read; usually absent.
    pub meta: Option<String>,
}

impl GameSource {
    /// Read the image at `path` into memory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            data,
            meta: None,
        })
    }
}

// Owned storage behind the RetroGameInfo pointers. The core may keep
// reading `data` until retro_unload_game, so this lives in the session for
// exactly that window. The heap buffers never move while held.
struct HeldGame {
    path: PathBuf,
    c_path: CString,
    data: Vec<u8>,
    meta: Option<CString>,
}

impl HeldGame {
    fn new(source: GameSource) -> Result<Self> {
        let c_path = CString::new(source.path.to_string_lossy().into_owned()).map_err(|_| {
            FrontendError::Config(format!("game path contains NUL: {}", source.path.display()))
        })?;
        let meta = match source.meta {
            Some(meta) => Some(CString::new(meta).map_err(|_| {
                FrontendError::Config("game meta contains NUL".to_string())
            })?),
            None => None,
        };
        Ok(Self {
            path: source.path,
            c_path,
            data: source.data,
            meta,
        })
    }

    fn as_retro_game_info(&self) -> abi::RetroGameInfo {
        abi::RetroGameInfo {
            path: self.c_path.as_ptr(),
            data: self.data.as_ptr() as *const c_void,
            size: self.data.len(),
            meta: self
                .meta
                .as_ref()
                .map_or(std::ptr::null(), |m| m.as_ptr()),
        }
    }
}

/// What the bridge layer saw during one `run_frame` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Video refreshes that delivered new pixels.
    pub refreshed: u64,
    /// Null-buffer refreshes (duplicate the previous frame).
    pub duplicated: u64,
    /// Refreshes carrying the hardware framebuffer sentinel.
    pub hw_frames: u64,
    /// Whether a frame reached the video sink this run.
    pub presented: bool,
    /// Stereo frames drained into the audio sink.
    pub audio_frames: usize,
}

/// Drives one loaded core through its lifecycle.
///
/// Owns the [`LoadedCore`], the output sinks, and the loaded game bytes.
/// The session context handed to [`CoreSession::register_callbacks`] is
/// installed process-wide for the trampolines; it is cleared again at
/// `deinit` (or on drop), which is also when a new session becomes
/// possible.
pub struct CoreSession {
    core: LoadedCore,
    phase: LifecyclePhase,
    av_info: Option<SystemAvInfo>,
    game: Option<HeldGame>,
    video_sink: Box<dyn VideoSink>,
    audio_sink: Box<dyn AudioSink>,
    frame_count: u64,
}

impl CoreSession {
    /// Wrap a bound core. The session starts in [`LifecyclePhase::Bound`];
    /// nothing has been called on the core yet.
    pub fn new(
        core: LoadedCore,
        video_sink: Box<dyn VideoSink>,
        audio_sink: Box<dyn AudioSink>,
    ) -> Self {
        tracing::debug!("session created for core {}", core.name());
        Self {
            core,
            phase: LifecyclePhase::Bound,
            av_info: None,
            game: None,
            video_sink,
            audio_sink,
            frame_count: 0,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    /// AV parameters cached at game load, if a game is loaded.
    pub fn av_info(&self) -> Option<SystemAvInfo> {
        self.av_info
    }

    /// Frames run since the session started.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Core identity. The ABI allows this query in any phase.
    pub fn system_info(&self) -> SystemInfo {
        self.core.system_info()
    }

    /// Install `ctx` as the process session context and register every
    /// callback trampoline with the core. Fails with
    /// [`UsageError::SessionAlreadyActive`] while another session holds the
    /// context slot.
    pub fn register_callbacks(&mut self, ctx: SessionContext) -> Result<()> {
        self.require("register_callbacks", &[LifecyclePhase::Bound])?;
        context::install_session(ctx)?;

        let syms = self.core.symbols();
        // Safety: the table is fully bound and the callbacks match the
        // signatures the ABI fixes for each setter. The core may start
        // issuing environment calls from inside these setters already.
        unsafe {
            (syms.set_environment)(env::environment_callback);
            (syms.set_video_refresh)(video::video_refresh_callback);
            (syms.set_audio_sample)(audio::audio_sample_callback);
            (syms.set_audio_sample_batch)(audio::audio_sample_batch_callback);
            (syms.set_input_poll)(input::input_poll_callback);
            (syms.set_input_state)(input::input_state_callback);
        }

        tracing::debug!("callbacks registered with core {}", self.core.name());
        self.phase = LifecyclePhase::CallbacksRegistered;
        Ok(())
    }

    /// Run `retro_init`. Callbacks must be registered first.
    pub fn init(&mut self) -> Result<()> {
        self.require("retro_init", &[LifecyclePhase::CallbacksRegistered])?;
        // Safety: phase order guarantees callbacks are registered, which is
        // all the ABI requires before init.
        unsafe { (self.core.symbols().init)() };
        tracing::info!("core {} initialized", self.core.name());
        self.phase = LifecyclePhase::Initialized;
        Ok(())
    }

    /// Hand `source` to `retro_load_game` and, on success, cache the
    /// core's AV parameters and push geometry/sample rate into the sinks.
    ///
    /// On rejection the session stays in [`LifecyclePhase::Initialized`],
    /// so a different image can be tried or teardown can proceed.
    pub fn load_game(&mut self, source: GameSource) -> Result<SystemAvInfo> {
        self.require("retro_load_game", &[LifecyclePhase::Initialized])?;

        let held = HeldGame::new(source)?;
        let info = held.as_retro_game_info();
        tracing::info!(
            "loading game {} ({} bytes)",
            held.path.display(),
            held.data.len()
        );

        // Safety: `info` and the buffers behind it outlive the call; on
        // success the buffers are kept in `self.game` until unload_game.
        let loaded = unsafe { (self.core.symbols().load_game)(&info) };
        if !loaded {
            tracing::warn!("core rejected game {}", held.path.display());
            return Err(CoreError::GameLoadFailed(held.path).into());
        }
        self.game = Some(held);

        let mut raw = abi::RetroSystemAvInfo::default();
        // Safety: valid only after a successful load_game, which is exactly
        // where we are; the out-pointer is live for the call.
        unsafe { (self.core.symbols().get_system_av_info)(&mut raw) };
        let av = SystemAvInfo::from(raw);
        tracing::info!(
            "core reports {}x{} (max {}x{}), {:.3} fps, {:.1} Hz audio",
            av.geometry.base_width,
            av.geometry.base_height,
            av.geometry.max_width,
            av.geometry.max_height,
            av.timing.fps,
            av.timing.sample_rate
        );

        self.video_sink.set_geometry(
            av.geometry.base_width,
            av.geometry.base_height,
            av.geometry.aspect_ratio,
        );
        self.audio_sink.set_sample_rate(av.timing.sample_rate);

        self.av_info = Some(av);
        self.phase = LifecyclePhase::GameLoaded;
        Ok(av)
    }

    /// Run exactly one frame. The core drives the callback trampolines
    /// synchronously from inside this call; afterwards the most recent
    /// frame is presented and the audio accumulator is drained into the
    /// sinks.
    pub fn run_frame(&mut self) -> Result<FrameStats> {
        self.require(
            "retro_run",
            &[LifecyclePhase::GameLoaded, LifecyclePhase::Running],
        )?;

        let (frames_before, dupes_before, hw_before) = context::with_session(|ctx| {
            (ctx.video.frames(), ctx.video.dupes(), ctx.video.hw_frames())
        })
        .unwrap_or_default();

        // Safety: phase order guarantees init and a successful load_game.
        // The session lock is not held here, so re-entrant callbacks can
        // take it.
        unsafe { (self.core.symbols().run)() };
        self.phase = LifecyclePhase::Running;
        self.frame_count += 1;

        let mut stats = FrameStats::default();
        let samples = context::with_session(|ctx| {
            stats.refreshed = ctx.video.frames() - frames_before;
            stats.duplicated = ctx.video.dupes() - dupes_before;
            stats.hw_frames = ctx.video.hw_frames() - hw_before;
            // Dupes re-present the previous frame; zero refreshes present
            // nothing.
            if stats.refreshed + stats.duplicated > 0 {
                if let Some(frame) = ctx.video.frame() {
                    self.video_sink.present(frame);
                    stats.presented = true;
                }
            }
            ctx.audio.drain()
        })
        .unwrap_or_default();
        stats.audio_frames = self.audio_sink.append(&samples);

        tracing::trace!(
            "frame {}: {} refreshes, {} dupes, {} audio frames",
            self.frame_count,
            stats.refreshed,
            stats.duplicated,
            stats.audio_frames
        );
        Ok(stats)
    }

    /// Run `retro_reset`. Available whenever a game is loaded.
    pub fn reset(&mut self) -> Result<()> {
        self.require(
            "retro_reset",
            &[LifecyclePhase::GameLoaded, LifecyclePhase::Running],
        )?;
        // Safety: a game is loaded, which is all reset requires.
        unsafe { (self.core.symbols().reset)() };
        tracing::info!("core reset");
        Ok(())
    }

    /// Size of a save state for the current game, in bytes. Zero means the
    /// core does not support save states for this game.
    pub fn serialize_size(&mut self) -> Result<usize> {
        self.require(
            "retro_serialize_size",
            &[LifecyclePhase::GameLoaded, LifecyclePhase::Running],
        )?;
        // Safety: a game is loaded.
        Ok(unsafe { (self.core.symbols().serialize_size)() })
    }

    /// Capture a save state into a fresh buffer of exactly
    /// `serialize_size()` bytes.
    pub fn serialize(&mut self) -> Result<Vec<u8>> {
        self.require(
            "retro_serialize",
            &[LifecyclePhase::GameLoaded, LifecyclePhase::Running],
        )?;

        // Safety (both calls): a game is loaded, and the buffer is writable
        // for the full reported size.
        let size = unsafe { (self.core.symbols().serialize_size)() };
        if size == 0 {
            return Err(CoreError::SaveStateUnsupported.into());
        }
        let mut buffer = vec![0u8; size];
        let ok = unsafe {
            (self.core.symbols().serialize)(buffer.as_mut_ptr() as *mut c_void, buffer.len())
        };
        if !ok {
            return Err(CoreError::SerializeFailed { size }.into());
        }
        tracing::debug!("serialized {size} byte save state");
        Ok(buffer)
    }

    /// Restore a save state. The core itself rejects buffers whose size or
    /// internal version does not match; that refusal is forwarded as
    /// [`CoreError::UnserializeRejected`].
    pub fn unserialize(&mut self, data: &[u8]) -> Result<()> {
        self.require(
            "retro_unserialize",
            &[LifecyclePhase::GameLoaded, LifecyclePhase::Running],
        )?;
        // Safety: a game is loaded and `data` is readable for its length.
        let ok = unsafe {
            (self.core.symbols().unserialize)(data.as_ptr() as *const c_void, data.len())
        };
        if !ok {
            return Err(CoreError::UnserializeRejected { size: data.len() }.into());
        }
        tracing::debug!("restored {} byte save state", data.len());
        Ok(())
    }

    /// Run `retro_unload_game` and release the held game bytes.
    pub fn unload_game(&mut self) -> Result<()> {
        self.require(
            "retro_unload_game",
            &[LifecyclePhase::GameLoaded, LifecyclePhase::Running],
        )?;
        // Safety: a game is loaded. After this returns the core may no
        // longer read the game buffer, so dropping it is sound.
        unsafe { (self.core.symbols().unload_game)() };
        self.game = None;
        self.av_info = None;
        tracing::info!("game unloaded after {} frames", self.frame_count);
        self.phase = LifecyclePhase::GameUnloaded;
        Ok(())
    }

    /// Run `retro_deinit` and clear the process session slot. Allowed from
    /// [`LifecyclePhase::Initialized`] too, for the teardown path where
    /// `load_game` failed and no game was ever loaded.
    pub fn deinit(&mut self) -> Result<()> {
        self.require(
            "retro_deinit",
            &[LifecyclePhase::Initialized, LifecyclePhase::GameUnloaded],
        )?;
        // Safety: init ran and no game is loaded.
        unsafe { (self.core.symbols().deinit)() };
        context::clear_session();
        tracing::info!("core {} deinitialized", self.core.name());
        self.phase = LifecyclePhase::Deinitialized;
        Ok(())
    }

    fn require(&self, operation: &'static str, allowed: &[LifecyclePhase]) -> Result<()> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(UsageError::OutOfOrderCall {
                operation,
                phase: self.phase.name(),
            }
            .into())
        }
    }
}

impl Drop for CoreSession {
    /// Finish the ordered teardown from whatever phase the session holds,
    /// so the library is never unmapped under a live core. Phases before
    /// init never call into the core here, because deinit without init is
    /// itself out of order.
    fn drop(&mut self) {
        let syms = *self.core.symbols();
        match self.phase {
            LifecyclePhase::GameLoaded | LifecyclePhase::Running => {
                tracing::debug!("session dropped with a game loaded, tearing down");
                // Safety: same preconditions as the explicit unload_game
                // and deinit paths, which this phase satisfies.
                unsafe {
                    (syms.unload_game)();
                    (syms.deinit)();
                }
                self.game = None;
                context::clear_session();
            }
            LifecyclePhase::GameUnloaded => {
                // Safety: init ran and the game is already unloaded.
                unsafe { (syms.deinit)() };
                context::clear_session();
            }
            LifecyclePhase::Initialized => {
                // Safety: init ran and no game is loaded.
                unsafe { (syms.deinit)() };
                context::clear_session();
            }
            LifecyclePhase::CallbacksRegistered => {
                // init never ran, so the core must not be entered; only the
                // context slot needs releasing.
                context::clear_session();
            }
            LifecyclePhase::Bound | LifecyclePhase::Deinitialized => {}
        }
    }
}
