//! or-bridge: the callback layer between a running libretro core and the
//! frontend.
//!
//! Cores call back into the frontend synchronously and carry no userdata
//! pointer, so this crate owns a process-wide [`SessionContext`] slot plus
//! the `extern "C"` trampolines the runtime registers with the core:
//!
//! - [`env::environment_callback`] answers environment commands
//! - [`video::video_refresh_callback`] converts frames to RGBA8888
//! - [`audio::audio_sample_callback`] / [`audio::audio_sample_batch_callback`]
//!   accumulate interleaved stereo
//! - [`input::input_poll_callback`] / [`input::input_state_callback`] latch
//!   and answer controller state
//!
//! Converted output leaves through the [`sink`] traits; the runtime drains
//! them once per `retro_run`.

pub mod audio;
pub mod context;
pub mod env;
pub mod input;
pub mod log;
pub mod sink;
pub mod video;

pub use audio::AudioBuffer;
pub use context::{
    clear_session, install_session, is_session_active, with_session, HwRenderParams,
    SessionContext,
};
pub use env::EnvCommand;
pub use input::{InputSnapshot, JoypadButtons, PortInput, MAX_PORTS};
pub use sink::{
    AudioSink, CollectingAudioSink, CollectingVideoSink, InputSource, NullAudioSink,
    NullInputSource, NullVideoSink, StaticInputSource, VideoSink,
};
pub use video::{VideoBuffer, VideoFrame};
