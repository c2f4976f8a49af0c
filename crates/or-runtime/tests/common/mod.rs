//! Shared test support: an in-process mock core.
//!
//! The mock implements all seventeen entry points as static `extern "C"`
//! functions backed by one process-wide state block, [`MockWorld`]. It
//! behaves like a tiny deterministic emulator: a frame counter advanced by
//! `retro_run`, 2x2 RGB565 frames derived from the counter (every fourth
//! refresh is a null-buffer dupe), three stereo audio frames per run, and
//! an 8-byte save state holding the counter. During `retro_init` and
//! `retro_load_game` it interrogates the environment callback the way real
//! cores do, recording every answer for assertions.
//!
//! The session context slot is process-global, so every test takes
//! [`TEST_LOCK`] and calls [`reset_mock`] first.

#![allow(dead_code)]

use std::ffi::CStr;
use std::mem::transmute;
use std::os::raw::{c_char, c_uint, c_void};
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};

use or_abi as abi;
use or_bridge::{AudioSink, NullInputSource, SessionContext, VideoFrame, VideoSink};
use or_core::Config;
use or_loader::{CoreSymbols, LoadedCore, RawEntryFn, SymbolSource};
use or_runtime::{CoreSession, GameSource};

/// Serializes tests that touch the process-wide session slot.
pub static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const FRAME_WIDTH: c_uint = 2;
const FRAME_HEIGHT: c_uint = 2;
/// Two RGB565 pixels per row plus four bytes of padding.
const FRAME_PITCH: usize = 8;

/// Game buffer pointer the mock retains across `retro_load_game`, stored
/// as an address so the state block stays `Send`.
pub struct RetainedGame {
    pub data_addr: usize,
    pub size: usize,
    pub checksum_at_load: u64,
}

/// Everything the mock core knows and everything it observed.
#[derive(Default)]
pub struct MockWorld {
    pub init_calls: u32,
    pub deinit_calls: u32,
    pub run_calls: u32,
    pub reset_calls: u32,
    pub load_calls: u32,
    pub unload_calls: u32,

    /// Make the next `retro_load_game` return false.
    pub reject_next_load: bool,
    /// Make the next `retro_serialize` return false.
    pub reject_next_serialize: bool,
    /// Report a zero serialize size, i.e. no save-state support.
    pub serialize_unsupported: bool,

    pub counter: u64,
    pub game: Option<RetainedGame>,
    pub checksum_at_run: Option<u64>,
    pub last_b_button: i16,

    // Environment answers observed by the core.
    pub can_dupe: Option<bool>,
    pub system_dir: Option<String>,
    pub save_dir: Option<String>,
    pub variable_value: Option<String>,
    pub variable_missing: bool,
    pub log_interface: bool,
    pub unknown_handled: Option<bool>,
    pub pixel_format_handled: Option<bool>,

    env: Option<abi::EnvironmentFn>,
    video: Option<abi::VideoRefreshFn>,
    audio: Option<abi::AudioSampleFn>,
    audio_batch: Option<abi::AudioSampleBatchFn>,
    input_poll: Option<abi::InputPollFn>,
    input_state: Option<abi::InputStateFn>,
}

static WORLD: Lazy<Mutex<MockWorld>> = Lazy::new(|| Mutex::new(MockWorld::default()));

/// Lock the mock state. Never hold the guard across a session call; the
/// mock takes the same lock from inside the core entry points.
pub fn world() -> MutexGuard<'static, MockWorld> {
    WORLD.lock()
}

/// Wipe all mock state. Every test starts with this.
pub fn reset_mock() {
    *WORLD.lock() = MockWorld::default();
}

/// FNV-1a, good enough to notice a freed or clobbered game buffer.
fn checksum(data: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    hash
}

/// RGB565 value of one mock pixel, a pure function of the frame counter.
fn pixel_at(counter: u64, x: usize, y: usize) -> u16 {
    ((counter as u16) << 8) ^ ((y as u16) << 5) ^ (x as u16)
}

/// One 2x2 frame with deliberately dirty row padding.
fn render_frame(counter: u64) -> [u8; FRAME_PITCH * FRAME_HEIGHT as usize] {
    let mut out = [0xAAu8; FRAME_PITCH * FRAME_HEIGHT as usize];
    for y in 0..FRAME_HEIGHT as usize {
        for x in 0..FRAME_WIDTH as usize {
            let offset = y * FRAME_PITCH + x * 2;
            out[offset..offset + 2].copy_from_slice(&pixel_at(counter, x, y).to_ne_bytes());
        }
    }
    out
}

unsafe fn call_env<T>(env: abi::EnvironmentFn, cmd: c_uint, payload: &mut T) -> bool {
    unsafe { env(cmd, payload as *mut T as *mut c_void) }
}

// ============================================================================
// Mock core entry points
// ============================================================================

unsafe extern "C" fn mock_set_environment(cb: abi::EnvironmentFn) {
    WORLD.lock().env = Some(cb);
}

unsafe extern "C" fn mock_set_video_refresh(cb: abi::VideoRefreshFn) {
    WORLD.lock().video = Some(cb);
}

unsafe extern "C" fn mock_set_audio_sample(cb: abi::AudioSampleFn) {
    WORLD.lock().audio = Some(cb);
}

unsafe extern "C" fn mock_set_audio_sample_batch(cb: abi::AudioSampleBatchFn) {
    WORLD.lock().audio_batch = Some(cb);
}

unsafe extern "C" fn mock_set_input_poll(cb: abi::InputPollFn) {
    WORLD.lock().input_poll = Some(cb);
}

unsafe extern "C" fn mock_set_input_state(cb: abi::InputStateFn) {
    WORLD.lock().input_state = Some(cb);
}

unsafe extern "C" fn mock_init() {
    let env = {
        let mut w = WORLD.lock();
        w.init_calls += 1;
        w.env
    };
    let Some(env) = env else { return };

    // Interrogate the frontend from inside init, like real cores do.
    let mut dupe = false;
    if unsafe { call_env(env, abi::ENVIRONMENT_GET_CAN_DUPE, &mut dupe) } {
        WORLD.lock().can_dupe = Some(dupe);
    }

    let mut dir: *const c_char = std::ptr::null();
    if unsafe { call_env(env, abi::ENVIRONMENT_GET_SYSTEM_DIRECTORY, &mut dir) } && !dir.is_null()
    {
        let path = unsafe { CStr::from_ptr(dir) }.to_string_lossy().into_owned();
        WORLD.lock().system_dir = Some(path);
    }

    let mut dir: *const c_char = std::ptr::null();
    if unsafe { call_env(env, abi::ENVIRONMENT_GET_SAVE_DIRECTORY, &mut dir) } && !dir.is_null() {
        let path = unsafe { CStr::from_ptr(dir) }.to_string_lossy().into_owned();
        WORLD.lock().save_dir = Some(path);
    }

    let mut log = abi::RetroLogCallback::default();
    if unsafe { call_env(env, abi::ENVIRONMENT_GET_LOG_INTERFACE, &mut log) } {
        if let Some(log_fn) = log.log {
            // One line through the variadic shim.
            unsafe {
                log_fn(
                    abi::LOG_INFO,
                    b"mock core %s up\n\0".as_ptr() as *const c_char,
                    b"0.9\0".as_ptr() as *const c_char,
                );
            }
        }
        WORLD.lock().log_interface = true;
    }

    let mut var = abi::RetroVariable {
        key: b"mock_speed\0".as_ptr() as *const c_char,
        value: std::ptr::null(),
    };
    if unsafe { call_env(env, abi::ENVIRONMENT_GET_VARIABLE, &mut var) } && !var.value.is_null() {
        let value = unsafe { CStr::from_ptr(var.value) }.to_string_lossy().into_owned();
        WORLD.lock().variable_value = Some(value);
    } else {
        WORLD.lock().variable_missing = true;
    }

    // A command code the frontend has never heard of; it must cope.
    let handled = unsafe { env(0x4242, std::ptr::null_mut()) };
    WORLD.lock().unknown_handled = Some(handled);
}

unsafe extern "C" fn mock_deinit() {
    WORLD.lock().deinit_calls += 1;
}

unsafe extern "C" fn mock_get_system_info(info: *mut abi::RetroSystemInfo) {
    if info.is_null() {
        return;
    }
    unsafe {
        (*info).library_name = b"mockcore\0".as_ptr() as *const c_char;
        (*info).library_version = b"0.9\0".as_ptr() as *const c_char;
        (*info).valid_extensions = b"bin|rom\0".as_ptr() as *const c_char;
        (*info).need_fullpath = false;
        (*info).block_extract = false;
    }
}

unsafe extern "C" fn mock_get_system_av_info(info: *mut abi::RetroSystemAvInfo) {
    if info.is_null() {
        return;
    }
    unsafe {
        (*info).geometry = abi::RetroGameGeometry {
            base_width: FRAME_WIDTH,
            base_height: FRAME_HEIGHT,
            max_width: FRAME_WIDTH,
            max_height: FRAME_HEIGHT,
            aspect_ratio: 4.0 / 3.0,
        };
        (*info).timing = abi::RetroSystemTiming {
            fps: 60.0,
            sample_rate: 32040.0,
        };
    }
}

unsafe extern "C" fn mock_load_game(game: *const abi::RetroGameInfo) -> bool {
    let (reject, env) = {
        let mut w = WORLD.lock();
        w.load_calls += 1;
        (std::mem::take(&mut w.reject_next_load), w.env)
    };
    if reject || game.is_null() {
        return false;
    }
    let game = unsafe { &*game };
    if game.data.is_null() || game.size == 0 {
        return false;
    }

    // Pixel format negotiation happens from inside load_game.
    if let Some(env) = env {
        let mut format = abi::PIXEL_FORMAT_RGB565;
        let handled = unsafe { call_env(env, abi::ENVIRONMENT_SET_PIXEL_FORMAT, &mut format) };
        WORLD.lock().pixel_format_handled = Some(handled);
    }

    let data = unsafe { std::slice::from_raw_parts(game.data as *const u8, game.size) };
    let mut w = WORLD.lock();
    w.game = Some(RetainedGame {
        data_addr: game.data as usize,
        size: game.size,
        checksum_at_load: checksum(data),
    });
    w.counter = 0;
    true
}

unsafe extern "C" fn mock_unload_game() {
    let mut w = WORLD.lock();
    w.unload_calls += 1;
    w.game = None;
}

unsafe extern "C" fn mock_run() {
    let (counter, retained, video, audio, audio_batch, input_poll, input_state) = {
        let mut w = WORLD.lock();
        w.run_calls += 1;
        w.counter += 1;
        (
            w.counter,
            w.game.as_ref().map(|g| (g.data_addr, g.size)),
            w.video,
            w.audio,
            w.audio_batch,
            w.input_poll,
            w.input_state,
        )
    };

    // Input: poll once, then query port 0 button B from the snapshot.
    if let (Some(poll), Some(state)) = (input_poll, input_state) {
        unsafe { poll() };
        let b = unsafe { state(0, abi::DEVICE_JOYPAD, 0, abi::DEVICE_ID_JOYPAD_B) };
        WORLD.lock().last_b_button = b;
    }

    // Re-hash the retained game buffer; the frontend promised it stays
    // valid until unload_game.
    if let Some((addr, size)) = retained {
        let data = unsafe { std::slice::from_raw_parts(addr as *const u8, size) };
        WORLD.lock().checksum_at_run = Some(checksum(data));
    }

    // Every fourth refresh is a null-buffer dupe.
    if let Some(video) = video {
        if counter % 4 == 0 {
            unsafe { video(std::ptr::null(), FRAME_WIDTH, FRAME_HEIGHT, FRAME_PITCH) };
        } else {
            let frame = render_frame(counter);
            unsafe {
                video(
                    frame.as_ptr() as *const c_void,
                    FRAME_WIDTH,
                    FRAME_HEIGHT,
                    FRAME_PITCH,
                );
            }
        }
    }

    // Three stereo frames per run: one single sample plus a batch of two.
    let base = counter as i16;
    if let Some(audio) = audio {
        unsafe { audio(base.wrapping_mul(3), base.wrapping_mul(-3)) };
    }
    if let Some(batch) = audio_batch {
        let samples: [i16; 4] = [
            base.wrapping_mul(5),
            base.wrapping_mul(-5),
            base.wrapping_mul(7),
            base.wrapping_mul(-7),
        ];
        unsafe { batch(samples.as_ptr(), 2) };
    }
}

unsafe extern "C" fn mock_reset() {
    let mut w = WORLD.lock();
    w.reset_calls += 1;
    w.counter = 0;
}

unsafe extern "C" fn mock_serialize_size() -> usize {
    if WORLD.lock().serialize_unsupported {
        0
    } else {
        8
    }
}

unsafe extern "C" fn mock_serialize(data: *mut c_void, size: usize) -> bool {
    let (reject, counter) = {
        let mut w = WORLD.lock();
        (std::mem::take(&mut w.reject_next_serialize), w.counter)
    };
    if reject || data.is_null() || size < 8 {
        return false;
    }
    unsafe {
        std::ptr::copy_nonoverlapping(counter.to_le_bytes().as_ptr(), data as *mut u8, 8);
    }
    true
}

unsafe extern "C" fn mock_unserialize(data: *const c_void, size: usize) -> bool {
    // Foreign or truncated buffers are the core's to refuse.
    if data.is_null() || size != 8 {
        return false;
    }
    let mut bytes = [0u8; 8];
    unsafe { std::ptr::copy_nonoverlapping(data as *const u8, bytes.as_mut_ptr(), 8) };
    WORLD.lock().counter = u64::from_le_bytes(bytes);
    true
}

// ============================================================================
// Binding the mock into a LoadedCore
// ============================================================================

struct MockSource;

impl SymbolSource for MockSource {
    fn lookup(&self, name: &'static str) -> Option<RawEntryFn> {
        // Erase each signature to the untyped entry type; bind casts back
        // per name, exactly as it does for dlsym results.
        unsafe {
            Some(match name {
                "retro_init" => transmute::<abi::RetroInitFn, RawEntryFn>(mock_init),
                "retro_deinit" => transmute::<abi::RetroDeinitFn, RawEntryFn>(mock_deinit),
                "retro_run" => transmute::<abi::RetroRunFn, RawEntryFn>(mock_run),
                "retro_reset" => transmute::<abi::RetroResetFn, RawEntryFn>(mock_reset),
                "retro_get_system_info" => {
                    transmute::<abi::RetroGetSystemInfoFn, RawEntryFn>(mock_get_system_info)
                }
                "retro_get_system_av_info" => {
                    transmute::<abi::RetroGetSystemAvInfoFn, RawEntryFn>(mock_get_system_av_info)
                }
                "retro_load_game" => transmute::<abi::RetroLoadGameFn, RawEntryFn>(mock_load_game),
                "retro_unload_game" => {
                    transmute::<abi::RetroUnloadGameFn, RawEntryFn>(mock_unload_game)
                }
                "retro_set_environment" => {
                    transmute::<abi::RetroSetEnvironmentFn, RawEntryFn>(mock_set_environment)
                }
                "retro_set_video_refresh" => {
                    transmute::<abi::RetroSetVideoRefreshFn, RawEntryFn>(mock_set_video_refresh)
                }
                "retro_set_audio_sample" => {
                    transmute::<abi::RetroSetAudioSampleFn, RawEntryFn>(mock_set_audio_sample)
                }
                "retro_set_audio_sample_batch" => transmute::<
                    abi::RetroSetAudioSampleBatchFn,
                    RawEntryFn,
                >(mock_set_audio_sample_batch),
                "retro_set_input_poll" => {
                    transmute::<abi::RetroSetInputPollFn, RawEntryFn>(mock_set_input_poll)
                }
                "retro_set_input_state" => {
                    transmute::<abi::RetroSetInputStateFn, RawEntryFn>(mock_set_input_state)
                }
                "retro_serialize" => transmute::<abi::RetroSerializeFn, RawEntryFn>(mock_serialize),
                "retro_serialize_size" => {
                    transmute::<abi::RetroSerializeSizeFn, RawEntryFn>(mock_serialize_size)
                }
                "retro_unserialize" => {
                    transmute::<abi::RetroUnserializeFn, RawEntryFn>(mock_unserialize)
                }
                _ => return None,
            })
        }
    }
}

/// Bind the mock through the real fail-closed table bind.
pub fn mock_core() -> LoadedCore {
    let symbols = CoreSymbols::bind(&MockSource).expect("mock source exports every symbol");
    LoadedCore::from_table(symbols, "mockcore")
}

// ============================================================================
// Host-side fixtures
// ============================================================================

/// Config with fixed directories, one core option, and throttling off.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.general.throttle = false;
    config.paths.system_dir = PathBuf::from("/tmp/or-mock/system");
    config.paths.save_dir = PathBuf::from("/tmp/or-mock/saves");
    config
        .variables
        .insert("mock_speed".to_string(), "turbo".to_string());
    config
}

pub fn context_for(config: &Config) -> SessionContext {
    SessionContext::from_config(config, Box::new(NullInputSource)).expect("context from config")
}

pub fn ready_context() -> SessionContext {
    context_for(&test_config())
}

/// 64 KiB dummy game image.
pub fn dummy_game() -> GameSource {
    GameSource {
        path: PathBuf::from("/tmp/mock-game.bin"),
        data: vec![0x5A; 64 * 1024],
        meta: None,
    }
}

/// Session driven through register/init/load against the mock core.
pub fn loaded_session(video: SharedVideoSink, audio: SharedAudioSink) -> CoreSession {
    let mut session = CoreSession::new(mock_core(), Box::new(video), Box::new(audio));
    session.register_callbacks(ready_context()).unwrap();
    session.init().unwrap();
    session.load_game(dummy_game()).unwrap();
    session
}

/// One frame as it reached the video sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Video sink whose captures outlive the session that owns it.
#[derive(Clone, Default)]
pub struct SharedVideoSink {
    pub frames: Arc<Mutex<Vec<CapturedFrame>>>,
}

impl VideoSink for SharedVideoSink {
    fn set_geometry(&mut self, _width: u32, _height: u32, _aspect_ratio: f32) {}

    fn present(&mut self, frame: VideoFrame<'_>) {
        self.frames.lock().push(CapturedFrame {
            width: frame.width,
            height: frame.height,
            rgba: frame.rgba.to_vec(),
        });
    }
}

/// Audio sink whose captures outlive the session that owns it.
#[derive(Clone, Default)]
pub struct SharedAudioSink {
    pub sample_rate: Arc<Mutex<f64>>,
    pub samples: Arc<Mutex<Vec<i16>>>,
}

impl AudioSink for SharedAudioSink {
    fn set_sample_rate(&mut self, rate: f64) {
        *self.sample_rate.lock() = rate;
    }

    fn append(&mut self, samples: &[i16]) -> usize {
        self.samples.lock().extend_from_slice(samples);
        samples.len() / 2
    }
}
