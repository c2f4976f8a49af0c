//! Output sinks and input sources
//!
//! The bridge turns core callbacks into host-side data; these traits are
//! where that data leaves the bridge. Headless runs use the null
//! implementations, tests use the collecting ones, and a real frontend
//! plugs in its display, audio device and controller mapping here.

use crate::input::InputSnapshot;
use crate::video::VideoFrame;

/// Receives converted RGBA frames once per presented refresh.
pub trait VideoSink: Send {
    /// Core-reported geometry, delivered after game load and on changes.
    fn set_geometry(&mut self, width: u32, height: u32, aspect_ratio: f32);

    /// Present one frame. The borrow ends when this returns; keep a copy
    /// to hold onto the pixels.
    fn present(&mut self, frame: VideoFrame<'_>);
}

/// Receives drained audio once per run, interleaved stereo at the
/// core-reported sample rate.
pub trait AudioSink: Send {
    fn set_sample_rate(&mut self, rate: f64);

    /// Returns the number of frames accepted.
    fn append(&mut self, samples: &[i16]) -> usize;
}

/// Supplies controller state. Polled exactly once per `input_poll` from
/// the core's call stack, so implementations must not block.
pub trait InputSource: Send + Sync {
    fn poll(&mut self) -> InputSnapshot;
}

/// Discards every frame.
#[derive(Debug, Default)]
pub struct NullVideoSink;

impl VideoSink for NullVideoSink {
    fn set_geometry(&mut self, _width: u32, _height: u32, _aspect_ratio: f32) {}

    fn present(&mut self, _frame: VideoFrame<'_>) {}
}

/// Discards every sample while reporting them accepted.
#[derive(Debug, Default)]
pub struct NullAudioSink;

impl AudioSink for NullAudioSink {
    fn set_sample_rate(&mut self, _rate: f64) {}

    fn append(&mut self, samples: &[i16]) -> usize {
        samples.len() / 2
    }
}

/// Reports every control released.
#[derive(Debug, Default)]
pub struct NullInputSource;

impl InputSource for NullInputSource {
    fn poll(&mut self) -> InputSnapshot {
        InputSnapshot::default()
    }
}

/// Keeps the most recent frame and counts presentations. Used by the
/// integration tests and handy for headless capture.
#[derive(Debug, Default)]
pub struct CollectingVideoSink {
    pub presented: u64,
    pub width: u32,
    pub height: u32,
    pub last_frame: Vec<u8>,
}

impl VideoSink for CollectingVideoSink {
    fn set_geometry(&mut self, width: u32, height: u32, _aspect_ratio: f32) {
        self.width = width;
        self.height = height;
    }

    fn present(&mut self, frame: VideoFrame<'_>) {
        self.presented += 1;
        self.width = frame.width;
        self.height = frame.height;
        self.last_frame.clear();
        self.last_frame.extend_from_slice(frame.rgba);
    }
}

/// Accumulates everything appended.
#[derive(Debug, Default)]
pub struct CollectingAudioSink {
    pub sample_rate: f64,
    pub samples: Vec<i16>,
}

impl AudioSink for CollectingAudioSink {
    fn set_sample_rate(&mut self, rate: f64) {
        self.sample_rate = rate;
    }

    fn append(&mut self, samples: &[i16]) -> usize {
        self.samples.extend_from_slice(samples);
        samples.len() / 2
    }
}

/// Replays one fixed snapshot forever. Covers scripted and headless runs
/// where input never changes.
#[derive(Debug, Default)]
pub struct StaticInputSource {
    pub snapshot: InputSnapshot,
}

impl StaticInputSource {
    pub fn new(snapshot: InputSnapshot) -> Self {
        Self { snapshot }
    }
}

impl InputSource for StaticInputSource {
    fn poll(&mut self) -> InputSnapshot {
        self.snapshot
    }
}
