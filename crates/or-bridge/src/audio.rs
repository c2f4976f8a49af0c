//! Audio sample bridge
//!
//! Cores emit signed 16-bit stereo either one frame at a time or in batches.
//! Both callbacks land in the same interleaved accumulator, which the
//! session drains once per `retro_run`.

use crate::context;

/// Interleaved stereo accumulator fed by both audio callbacks.
#[derive(Debug, Default)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    total_frames: u64,
}

impl AudioBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single left/right frame.
    pub fn push_sample(&mut self, left: i16, right: i16) {
        self.samples.push(left);
        self.samples.push(right);
        self.total_frames += 1;
    }

    /// Append interleaved stereo samples. `samples.len()` must be even;
    /// returns the number of frames consumed.
    pub fn push_batch(&mut self, samples: &[i16]) -> usize {
        let frames = samples.len() / 2;
        self.samples.extend_from_slice(&samples[..frames * 2]);
        self.total_frames += frames as u64;
        frames
    }

    /// Take everything accumulated since the last drain.
    pub fn drain(&mut self) -> Vec<i16> {
        std::mem::take(&mut self.samples)
    }

    /// Frames currently buffered and not yet drained.
    pub fn pending_frames(&self) -> usize {
        self.samples.len() / 2
    }

    /// Frames pushed over the lifetime of the session.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }
}

/// Trampoline registered through `retro_set_audio_sample`.
///
/// # Safety
///
/// Only meant to be invoked by the core; safe on any input since the
/// samples arrive by value.
pub unsafe extern "C" fn audio_sample_callback(left: i16, right: i16) {
    let _ = context::with_session(|ctx| ctx.audio.push_sample(left, right));
}

/// Trampoline registered through `retro_set_audio_sample_batch`.
///
/// Copies the batch before returning; the core reclaims the buffer
/// immediately afterwards.
///
/// # Safety
///
/// `data` must point to `frames` interleaved stereo frames (two i16 each)
/// readable for the duration of the call, or be null.
pub unsafe extern "C" fn audio_sample_batch_callback(data: *const i16, frames: usize) -> usize {
    if data.is_null() || frames == 0 {
        return 0;
    }
    let samples = unsafe { std::slice::from_raw_parts(data, frames * 2) };
    context::with_session(|ctx| ctx.audio.push_batch(samples)).unwrap_or(0)
}
