//! Video refresh bridge
//!
//! Cores hand the frontend one finished frame per `retro_run` through the
//! video refresh callback. The buffer is only valid for the duration of the
//! call, so everything is converted to packed RGBA8888 and copied into the
//! session before the callback returns.

use std::os::raw::{c_uint, c_void};

use or_abi as abi;
use or_core::PixelFormat;

use crate::context;

/// One converted frame, borrowed from the session's [`VideoBuffer`].
#[derive(Debug, Clone, Copy)]
pub struct VideoFrame<'a> {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8888 pixels, `width * height * 4` bytes.
    pub rgba: &'a [u8],
}

/// Holds the most recent frame in RGBA8888 along with refresh statistics.
///
/// Frame duplication (a null buffer pointer) leaves the stored pixels
/// untouched, so the previous frame remains presentable.
#[derive(Debug, Default)]
pub struct VideoBuffer {
    pixels: Vec<u32>,
    width: u32,
    height: u32,
    frames: u64,
    dupes: u64,
    hw_frames: u64,
}

impl VideoBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert and store one refresh from the core.
    ///
    /// A null `data` pointer counts as a duplicate frame. The hardware
    /// framebuffer sentinel counts separately and is never dereferenced;
    /// the frame lives inside the negotiated render context.
    ///
    /// # Safety
    ///
    /// A non-null, non-sentinel `data` must point to `height` rows of
    /// `pitch` bytes each, with at least `width` pixels of `format` data
    /// per row, readable for the duration of the call.
    pub unsafe fn bridge_frame(
        &mut self,
        format: PixelFormat,
        data: *const c_void,
        width: c_uint,
        height: c_uint,
        pitch: usize,
    ) {
        if data.is_null() {
            self.dupes += 1;
            return;
        }
        if data as usize == abi::HW_FRAME_BUFFER_VALID {
            self.hw_frames += 1;
            return;
        }

        let w = width as usize;
        let h = height as usize;
        self.pixels.resize(w * h, 0);
        self.width = width;
        self.height = height;

        let bpp = format.bytes_per_pixel();
        let base = data as *const u8;
        for y in 0..h {
            let row = unsafe { std::slice::from_raw_parts(base.add(y * pitch), w * bpp) };
            let dst = &mut self.pixels[y * w..(y + 1) * w];
            match format {
                PixelFormat::Xrgb8888 => convert_xrgb8888_row(row, dst),
                PixelFormat::Rgb565 => convert_rgb565_row(row, dst),
                PixelFormat::Xrgb1555 | PixelFormat::Unknown => convert_xrgb1555_row(row, dst),
            }
        }
        self.frames += 1;
    }

    /// Borrow the stored frame, if any refresh has delivered pixels yet.
    pub fn frame(&self) -> Option<VideoFrame<'_>> {
        if self.pixels.is_empty() {
            return None;
        }
        Some(VideoFrame {
            width: self.width,
            height: self.height,
            rgba: bytemuck::cast_slice(&self.pixels),
        })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Refreshes that delivered pixel data.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Refreshes with a null buffer (frame duplication).
    pub fn dupes(&self) -> u64 {
        self.dupes
    }

    /// Refreshes carrying the hardware framebuffer sentinel.
    pub fn hw_frames(&self) -> u64 {
        self.hw_frames
    }
}

/// Trampoline registered through `retro_set_video_refresh`.
///
/// The core may reuse or free the buffer as soon as this returns, so the
/// conversion copy happens here, under the session lock.
///
/// # Safety
///
/// Must only be invoked by a core honouring the video refresh contract:
/// `data` is null, the hardware sentinel, or a readable software buffer
/// described by `width`, `height` and `pitch`.
pub unsafe extern "C" fn video_refresh_callback(
    data: *const c_void,
    width: c_uint,
    height: c_uint,
    pitch: usize,
) {
    let _ = context::with_session(|ctx| {
        let format = ctx.pixel_format;
        unsafe { ctx.video.bridge_frame(format, data, width, height, pitch) };
    });
}

/// Pack one pixel so the in-memory byte order is `[r, g, b, a]` regardless
/// of host endianness.
#[inline]
fn pack_rgba(r: u8, g: u8, b: u8) -> u32 {
    u32::from_ne_bytes([r, g, b, 0xff])
}

/// Widen a 5-bit channel to 8 bits, mapping 31 to 255 exactly.
#[inline]
fn expand5(v: u8) -> u8 {
    (v << 3) | (v >> 2)
}

/// Widen a 6-bit channel to 8 bits, mapping 63 to 255 exactly.
#[inline]
fn expand6(v: u8) -> u8 {
    (v << 2) | (v >> 4)
}

fn convert_xrgb1555_row(src: &[u8], dst: &mut [u32]) {
    for (chunk, out) in src.chunks_exact(2).zip(dst.iter_mut()) {
        let p = u16::from_ne_bytes([chunk[0], chunk[1]]);
        let r = ((p >> 10) & 0x1f) as u8;
        let g = ((p >> 5) & 0x1f) as u8;
        let b = (p & 0x1f) as u8;
        *out = pack_rgba(expand5(r), expand5(g), expand5(b));
    }
}

fn convert_rgb565_row(src: &[u8], dst: &mut [u32]) {
    for (chunk, out) in src.chunks_exact(2).zip(dst.iter_mut()) {
        let p = u16::from_ne_bytes([chunk[0], chunk[1]]);
        let r = ((p >> 11) & 0x1f) as u8;
        let g = ((p >> 5) & 0x3f) as u8;
        let b = (p & 0x1f) as u8;
        *out = pack_rgba(expand5(r), expand6(g), expand5(b));
    }
}

fn convert_xrgb8888_row(src: &[u8], dst: &mut [u32]) {
    for (chunk, out) in src.chunks_exact(4).zip(dst.iter_mut()) {
        let p = u32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let r = ((p >> 16) & 0xff) as u8;
        let g = ((p >> 8) & 0xff) as u8;
        let b = (p & 0xff) as u8;
        *out = pack_rgba(r, g, b);
    }
}
