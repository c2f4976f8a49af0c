//! Host-side AV and identity types.
//!
//! Conversions from the raw ABI structs live here so everything above the
//! FFI boundary deals in owned Rust data.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame buffer encoding negotiated via SET_PIXEL_FORMAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// The core never negotiated a format. The video bridge interprets this
    /// as 0RGB1555, the ABI's documented default.
    #[default]
    Unknown,
    Xrgb1555,
    Xrgb8888,
    Rgb565,
}

impl PixelFormat {
    /// Decode the raw enum value carried by SET_PIXEL_FORMAT.
    pub fn from_abi(raw: u32) -> Option<Self> {
        match raw {
            or_abi::PIXEL_FORMAT_0RGB1555 => Some(Self::Xrgb1555),
            or_abi::PIXEL_FORMAT_XRGB8888 => Some(Self::Xrgb8888),
            or_abi::PIXEL_FORMAT_RGB565 => Some(Self::Rgb565),
            _ => None,
        }
    }

    /// Bytes per pixel when reading a core frame buffer in this format.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Unknown | Self::Xrgb1555 | Self::Rgb565 => 2,
            Self::Xrgb8888 => 4,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Xrgb1555 => write!(f, "0RGB1555"),
            Self::Xrgb8888 => write!(f, "XRGB8888"),
            Self::Rgb565 => write!(f, "RGB565"),
        }
    }
}

/// Graphics context type for hardware-render negotiation. Doubles as the
/// config-facing preference enum, which is why it is serde-serializable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum HwContextType {
    #[serde(rename = "none")]
    #[default]
    None,
    #[serde(rename = "opengl")]
    OpenGl,
    #[serde(rename = "opengl_core")]
    OpenGlCore,
    #[serde(rename = "opengles2")]
    OpenGlEs2,
    #[serde(rename = "opengles3")]
    OpenGlEs3,
    #[serde(rename = "vulkan")]
    Vulkan,
    #[serde(rename = "d3d11")]
    Direct3D11,
}

impl HwContextType {
    pub fn from_abi(raw: u32) -> Option<Self> {
        match raw {
            or_abi::HW_CONTEXT_NONE => Some(Self::None),
            or_abi::HW_CONTEXT_OPENGL => Some(Self::OpenGl),
            or_abi::HW_CONTEXT_OPENGL_CORE => Some(Self::OpenGlCore),
            or_abi::HW_CONTEXT_OPENGLES2 => Some(Self::OpenGlEs2),
            or_abi::HW_CONTEXT_OPENGLES3 => Some(Self::OpenGlEs3),
            or_abi::HW_CONTEXT_VULKAN => Some(Self::Vulkan),
            or_abi::HW_CONTEXT_D3D11 => Some(Self::Direct3D11),
            _ => None,
        }
    }

    pub fn to_abi(self) -> u32 {
        match self {
            Self::None => or_abi::HW_CONTEXT_NONE,
            Self::OpenGl => or_abi::HW_CONTEXT_OPENGL,
            Self::OpenGlCore => or_abi::HW_CONTEXT_OPENGL_CORE,
            Self::OpenGlEs2 => or_abi::HW_CONTEXT_OPENGLES2,
            Self::OpenGlEs3 => or_abi::HW_CONTEXT_OPENGLES3,
            Self::Vulkan => or_abi::HW_CONTEXT_VULKAN,
            Self::Direct3D11 => or_abi::HW_CONTEXT_D3D11,
        }
    }
}

impl fmt::Display for HwContextType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::OpenGl => write!(f, "opengl"),
            Self::OpenGlCore => write!(f, "opengl_core"),
            Self::OpenGlEs2 => write!(f, "opengles2"),
            Self::OpenGlEs3 => write!(f, "opengles3"),
            Self::Vulkan => write!(f, "vulkan"),
            Self::Direct3D11 => write!(f, "d3d11"),
        }
    }
}

/// Frame geometry reported by the core.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GeometryInfo {
    pub base_width: u32,
    pub base_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub aspect_ratio: f32,
}

/// Timing reported by the core.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimingInfo {
    pub fps: f64,
    pub sample_rate: f64,
}

/// AV parameters queried once after a game is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SystemAvInfo {
    pub geometry: GeometryInfo,
    pub timing: TimingInfo,
}

impl From<or_abi::RetroSystemAvInfo> for SystemAvInfo {
    fn from(raw: or_abi::RetroSystemAvInfo) -> Self {
        Self {
            geometry: GeometryInfo {
                base_width: raw.geometry.base_width,
                base_height: raw.geometry.base_height,
                max_width: raw.geometry.max_width,
                max_height: raw.geometry.max_height,
                aspect_ratio: raw.geometry.aspect_ratio,
            },
            timing: TimingInfo {
                fps: raw.timing.fps,
                sample_rate: raw.timing.sample_rate,
            },
        }
    }
}

/// Core identity, copied out of the core's static storage on query.
#[derive(Debug, Clone, Default)]
pub struct SystemInfo {
    pub library_name: String,
    pub library_version: String,
    pub valid_extensions: String,
    pub need_fullpath: bool,
    pub block_extract: bool,
}
