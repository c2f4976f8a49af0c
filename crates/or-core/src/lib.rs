//! Shared foundation for the oxidized-retro frontend: error types,
//! configuration, and the host-side AV/identity data model.

pub mod av;
pub mod config;
pub mod error;

pub use av::{GeometryInfo, HwContextType, PixelFormat, SystemAvInfo, SystemInfo, TimingInfo};
pub use config::Config;
pub use error::{CoreError, FrontendError, LoadError, Result, UsageError};
