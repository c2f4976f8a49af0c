//! or-runtime: drives a loaded core through the libretro call order.
//!
//! [`CoreSession`] owns the one place core entry points get invoked from.
//! It tracks the lifecycle phase, rejects out-of-order calls before they
//! reach the core, installs the shared callback context, and drains the
//! bridge buffers into the host sinks after every frame.

pub mod session;

pub use session::{CoreSession, FrameStats, GameSource, LifecyclePhase};
