//! Per-frame uniform feed for Shadertoy-style shaders.
//!
//! The crate models the small slice of a game-engine lifecycle the feed needs:
//!
//! ```text
//!   TimeSource ──▶ FrameDriver::advance(viewport, phase)
//!                        │ FrameContext
//!                        ▼
//!                  ComponentHost::tick ──▶ ShadertoyUpdater::update
//!                                                 │ "_MyTime", "_Resolution"
//!                                                 ▼
//!                                          ParameterSink (material)
//! ```
//!
//! Nothing here queries a global clock or display; the host passes time and
//! viewport in.

mod driver;
mod lifecycle;
mod time;
mod updater;

pub use driver::FrameDriver;
pub use lifecycle::{Component, ComponentHost, FrameContext, HostPhase, TickReport, Viewport};
pub use time::{
    BoxedTimeSource, FixedTimeSource, ManualTimeSource, SystemTimeSource, TimeSample, TimeSource,
};
pub use updater::ShadertoyUpdater;
