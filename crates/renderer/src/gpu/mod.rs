//! GPU side of the preview host.
//!
//! - `context` owns wgpu instance/device/surface wiring and reconfigures the
//!   swapchain when the window resizes.
//! - `pipeline` compiles the wrapped GLSL into a single render pipeline whose
//!   only binding is the fed uniform block.
//! - `state` packs the material into that block, uploads it, and draws.

mod context;
mod pipeline;
mod state;

pub(crate) use state::RenderFrameError;
pub(crate) use state::GpuState;
