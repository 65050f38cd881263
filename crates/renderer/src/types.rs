use std::path::PathBuf;

use feed::HostPhase;

use crate::runtime::RenderPolicy;

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors CLI flags and tells the renderer which shader to
/// compile, how large the preview window should be, and how the uniform feed
/// is wired.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// `mainImage` fragment shader on disk; `None` renders the bundled plasma.
    pub shader_source: Option<PathBuf>,
    /// Animate with the system clock or hold a still timestamp.
    pub policy: RenderPolicy,
    /// Phase the component host reports to its components.
    pub phase: HostPhase,
    /// When false the updater runs without a target and the material is never written.
    pub bind_material: bool,
    /// Label of the material the preview owns.
    pub material_label: String,
}

impl Default for RendererConfig {
    /// Provides a 1280x720 animated preview of the bundled shader.
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            shader_source: None,
            policy: RenderPolicy::default(),
            phase: HostPhase::default(),
            bind_material: true,
            material_label: "preview".to_string(),
        }
    }
}
