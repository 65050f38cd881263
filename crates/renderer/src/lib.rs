//! Preview host for the toyfeed uniform feed.
//!
//! The renderer opens a window, owns a single material, and lets a
//! [`feed::ShadertoyUpdater`] write `_MyTime` and `_Resolution` into it every
//! frame. The material is then packed into a std140 block and uploaded to a
//! `wgpu` pipeline running a ShaderToy-style `mainImage` shader.
//!
//! ```text
//!   CLI / config
//!        │ RendererConfig
//!        ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!                        │                                   │
//!                        ├─ FrameDriver::advance ─▶ updater ─┤
//!                        │                          writes   ▼
//!                        └──────────────────────────────▶ Material ─▶ GPU UBO
//! ```

mod compile;
mod gpu;
mod runtime;
mod types;
mod window;

use std::fs;

use anyhow::{Context, Result};
use tracing::info;

pub use compile::DEFAULT_FRAGMENT;
pub use runtime::{time_source_for_policy, RenderPolicy};
pub use types::RendererConfig;

/// Entry point used by the CLI to open the preview.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Loads the shader, checks it can be wrapped, and runs the preview until
    /// the window closes. Blocks the calling thread.
    pub fn run(self) -> Result<()> {
        let shader_code = self.load_shader()?;
        compile::wrap_fragment(&shader_code)?;
        window::run_window(self.config, &shader_code)
    }

    fn load_shader(&self) -> Result<String> {
        match &self.config.shader_source {
            Some(path) => {
                info!(path = %path.display(), "loading fragment shader");
                fs::read_to_string(path)
                    .with_context(|| format!("failed to read shader at {}", path.display()))
            }
            None => {
                info!("no shader given; using bundled plasma");
                Ok(DEFAULT_FRAGMENT.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_config_loads_bundled_shader() {
        let renderer = Renderer::new(RendererConfig::default());
        assert_eq!(renderer.load_shader().unwrap(), DEFAULT_FRAGMENT);
    }

    #[test]
    fn missing_shader_file_reports_path() {
        let renderer = Renderer::new(RendererConfig {
            shader_source: Some(PathBuf::from("/nonexistent/toyfeed/shader.frag")),
            ..RendererConfig::default()
        });
        let err = renderer.load_shader().unwrap_err();
        assert!(format!("{err}").contains("/nonexistent/toyfeed/shader.frag"));
    }
}
