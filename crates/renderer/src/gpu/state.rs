use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use material::{Material, MaterialError, UniformLayout};
use tracing::debug;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::context::{AdapterProfile, GpuContext};
use super::pipeline::ShaderPipeline;

#[derive(Debug)]
pub enum RenderFrameError {
    Surface(wgpu::SurfaceError),
    Material(MaterialError),
}

impl RenderFrameError {
    pub fn as_surface_error(&self) -> Option<&wgpu::SurfaceError> {
        match self {
            RenderFrameError::Surface(err) => Some(err),
            _ => None,
        }
    }
}

impl From<wgpu::SurfaceError> for RenderFrameError {
    fn from(value: wgpu::SurfaceError) -> Self {
        RenderFrameError::Surface(value)
    }
}

impl From<MaterialError> for RenderFrameError {
    fn from(value: MaterialError) -> Self {
        RenderFrameError::Material(value)
    }
}

impl fmt::Display for RenderFrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderFrameError::Surface(err) => write!(f, "surface error: {err:?}"),
            RenderFrameError::Material(err) => write!(f, "material cannot be uploaded: {err}"),
        }
    }
}

impl std::error::Error for RenderFrameError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderFrameError::Surface(err) => Some(err),
            RenderFrameError::Material(err) => Some(err),
        }
    }
}

/// GPU resources for the preview: surface, one pipeline, and the uniform
/// buffer the material is uploaded into every frame.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: ShaderPipeline,
    layout: UniformLayout,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    block: Vec<u8>,
    frame_count: u64,
    frames_since_last_update: u32,
    last_fps_update: Instant,
}

impl GpuState {
    pub(crate) fn new(
        window: Arc<Window>,
        size: PhysicalSize<u32>,
        shader_code: &str,
    ) -> Result<Self> {
        let context = GpuContext::new(window, size)?;
        let layout = UniformLayout::shadertoy();
        let block_size = layout.size() as u64;

        let pipeline = ShaderPipeline::new(
            &context.device,
            context.surface_format,
            shader_code,
            block_size,
        )?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("uniform buffer"),
            size: block_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        Ok(Self {
            block: vec![0u8; layout.size()],
            context,
            pipeline,
            layout,
            uniform_buffer,
            uniform_bind_group,
            frame_count: 0,
            frames_since_last_update: 0,
            last_fps_update: Instant::now(),
        })
    }

    pub(crate) fn adapter_profile(&self) -> &AdapterProfile {
        &self.context.adapter_profile
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.context.resize(new_size);
    }

    pub(crate) fn reconfigure(&mut self) {
        self.context.reconfigure();
    }

    /// Uploads the material's current parameters and draws one frame.
    ///
    /// The block is repacked from scratch each frame, so parameters the
    /// material has never received upload as zero.
    pub(crate) fn render(&mut self, material: &Material) -> Result<(), RenderFrameError> {
        self.block.fill(0);
        self.layout.pack_into(material, &mut self.block)?;
        self.context
            .queue
            .write_buffer(&self.uniform_buffer, 0, &self.block);

        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("render encoder"),
                });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("render pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.draw(0..3, 0..1);
        }

        self.context.queue.submit(Some(encoder.finish()));
        frame.present();
        self.record_frame(material);
        Ok(())
    }

    fn record_frame(&mut self, material: &Material) {
        self.frame_count += 1;
        self.frames_since_last_update += 1;
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(self.last_fps_update);
        if elapsed >= Duration::from_secs(1) {
            let fps = self.frames_since_last_update as f32 / elapsed.as_secs_f32();
            self.frames_since_last_update = 0;
            self.last_fps_update = now;
            debug!(
                fps = fps.round(),
                frame_count = self.frame_count,
                material = material.label(),
                revision = material.revision(),
                "render stats"
            );
        }
    }
}
