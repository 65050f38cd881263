use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use feed::{FrameDriver, HostPhase, ShadertoyUpdater, Viewport};
use material::{Material, MaterialHandle};
use tracing::{error, info, warn};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::{GpuState, RenderFrameError};
use crate::runtime::{time_source_for_policy, FrameScheduler, RenderPolicy};
use crate::types::RendererConfig;

const SOFTWARE_FPS_CAP: f32 = 15.0;

/// Preview window acting as the host for the uniform feed.
///
/// The window owns the material. The updater attached to the frame driver
/// only references it, and only when the config binds it.
pub(crate) struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    driver: FrameDriver,
    material: MaterialHandle,
    phase: HostPhase,
}

impl WindowState {
    pub(crate) fn new(
        window: Arc<Window>,
        config: &RendererConfig,
        shader_code: &str,
    ) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.clone(), size, shader_code)?;

        let material = MaterialHandle::new(Material::new(config.material_label.clone()));
        let mut updater = ShadertoyUpdater::new();
        if config.bind_material {
            updater.set_target(Some(material.clone()));
        } else {
            info!("material left unbound; shader uniforms will stay zero");
        }

        let mut driver = FrameDriver::new(time_source_for_policy(&config.policy));
        driver.attach(updater);

        Ok(Self {
            window,
            gpu,
            driver,
            material,
            phase: config.phase,
        })
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    fn viewport(&self) -> Viewport {
        let size = self.window.inner_size();
        Viewport::new(size.width, size.height)
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    pub(crate) fn render_frame(&mut self) -> Result<(), RenderFrameError> {
        let viewport = self.viewport();
        self.driver.advance(viewport, self.phase);
        let material = self.material.borrow();
        self.gpu.render(&material)
    }

    fn toggle_phase(&mut self) {
        self.phase = match self.phase {
            HostPhase::Playing => HostPhase::Editing,
            HostPhase::Editing => HostPhase::Playing,
        };
        info!(phase = ?self.phase, "host phase changed");
    }

    fn restart_clock(&mut self) {
        self.driver.reset();
        info!("clock restarted");
    }
}

enum KeyAction {
    Exit,
    TogglePhase,
    RestartClock,
}

fn key_action(event: &KeyEvent) -> Option<KeyAction> {
    if event.state != ElementState::Pressed || event.repeat {
        return None;
    }
    match &event.logical_key {
        Key::Named(NamedKey::Escape) => Some(KeyAction::Exit),
        Key::Named(NamedKey::Space) => Some(KeyAction::RestartClock),
        Key::Character(value) if value.as_str().eq_ignore_ascii_case("e") => {
            Some(KeyAction::TogglePhase)
        }
        _ => None,
    }
}

/// Opens the preview window and drives the feed until it closes.
///
/// Runs on the calling thread; winit requires that to be the main thread on
/// most platforms.
pub(crate) fn run_window(config: RendererConfig, shader_code: &str) -> Result<()> {
    let event_loop =
        EventLoop::new().map_err(|err| anyhow!("failed to create event loop: {err}"))?;

    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title("toyfeed preview")
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window, &config, shader_code)
        .map_err(|err| anyhow!("failed to initialise window renderer: {err:#}"))?;

    let mut policy = config.policy;
    let profile = state.gpu.adapter_profile().clone();
    if profile.is_software() && policy == (RenderPolicy::Animate { target_fps: None }) {
        policy = RenderPolicy::Animate {
            target_fps: Some(SOFTWARE_FPS_CAP),
        };
        warn!(
            adapter = %profile.name,
            backend = ?profile.backend,
            cap = SOFTWARE_FPS_CAP,
            "software rasterizer detected; capping preview FPS (override with --fps)"
        );
    }
    let mut scheduler = FrameScheduler::new(policy);
    info!(
        ?policy,
        phase = ?config.phase,
        bound = config.bind_material,
        "preview window ready"
    );
    state.window().request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event, .. } => match key_action(&event) {
                        Some(KeyAction::Exit) => elwt.exit(),
                        Some(KeyAction::TogglePhase) => {
                            state.toggle_phase();
                            scheduler.invalidate();
                            state.window().request_redraw();
                        }
                        Some(KeyAction::RestartClock) => {
                            state.restart_clock();
                            scheduler.invalidate();
                            state.window().request_redraw();
                        }
                        None => {}
                    },
                    WindowEvent::Resized(new_size) => {
                        state.resize(new_size);
                        scheduler.invalidate();
                        state.window().request_redraw();
                    }
                    WindowEvent::RedrawRequested => match state.render_frame() {
                        Ok(()) => scheduler.mark_rendered(Instant::now()),
                        Err(RenderFrameError::Material(err)) => {
                            warn!(error = %err, "skipping frame; material does not match uniform layout");
                            scheduler.mark_rendered(Instant::now());
                        }
                        Err(err) => match err.as_surface_error() {
                            Some(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                                state.gpu.reconfigure();
                            }
                            Some(wgpu::SurfaceError::OutOfMemory) => {
                                error!("surface out of memory; exiting preview");
                                elwt.exit();
                            }
                            Some(wgpu::SurfaceError::Timeout) => {
                                warn!("surface timeout; retrying next frame");
                            }
                            _ => {
                                warn!(error = %err, "surface error; retrying next frame");
                            }
                        },
                    },
                    _ => {}
                }
            }
            Event::AboutToWait => {
                let now = Instant::now();
                if scheduler.ready_for_frame(now) {
                    tracing::trace!("scheduler: issuing redraw now");
                    state.window().request_redraw();
                    elwt.set_control_flow(ControlFlow::Wait);
                } else if let Some(deadline) = scheduler.next_deadline() {
                    elwt.set_control_flow(ControlFlow::WaitUntil(deadline));
                } else {
                    elwt.set_control_flow(ControlFlow::Wait);
                }
            }
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
