use serde::{Deserialize, Serialize};

/// Whether the host is running the scene or previewing it at design time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostPhase {
    #[default]
    #[serde(alias = "play")]
    Playing,
    #[serde(alias = "edit")]
    Editing,
}

/// Pixel dimensions of the current render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `(width, height, 0, 0)` widened to floats.
    ///
    /// The trailing components are reserved and always zero.
    pub fn resolution(&self) -> [f32; 4] {
        [self.width as f32, self.height as f32, 0.0, 0.0]
    }
}

/// Everything the host knows about the frame being ticked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameContext {
    pub time: f32,
    pub viewport: Viewport,
    pub phase: HostPhase,
}

impl FrameContext {
    pub fn new(time: f32, viewport: Viewport, phase: HostPhase) -> Self {
        Self {
            time,
            viewport,
            phase,
        }
    }
}

/// Per-frame callback driven by the host.
///
/// Components run once per tick while the host is playing. Components that
/// return `true` from [`Component::execute_always`] also run while the host
/// is in its editing phase.
pub trait Component {
    fn name(&self) -> &str;

    fn execute_always(&self) -> bool {
        false
    }

    fn update(&mut self, frame: &FrameContext);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub invoked: usize,
    pub skipped: usize,
}

/// Ordered set of components ticked synchronously, one call each per frame.
#[derive(Default)]
pub struct ComponentHost {
    components: Vec<Box<dyn Component>>,
}

impl ComponentHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach<C>(&mut self, component: C)
    where
        C: Component + 'static,
    {
        tracing::debug!(
            component = component.name(),
            execute_always = component.execute_always(),
            "attached component"
        );
        self.components.push(Box::new(component));
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn tick(&mut self, frame: &FrameContext) -> TickReport {
        let mut report = TickReport::default();
        for component in &mut self.components {
            let runs = match frame.phase {
                HostPhase::Playing => true,
                HostPhase::Editing => component.execute_always(),
            };
            if runs {
                component.update(frame);
                report.invoked += 1;
            } else {
                report.skipped += 1;
            }
        }
        tracing::trace!(
            time = frame.time,
            width = frame.viewport.width,
            height = frame.viewport.height,
            phase = ?frame.phase,
            invoked = report.invoked,
            skipped = report.skipped,
            "ticked components"
        );
        report
    }
}

impl std::fmt::Debug for ComponentHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentHost")
            .field(
                "components",
                &self
                    .components
                    .iter()
                    .map(|component| component.name())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
