use material::{MaterialHandle, ParameterSink, RESOLUTION_PARAMETER, TIME_PARAMETER};

use crate::lifecycle::{Component, FrameContext, Viewport};

/// Pushes elapsed time and viewport resolution into a material every frame.
///
/// The target is assigned by whoever owns the material; the updater only
/// holds a reference to it. With no target assigned an update is a silent
/// no-op. With one, each update performs exactly two writes:
///
/// * `"_MyTime"` ← `time`
/// * `"_Resolution"` ← `(width, height, 0, 0)`
///
/// As a [`Component`] it runs in every host phase, including design-time
/// preview.
#[derive(Debug, Clone)]
pub struct ShadertoyUpdater<S = MaterialHandle> {
    target: Option<S>,
}

impl<S> ShadertoyUpdater<S> {
    pub fn new() -> Self {
        Self { target: None }
    }

    pub fn with_target(target: S) -> Self {
        Self {
            target: Some(target),
        }
    }

    pub fn set_target(&mut self, target: Option<S>) {
        self.target = target;
    }

    pub fn clear_target(&mut self) -> Option<S> {
        self.target.take()
    }

    pub fn target(&self) -> Option<&S> {
        self.target.as_ref()
    }

    pub fn has_target(&self) -> bool {
        self.target.is_some()
    }
}

impl<S: ParameterSink> ShadertoyUpdater<S> {
    pub fn update(&mut self, time: f32, viewport: Viewport) {
        let Some(target) = self.target.as_mut() else {
            return;
        };
        target.set_float(TIME_PARAMETER, time);
        target.set_vector(RESOLUTION_PARAMETER, viewport.resolution());
    }
}

impl<S> Default for ShadertoyUpdater<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: ParameterSink> Component for ShadertoyUpdater<S> {
    fn name(&self) -> &str {
        "shadertoy-updater"
    }

    fn execute_always(&self) -> bool {
        true
    }

    fn update(&mut self, frame: &FrameContext) {
        ShadertoyUpdater::update(self, frame.time, frame.viewport);
    }
}
