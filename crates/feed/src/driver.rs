use crate::lifecycle::{Component, ComponentHost, FrameContext, HostPhase, TickReport, Viewport};
use crate::time::{BoxedTimeSource, TimeSample, TimeSource};

/// Couples a time source with a component host.
///
/// Each call to [`FrameDriver::advance`] samples the clock exactly once and
/// ticks every eligible component with the same [`FrameContext`].
pub struct FrameDriver {
    time_source: BoxedTimeSource,
    host: ComponentHost,
    last_sample: Option<TimeSample>,
}

impl FrameDriver {
    pub fn new(time_source: BoxedTimeSource) -> Self {
        Self {
            time_source,
            host: ComponentHost::new(),
            last_sample: None,
        }
    }

    pub fn with_source<T>(time_source: T) -> Self
    where
        T: TimeSource + 'static,
    {
        Self::new(Box::new(time_source))
    }

    pub fn attach<C>(&mut self, component: C)
    where
        C: Component + 'static,
    {
        self.host.attach(component);
    }

    pub fn last_sample(&self) -> Option<TimeSample> {
        self.last_sample
    }

    pub fn advance(&mut self, viewport: Viewport, phase: HostPhase) -> (TimeSample, TickReport) {
        let sample = self.time_source.sample();
        let frame = FrameContext::new(sample.seconds, viewport, phase);
        let report = self.host.tick(&frame);
        self.last_sample = Some(sample);
        (sample, report)
    }

    pub fn reset(&mut self) {
        self.time_source.reset();
        self.last_sample = None;
        tracing::debug!("frame driver reset");
    }
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("host", &self.host)
            .field("last_sample", &self.last_sample)
            .finish_non_exhaustive()
    }
}
