use std::time::{Duration, Instant};

use feed::{BoxedTimeSource, FixedTimeSource, SystemTimeSource};

/// High-level behaviour requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RenderPolicy {
    /// Run the render loop continuously, optionally clamping the frame rate.
    Animate {
        /// Optional requested frames-per-second cap.
        target_fps: Option<f32>,
    },
    /// Hold time at a fixed timestamp and only redraw when the surface changes.
    Still {
        /// Timestamp (seconds) fed to `_MyTime`.
        time: f32,
    },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

/// Builds a time source suited to the requested render policy.
pub fn time_source_for_policy(policy: &RenderPolicy) -> BoxedTimeSource {
    match policy {
        RenderPolicy::Animate { .. } => Box::new(SystemTimeSource::new()),
        RenderPolicy::Still { time } => Box::new(FixedTimeSource::new(*time)),
    }
}

/// Decides when the window loop should request the next redraw.
#[derive(Debug, Clone)]
pub(crate) struct FrameScheduler {
    policy: RenderPolicy,
    interval: Option<Duration>,
    last_render: Option<Instant>,
    dirty: bool,
}

impl FrameScheduler {
    pub fn new(policy: RenderPolicy) -> Self {
        let interval = match policy {
            RenderPolicy::Animate {
                target_fps: Some(fps),
            } if fps > 0.0 => match Duration::try_from_secs_f32(1.0 / fps) {
                Ok(interval) => Some(interval),
                Err(_) => {
                    tracing::warn!(fps, "fps cap cannot be paced; running uncapped");
                    None
                }
            },
            _ => None,
        };
        Self {
            policy,
            interval,
            last_render: None,
            dirty: true,
        }
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match self.policy {
            RenderPolicy::Still { .. } => self.dirty,
            RenderPolicy::Animate { .. } => match (self.interval, self.last_render) {
                (Some(interval), Some(last)) => now.saturating_duration_since(last) >= interval,
                _ => true,
            },
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.policy {
            RenderPolicy::Still { .. } => None,
            RenderPolicy::Animate { .. } => {
                let interval = self.interval?;
                self.last_render.map(|last| last + interval)
            }
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_render = Some(now);
        self.dirty = false;
    }

    /// Forces a redraw on the next opportunity, e.g. after a resize.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncapped_animation_is_always_ready() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::default());
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert!(scheduler.next_deadline().is_none());
    }

    #[test]
    fn capped_animation_waits_for_interval() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Animate {
            target_fps: Some(10.0),
        });
        let start = Instant::now();
        scheduler.mark_rendered(start);

        assert!(!scheduler.ready_for_frame(start + Duration::from_millis(50)));
        assert!(scheduler.ready_for_frame(start + Duration::from_millis(101)));
        let deadline = scheduler.next_deadline().unwrap();
        assert!(deadline >= start + Duration::from_millis(99));
    }

    #[test]
    fn zero_fps_means_uncapped() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Animate {
            target_fps: Some(0.0),
        });
        let now = Instant::now();
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
    }

    #[test]
    fn tiny_fps_cap_runs_uncapped() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Animate {
            target_fps: Some(1e-30),
        });
        let now = Instant::now();
        scheduler.mark_rendered(now);
        assert!(scheduler.ready_for_frame(now));
        assert!(scheduler.next_deadline().is_none());
    }

    #[test]
    fn still_policy_redraws_only_when_invalidated() {
        let mut scheduler = FrameScheduler::new(RenderPolicy::Still { time: 12.5 });
        let now = Instant::now();
        assert!(scheduler.ready_for_frame(now));
        scheduler.mark_rendered(now);
        assert!(!scheduler.ready_for_frame(now + Duration::from_secs(5)));
        scheduler.invalidate();
        assert!(scheduler.ready_for_frame(now));
    }

    #[test]
    fn still_policy_uses_fixed_time() {
        let mut source = time_source_for_policy(&RenderPolicy::Still { time: 12.5 });
        assert_eq!(source.sample().seconds, 12.5);
        assert_eq!(source.sample().seconds, 12.5);
    }
}
