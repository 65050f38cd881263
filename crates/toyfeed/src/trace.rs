use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::{Context, Result};
use feed::{FrameDriver, ManualTimeSource, ShadertoyUpdater};
use material::{Material, MaterialHandle, ParamValue};
use serde::Serialize;

use crate::cli::{TraceArgs, DEFAULT_TRACE_STEP};
use crate::settings::{load_config, FeedSettings};

/// Everything the headless loop needs, resolved from flags and config.
#[derive(Debug, Clone, PartialEq)]
pub struct TracePlan {
    pub frames: u64,
    pub start: f32,
    pub step: f32,
    pub settings: FeedSettings,
}

impl TracePlan {
    pub fn from_args(args: &TraceArgs) -> Result<Self> {
        let config = load_config(args.feed.config.as_deref())?;
        let settings = FeedSettings::resolve(&args.feed, &config);

        // A still config pins the clock unless flags say otherwise.
        let still = config.still_time();
        let start = args.start.or(still).unwrap_or(0.0);
        let step = args
            .step
            .unwrap_or(if still.is_some() { 0.0 } else { DEFAULT_TRACE_STEP });

        Ok(Self {
            frames: args.frames,
            start,
            step,
            settings,
        })
    }
}

#[derive(Serialize)]
struct TraceLine<'a> {
    frame: u64,
    time: f32,
    revision: u64,
    parameters: BTreeMap<&'a str, ParamValue>,
}

pub fn trace(args: TraceArgs) -> Result<()> {
    let plan = TracePlan::from_args(&args)?;
    tracing::info!(
        frames = plan.frames,
        start = plan.start,
        step = plan.step,
        width = plan.settings.viewport.width,
        height = plan.settings.viewport.height,
        phase = ?plan.settings.phase,
        bound = plan.settings.bind_material,
        "tracing uniform feed"
    );
    let stdout = io::stdout();
    write_trace(&plan, stdout.lock())
}

/// Drives the feed for `plan.frames` frames, writing one JSON line each.
pub fn write_trace<W: Write>(plan: &TracePlan, mut out: W) -> Result<()> {
    let material = MaterialHandle::new(Material::new(plan.settings.material_label.clone()));
    let updater = if plan.settings.bind_material {
        ShadertoyUpdater::with_target(material.clone())
    } else {
        ShadertoyUpdater::new()
    };

    let mut driver = FrameDriver::with_source(ManualTimeSource::new(plan.start, plan.step));
    driver.attach(updater);

    for _ in 0..plan.frames {
        let (sample, report) = driver.advance(plan.settings.viewport, plan.settings.phase);
        tracing::trace!(
            frame = sample.frame_index,
            invoked = report.invoked,
            skipped = report.skipped,
            "frame advanced"
        );

        let current = material.borrow();
        let line = TraceLine {
            frame: sample.frame_index,
            time: sample.seconds,
            revision: current.revision(),
            parameters: current.parameters().collect(),
        };
        serde_json::to_writer(&mut out, &line).context("failed to encode trace line")?;
        writeln!(out).context("failed to write trace output")?;
    }

    out.flush().context("failed to flush trace output")
}

#[cfg(test)]
mod tests {
    use feed::{HostPhase, Viewport};
    use serde_json::{json, Value};

    use super::*;

    fn plan(bind_material: bool, phase: HostPhase) -> TracePlan {
        TracePlan {
            frames: 2,
            start: 12.5,
            step: 0.5,
            settings: FeedSettings {
                viewport: Viewport::new(1920, 1080),
                phase,
                bind_material,
                material_label: "trace".into(),
            },
        }
    }

    fn lines(plan: &TracePlan) -> Vec<Value> {
        let mut buffer = Vec::new();
        write_trace(plan, &mut buffer).unwrap();
        String::from_utf8(buffer)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn bound_trace_reports_fed_parameters() {
        let output = lines(&plan(true, HostPhase::Playing));
        assert_eq!(output.len(), 2);
        assert_eq!(
            output[0],
            json!({
                "frame": 0,
                "time": 12.5,
                "revision": 2,
                "parameters": {
                    "_MyTime": 12.5,
                    "_Resolution": [1920.0, 1080.0, 0.0, 0.0]
                }
            })
        );
        assert_eq!(output[1]["time"], json!(13.0));
        assert_eq!(output[1]["revision"], json!(4));
        assert_eq!(output[1]["parameters"]["_MyTime"], json!(13.0));
    }

    #[test]
    fn unbound_trace_leaves_parameters_empty() {
        let output = lines(&plan(false, HostPhase::Playing));
        for line in output {
            assert_eq!(line["revision"], json!(0));
            assert_eq!(line["parameters"], json!({}));
        }
    }

    #[test]
    fn editing_phase_still_feeds() {
        let output = lines(&plan(true, HostPhase::Editing));
        assert_eq!(output[1]["parameters"]["_MyTime"], json!(13.0));
    }

    #[test]
    fn zero_frames_writes_nothing() {
        let mut plan = plan(true, HostPhase::Playing);
        plan.frames = 0;
        let mut buffer = Vec::new();
        write_trace(&plan, &mut buffer).unwrap();
        assert!(buffer.is_empty());
    }
}
