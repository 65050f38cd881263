use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use feedconfig::{parse_fps, parse_seconds, parse_surface_size};

/// Frame step used by `trace` when neither the CLI nor the config sets one.
pub const DEFAULT_TRACE_STEP: f32 = 1.0 / 60.0;

#[derive(Parser, Debug)]
#[command(
    name = "toyfeed",
    author,
    version,
    about = "Feeds _MyTime and _Resolution into a material every frame"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a preview window rendering a `mainImage` fragment shader.
    Run(RunArgs),
    /// Drive the feed headlessly and print one JSON object per frame.
    Trace(TraceArgs),
}

/// Flags shared by `run` and `trace`.
#[derive(Args, Debug, Clone, Default)]
pub struct FeedArgs {
    /// TOML configuration file; flags override its values.
    #[arg(long, value_name = "FILE", env = "TOYFEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Viewport size (e.g. `1920x1080`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_surface_size)]
    pub size: Option<(u32, u32)>,

    /// Run the host in the editing phase instead of playing.
    #[arg(long)]
    pub edit: bool,

    /// Leave the updater without a material so nothing is written.
    #[arg(long)]
    pub unbound: bool,

    /// Label for the material the host owns.
    #[arg(long, value_name = "LABEL")]
    pub material: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Fragment shader defining `mainImage`; the bundled plasma when omitted.
    #[arg(value_name = "SHADER")]
    pub shader: Option<PathBuf>,

    #[command(flatten)]
    pub feed: FeedArgs,

    /// Optional FPS cap for the preview (0=uncapped).
    #[arg(long, value_name = "FPS", value_parser = parse_fps)]
    pub fps: Option<f32>,

    /// Hold `_MyTime` at this timestamp (seconds or e.g. `1m 30s`).
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub still_time: Option<f32>,
}

#[derive(Args, Debug, Clone)]
pub struct TraceArgs {
    #[command(flatten)]
    pub feed: FeedArgs,

    /// Number of frames to drive.
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub frames: u64,

    /// Time of the first frame in seconds.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub start: Option<f32>,

    /// Seconds added per frame.
    #[arg(long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub step: Option<f32>,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from([
            "toyfeed",
            "run",
            "plasma.frag",
            "--size",
            "800x600",
            "--fps",
            "30",
            "--still-time",
            "12.5",
            "--edit",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        assert_eq!(args.shader, Some(PathBuf::from("plasma.frag")));
        assert_eq!(args.feed.size, Some((800, 600)));
        assert_eq!(args.fps, Some(30.0));
        assert_eq!(args.still_time, Some(12.5));
        assert!(args.feed.edit);
        assert!(!args.feed.unbound);
    }

    #[test]
    fn parses_trace_defaults() {
        let cli = Cli::try_parse_from(["toyfeed", "trace"]).unwrap();
        let Command::Trace(args) = cli.command else {
            panic!("expected trace command");
        };
        assert_eq!(args.frames, 3);
        assert_eq!(args.start, None);
        assert_eq!(args.step, None);
        assert_eq!(args.feed.size, None);
    }

    #[test]
    fn rejects_bad_size() {
        assert!(Cli::try_parse_from(["toyfeed", "trace", "--size", "wide"]).is_err());
        assert!(Cli::try_parse_from(["toyfeed", "trace", "--start", "-3"]).is_err());
    }

    #[test]
    fn rejects_fps_the_config_would_reject() {
        for fps in ["1e-30", "NaN", "fast"] {
            assert!(
                Cli::try_parse_from(["toyfeed", "run", "--fps", fps]).is_err(),
                "fps {fps}"
            );
        }
        assert!(Cli::try_parse_from(["toyfeed", "run", "--fps", "-5"]).is_err());
        assert!(Cli::try_parse_from(["toyfeed", "run", "--fps", "0"]).is_ok());
    }
}
