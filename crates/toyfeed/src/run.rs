use anyhow::Result;
use feedconfig::FeedConfig;
use renderer::{RenderPolicy, Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::settings::{load_config, FeedSettings};

pub fn run(args: RunArgs) -> Result<()> {
    let config = load_config(args.feed.config.as_deref())?;
    let renderer_config = renderer_config(&args, &config);
    tracing::info!(
        shader = ?renderer_config.shader_source,
        width = renderer_config.surface_size.0,
        height = renderer_config.surface_size.1,
        policy = ?renderer_config.policy,
        "starting toyfeed preview"
    );
    Renderer::new(renderer_config).run()
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn renderer_config(args: &RunArgs, config: &FeedConfig) -> RendererConfig {
    let settings = FeedSettings::resolve(&args.feed, config);
    let config_dir = args
        .feed
        .config
        .as_deref()
        .and_then(|path| path.parent());
    let shader_source = args
        .shader
        .clone()
        .or_else(|| config.shader_path(config_dir));

    let policy = match args.still_time.or_else(|| config.still_time()) {
        Some(time) => RenderPolicy::Still { time },
        None => RenderPolicy::Animate {
            target_fps: args.fps.or(config.fps),
        },
    };

    RendererConfig {
        surface_size: (settings.viewport.width, settings.viewport.height),
        shader_source,
        policy,
        phase: settings.phase,
        bind_material: settings.bind_material,
        material_label: settings.material_label,
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use feed::HostPhase;

    use super::*;
    use crate::cli::FeedArgs;

    fn run_args() -> RunArgs {
        RunArgs {
            shader: None,
            feed: FeedArgs::default(),
            fps: None,
            still_time: None,
        }
    }

    #[test]
    fn defaults_animate_bundled_shader() {
        let config = renderer_config(&run_args(), &FeedConfig::default());
        assert_eq!(config.surface_size, (1280, 720));
        assert_eq!(config.shader_source, None);
        assert_eq!(config.policy, RenderPolicy::Animate { target_fps: None });
        assert_eq!(config.phase, HostPhase::Playing);
        assert!(config.bind_material);
    }

    #[test]
    fn config_shader_resolves_next_to_config_file() {
        let file = FeedConfig::from_toml_str(
            r#"
shader = "plasma.frag"
fps = 24

[time]
mode = "still"
still_time = "2s"
"#,
        )
        .unwrap();
        let mut args = run_args();
        args.feed.config = Some(PathBuf::from("/etc/toyfeed/toyfeed.toml"));

        let config = renderer_config(&args, &file);
        assert_eq!(
            config.shader_source.as_deref(),
            Some(Path::new("/etc/toyfeed/plasma.frag"))
        );
        assert_eq!(config.policy, RenderPolicy::Still { time: 2.0 });
    }

    #[test]
    fn flags_override_config_policy() {
        let file = FeedConfig::from_toml_str("fps = 24\nshader = \"a.frag\"").unwrap();
        let mut args = run_args();
        args.shader = Some(PathBuf::from("b.frag"));
        args.fps = Some(60.0);

        let config = renderer_config(&args, &file);
        assert_eq!(config.shader_source, Some(PathBuf::from("b.frag")));
        assert_eq!(
            config.policy,
            RenderPolicy::Animate {
                target_fps: Some(60.0)
            }
        );

        args.still_time = Some(12.5);
        let config = renderer_config(&args, &file);
        assert_eq!(config.policy, RenderPolicy::Still { time: 12.5 });
    }
}
