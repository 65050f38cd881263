use std::path::Path;

use anyhow::{Context, Result};
use feed::{HostPhase, Viewport};
use feedconfig::FeedConfig;

use crate::cli::FeedArgs;

pub const DEFAULT_SIZE: (u32, u32) = (1280, 720);
pub const DEFAULT_MATERIAL_LABEL: &str = "preview";

/// Host settings after merging the config file with command-line flags.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    pub viewport: Viewport,
    pub phase: HostPhase,
    pub bind_material: bool,
    pub material_label: String,
}

impl FeedSettings {
    pub fn resolve(args: &FeedArgs, config: &FeedConfig) -> Self {
        let (width, height) = args
            .size
            .or_else(|| config.surface_size())
            .unwrap_or(DEFAULT_SIZE);
        let phase = if args.edit {
            HostPhase::Editing
        } else {
            config.phase()
        };
        let bind_material = !args.unbound && config.bind_material();
        let material_label = args
            .material
            .clone()
            .or_else(|| config.material.clone())
            .unwrap_or_else(|| DEFAULT_MATERIAL_LABEL.to_string());

        Self {
            viewport: Viewport::new(width, height),
            phase,
            bind_material,
            material_label,
        }
    }
}

/// Loads the config file named on the command line, or an empty config.
pub fn load_config(path: Option<&Path>) -> Result<FeedConfig> {
    match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            FeedConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))
        }
        None => Ok(FeedConfig::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_config_or_flags() {
        let settings = FeedSettings::resolve(&FeedArgs::default(), &FeedConfig::default());
        assert_eq!(settings.viewport, Viewport::new(1280, 720));
        assert_eq!(settings.phase, HostPhase::Playing);
        assert!(settings.bind_material);
        assert_eq!(settings.material_label, "preview");
    }

    #[test]
    fn flags_override_config() {
        let config = FeedConfig::from_toml_str(
            r#"
size = "640x480"
phase = "playing"
material = "from-file"
"#,
        )
        .unwrap();
        let args = FeedArgs {
            size: Some((1920, 1080)),
            edit: true,
            unbound: true,
            material: Some("from-flag".into()),
            ..FeedArgs::default()
        };

        let settings = FeedSettings::resolve(&args, &config);
        assert_eq!(settings.viewport, Viewport::new(1920, 1080));
        assert_eq!(settings.phase, HostPhase::Editing);
        assert!(!settings.bind_material);
        assert_eq!(settings.material_label, "from-flag");
    }

    #[test]
    fn config_fills_unset_flags() {
        let config = FeedConfig::from_toml_str(
            r#"
size = "640x480"
phase = "edit"
bind_material = false
"#,
        )
        .unwrap();
        let settings = FeedSettings::resolve(&FeedArgs::default(), &config);
        assert_eq!(settings.viewport, Viewport::new(640, 480));
        assert_eq!(settings.phase, HostPhase::Editing);
        assert!(!settings.bind_material);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = load_config(Some(Path::new("/nonexistent/toyfeed.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/toyfeed.toml"));
        assert!(load_config(None).is_ok());
    }
}
