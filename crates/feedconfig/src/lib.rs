use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use feed::HostPhase;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read configuration at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeMode {
    #[default]
    Animate,
    Still,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimeConfig {
    #[serde(default)]
    pub mode: TimeMode,
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub still_time: Option<Duration>,
}

/// Settings for one `toyfeed` session, loaded from TOML.
///
/// Every key is optional; command-line flags take precedence over whatever
/// the file provides.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FeedConfig {
    pub shader: Option<PathBuf>,
    pub size: Option<String>,
    pub fps: Option<f32>,
    pub phase: Option<HostPhase>,
    pub bind_material: Option<bool>,
    pub material: Option<String>,
    #[serde(default)]
    pub time: TimeConfig,
}

impl FeedConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: FeedConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(size) = &self.size {
            parse_surface_size(size).map_err(ConfigError::Invalid)?;
        }

        if let Some(fps) = self.fps {
            check_fps(fps).map_err(ConfigError::Invalid)?;
        }

        if let Some(shader) = &self.shader {
            if shader.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("shader path may not be empty".into()));
            }
        }

        if self.time.mode == TimeMode::Animate && self.time.still_time.is_some() {
            return Err(ConfigError::Invalid(
                "time.still_time requires time.mode = \"still\"".into(),
            ));
        }

        Ok(())
    }

    /// Parsed `size`, if the file sets one.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.size
            .as_deref()
            .and_then(|size| parse_surface_size(size).ok())
    }

    /// Still-frame timestamp in seconds when the file asks for still mode.
    pub fn still_time(&self) -> Option<f32> {
        match self.time.mode {
            TimeMode::Still => Some(
                self.time
                    .still_time
                    .map(|duration| duration.as_secs_f32())
                    .unwrap_or(0.0),
            ),
            TimeMode::Animate => None,
        }
    }

    pub fn phase(&self) -> HostPhase {
        self.phase.unwrap_or_default()
    }

    pub fn bind_material(&self) -> bool {
        self.bind_material.unwrap_or(true)
    }

    /// Shader path with relative entries resolved against `base`, normally
    /// the directory holding the config file.
    pub fn shader_path(&self, base: Option<&Path>) -> Option<PathBuf> {
        let shader = self.shader.as_ref()?;
        match base {
            Some(base) if shader.is_relative() => Some(base.join(shader)),
            _ => Some(shader.clone()),
        }
    }
}

/// Parses an FPS cap; `0` means uncapped.
pub fn parse_fps(value: &str) -> Result<f32, String> {
    let trimmed = value.trim();
    let fps: f32 = trimmed
        .parse()
        .map_err(|_| format!("invalid fps '{trimmed}'"))?;
    check_fps(fps)?;
    Ok(fps)
}

fn check_fps(fps: f32) -> Result<(), String> {
    if fps.is_nan() || fps < 0.0 {
        return Err("fps must be >= 0".into());
    }
    if fps > 0.0 && Duration::try_from_secs_f32(1.0 / fps).is_err() {
        return Err(format!("fps {fps} is too small to pace frames"));
    }
    Ok(())
}

/// Parses a timestamp given either as plain seconds (`12.5`) or as a
/// humantime duration (`1m 30s`).
pub fn parse_seconds(value: &str) -> Result<f32, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time must not be empty".into());
    }
    if let Ok(seconds) = trimmed.parse::<f32>() {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(format!("time must be a non-negative number, got '{trimmed}'"));
        }
        return Ok(seconds);
    }
    humantime::parse_duration(trimmed)
        .map(|duration| duration.as_secs_f32())
        .map_err(|err| format!("invalid time '{trimmed}': {err}"))
}

/// Parses `WIDTHxHEIGHT` (also accepting `X` and `×`) into non-zero pixels.
pub fn parse_surface_size(value: &str) -> Result<(u32, u32), String> {
    let trimmed = value.trim();
    let (width, height) = trimmed
        .split_once(['x', 'X', '×'])
        .ok_or_else(|| format!("expected WxH format (e.g. 1920x1080), got '{trimmed}'"))?;

    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| "invalid width in size specification".to_string())?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| "invalid height in size specification".to_string())?;

    if width == 0 || height == 0 {
        return Err("surface dimensions must be greater than zero".into());
    }

    Ok((width, height))
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(Visitor)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"
shader = "shaders/plasma.frag"
size = "1280x720"
fps = 30
phase = "edit"
bind_material = false
material = "plasma"

[time]
mode = "still"
still_time = "12s 500ms"
"#;

    #[test]
    fn parses_sample_config() {
        let config = FeedConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.shader.as_deref(), Some(Path::new("shaders/plasma.frag")));
        assert_eq!(config.surface_size(), Some((1280, 720)));
        assert_eq!(config.fps, Some(30.0));
        assert_eq!(config.phase(), HostPhase::Editing);
        assert!(!config.bind_material());
        assert_eq!(config.material.as_deref(), Some("plasma"));
        assert_eq!(config.still_time(), Some(12.5));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = FeedConfig::from_toml_str("").unwrap();
        assert_eq!(config.phase(), HostPhase::Playing);
        assert!(config.bind_material());
        assert_eq!(config.still_time(), None);
        assert_eq!(config.surface_size(), None);
    }

    #[test]
    fn numeric_still_time_is_seconds() {
        let config = FeedConfig::from_toml_str(
            r#"
[time]
mode = "still"
still_time = 3
"#,
        )
        .unwrap();
        assert_eq!(config.still_time(), Some(3.0));

        let config = FeedConfig::from_toml_str(
            r#"
[time]
mode = "still"
still_time = 0.25
"#,
        )
        .unwrap();
        assert_eq!(config.still_time(), Some(0.25));
    }

    #[test]
    fn rejects_malformed_size() {
        for size in ["1920", "0x1080", "widexhigh"] {
            let err = FeedConfig::from_toml_str(&format!("size = \"{size}\"")).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "size {size}");
        }
    }

    #[test]
    fn rejects_negative_fps_and_still_time_without_still_mode() {
        let err = FeedConfig::from_toml_str("fps = -1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = FeedConfig::from_toml_str(
            r#"
[time]
still_time = "1s"
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_fps_too_small_to_pace() {
        let err = FeedConfig::from_toml_str("fps = 1e-30").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(FeedConfig::from_toml_str("fps = 0").is_ok());
        assert!(FeedConfig::from_toml_str("fps = 0.5").is_ok());
    }

    #[test]
    fn parses_fps_flag_values() {
        assert_eq!(parse_fps("30"), Ok(30.0));
        assert_eq!(parse_fps(" 0 "), Ok(0.0));
        assert!(parse_fps("1e-30").is_err());
        assert!(parse_fps("-5").is_err());
        assert!(parse_fps("NaN").is_err());
        assert!(parse_fps("fast").is_err());
    }

    #[test]
    fn rejects_negative_duration() {
        let err = FeedConfig::from_toml_str(
            r#"
[time]
mode = "still"
still_time = -2
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file_and_reports_missing_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "size = \"640x480\"").unwrap();
        let config = FeedConfig::load(file.path()).unwrap();
        assert_eq!(config.surface_size(), Some((640, 480)));

        let missing = file.path().with_extension("missing");
        let err = FeedConfig::load(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn shader_path_is_relative_to_config_dir() {
        let config = FeedConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(
            config.shader_path(Some(Path::new("/etc/toyfeed"))),
            Some(PathBuf::from("/etc/toyfeed/shaders/plasma.frag"))
        );
        assert_eq!(
            config.shader_path(None),
            Some(PathBuf::from("shaders/plasma.frag"))
        );

        let absolute = FeedConfig::from_toml_str("shader = \"/srv/a.frag\"").unwrap();
        assert_eq!(
            absolute.shader_path(Some(Path::new("/etc/toyfeed"))),
            Some(PathBuf::from("/srv/a.frag"))
        );
    }

    #[test]
    fn parses_seconds_and_humantime() {
        assert_eq!(parse_seconds("12.5"), Ok(12.5));
        assert_eq!(parse_seconds("1m 30s"), Ok(90.0));
        assert_eq!(parse_seconds("250ms"), Ok(0.25));
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("").is_err());
        assert!(parse_seconds("soon").is_err());
    }

    #[test]
    fn parses_size_separators() {
        assert_eq!(parse_surface_size("800X600"), Ok((800, 600)));
        assert_eq!(parse_surface_size(" 800 × 600 "), Ok((800, 600)));
        assert!(parse_surface_size("800-600").is_err());
    }
}
