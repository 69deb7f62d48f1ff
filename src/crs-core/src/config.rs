//! Driver configuration
//!
//! An optional TOML file supplies page options and output locations.
//! Command-line flags are applied on top by the CLI layer.

use anyhow::{Context, Result};
use crs_engine::PageOptions;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "CRS_CONFIG";

/// Main driver configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Toggles applied to every page in batch mode
    #[serde(default)]
    pub page: PageOptions,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Where generated files go
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for batch-mode cleaned images (None = bare file names)
    pub cleaned_image_dir: Option<PathBuf>,

    /// Write a JSON run summary to this file
    pub summary: Option<PathBuf>,
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config TOML {:?}", path))
    }

    /// Resolve and load the configuration.
    ///
    /// Lookup order: explicit path, `CRS_CONFIG`, the per-user default file
    /// if it exists, built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_from(
            explicit,
            std::env::var_os(CONFIG_ENV),
            Self::default_path(),
        )
    }

    /// Per-user configuration file: `<config_dir>/crs-samples/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("crs-samples").join("config.toml"))
    }

    fn load_from(
        explicit: Option<&Path>,
        from_env: Option<OsString>,
        default_path: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(path) = explicit {
            debug!("loading config from {:?}", path);
            return Self::from_file(path);
        }

        if let Some(path) = from_env.filter(|value| !value.is_empty()) {
            debug!("loading config from {} = {:?}", CONFIG_ENV, path);
            return Self::from_file(PathBuf::from(path));
        }

        match default_path {
            Some(path) if path.is_file() => {
                debug!("loading config from {:?}", path);
                Self::from_file(path)
            }
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_full_config() {
        let file = write_config(
            r#"
[page]
orientation_correction = true
deskewing = true
noise_filter = 5

[output]
cleaned_image_dir = "cleaned"
summary = "run.json"
"#,
        );

        let config = Config::from_file(file.path()).unwrap();
        assert!(config.page.orientation_correction);
        assert!(!config.page.cropping);
        assert!(config.page.deskewing);
        assert!(config.page.handwriting_processing);
        assert_eq!(config.page.noise_filter.level(), 5);
        assert_eq!(config.output.cleaned_image_dir, Some(PathBuf::from("cleaned")));
        assert_eq!(config.output.summary, Some(PathBuf::from("run.json")));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = write_config("");
        assert_eq!(Config::from_file(file.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_invalid_noise_filter_is_rejected() {
        let file = write_config("[page]\nnoise_filter = 9\n");
        assert!(Config::from_file(file.path()).is_err());
    }

    #[test]
    fn test_lookup_order() {
        let explicit = write_config("[page]\ncropping = true\n");
        let from_env = write_config("[page]\ndeskewing = true\n");
        let fallback = write_config("[page]\norientation_correction = true\n");

        let config = Config::load_from(
            Some(explicit.path()),
            Some(from_env.path().into()),
            Some(fallback.path().to_path_buf()),
        )
        .unwrap();
        assert!(config.page.cropping);

        let config = Config::load_from(
            None,
            Some(from_env.path().into()),
            Some(fallback.path().to_path_buf()),
        )
        .unwrap();
        assert!(config.page.deskewing);

        let config =
            Config::load_from(None, None, Some(fallback.path().to_path_buf())).unwrap();
        assert!(config.page.orientation_correction);
    }

    #[test]
    fn test_missing_default_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config =
            Config::load_from(None, None, Some(dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from(Some(&dir.path().join("absent.toml")), None, None).is_err());
    }
}
