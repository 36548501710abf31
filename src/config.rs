//! Configuration file support
//!
//! Settings are read from TOML. Lookup order:
//!
//! 1. `--config PATH`
//! 2. `./ocr-preprocess.toml`
//! 3. `<config_dir>/ocr-preprocess/config.toml`
//! 4. Built-in defaults
//!
//! Command-line values always win over the file.
//!
//! # Example
//!
//! ```toml
//! [polarity]
//! mode = "auto"
//! dark_bg_threshold = 0.5
//!
//! [scale]
//! factor = 3.5
//!
//! [furigana]
//! mode = "vertical"
//! # magnification = 3.5   # default: follows [scale]
//!
//! [runtime]
//! threads = 4
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::preprocess::{
    BinarizeOptions, FuriganaMode, FuriganaSettings, NegateMode, PolarityOptions,
    PreprocessOptions, ScaleOptions, UnsharpOptions,
};

/// Local config file name
pub const LOCAL_CONFIG_FILE: &str = "ocr-preprocess.toml";

/// Directory under the user config dir
pub const CONFIG_DIR_NAME: &str = "ocr-preprocess";

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Runtime settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Worker threads (unset = all CPUs)
    pub threads: Option<usize>,
}

/// File configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub polarity: PolarityOptions,
    pub scale: ScaleOptions,
    pub unsharp: UnsharpOptions,
    pub binarize: BinarizeOptions,
    pub furigana: FuriganaSettings,
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Load from the first config file found, or defaults
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.is_file() {
                debug!(path = %path.display(), "loading config");
                return Self::load_from_path(&path);
            }
        }
        Ok(Self::default())
    }

    /// Candidate config paths in lookup order
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(LOCAL_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join(CONFIG_DIR_NAME).join("config.toml"));
        }
        paths
    }

    /// Load from an explicit path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse from a TOML string
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Apply command-line overrides and produce pipeline options
    pub fn merge_with_cli(&self, cli: &CliOverrides) -> Result<PreprocessOptions> {
        let mut options = PreprocessOptions {
            polarity: self.polarity.clone(),
            scale: self.scale.clone(),
            unsharp: self.unsharp.clone(),
            binarize: self.binarize.clone(),
            furigana: self.furigana.clone(),
            threads: self.runtime.threads,
        };

        if let Some(mode) = cli.negate {
            options.polarity.mode = mode;
        }
        if let Some(threshold) = cli.dark_bg_threshold {
            options.polarity.dark_bg_threshold = threshold;
        }
        if let Some(enabled) = cli.scale {
            options.scale.enabled = enabled;
        }
        if let Some(factor) = cli.scale_factor {
            options.scale.factor = factor;
        }
        if let Some(enabled) = cli.unsharp {
            options.unsharp.enabled = enabled;
        }
        if let Some(halfwidth) = cli.unsharp_halfwidth {
            options.unsharp.halfwidth = halfwidth;
        }
        if let Some(fract) = cli.unsharp_fract {
            options.unsharp.fract = fract;
        }
        if let Some(enabled) = cli.binarize {
            options.binarize.enabled = enabled;
        }
        if let Some(width) = cli.tile_width {
            options.binarize.tile_width = width;
        }
        if let Some(height) = cli.tile_height {
            options.binarize.tile_height = height;
        }
        if let Some(x) = cli.smooth_x {
            options.binarize.smooth_x = x;
        }
        if let Some(y) = cli.smooth_y {
            options.binarize.smooth_y = y;
        }
        if let Some(fraction) = cli.score_fraction {
            options.binarize.score_fraction = fraction;
        }
        if let Some(mode) = cli.furigana {
            options.furigana.mode = mode;
        }
        if cli.furigana_magnification.is_some() {
            options.furigana.magnification = cli.furigana_magnification;
        }
        if cli.threads.is_some() {
            options.threads = cli.threads;
        }

        validate(&options)?;
        Ok(options)
    }
}

fn validate(options: &PreprocessOptions) -> Result<()> {
    let invalid = |field, message: String| Err(ConfigError::InvalidValue { field, message });

    if !(0.0..=1.0).contains(&options.polarity.dark_bg_threshold) {
        return invalid(
            "dark_bg_threshold",
            format!("{} is outside [0, 1]", options.polarity.dark_bg_threshold),
        );
    }
    if options.scale.enabled && !(options.scale.factor.is_finite() && options.scale.factor > 0.0) {
        return invalid(
            "scale_factor",
            format!("{} is not a positive number", options.scale.factor),
        );
    }
    if !(0.0..=1.0).contains(&options.binarize.score_fraction) {
        return invalid(
            "score_fraction",
            format!("{} is outside [0, 1]", options.binarize.score_fraction),
        );
    }
    let magnification = options.magnification();
    if options.furigana.mode != FuriganaMode::Disabled
        && !(magnification.is_finite() && magnification > 0.0)
    {
        return invalid(
            "furigana_magnification",
            format!("{} is not a positive number", magnification),
        );
    }
    if options.threads == Some(0) {
        return invalid("threads", "must be at least 1".to_string());
    }

    Ok(())
}

/// Values given on the command line (unset = keep file value)
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub negate: Option<NegateMode>,
    pub dark_bg_threshold: Option<f32>,
    pub scale: Option<bool>,
    pub scale_factor: Option<f32>,
    pub unsharp: Option<bool>,
    pub unsharp_halfwidth: Option<u32>,
    pub unsharp_fract: Option<f32>,
    pub binarize: Option<bool>,
    pub tile_width: Option<u32>,
    pub tile_height: Option<u32>,
    pub smooth_x: Option<u32>,
    pub smooth_y: Option<u32>,
    pub score_fraction: Option<f32>,
    pub furigana: Option<FuriganaMode>,
    pub furigana_magnification: Option<f32>,
    pub threads: Option<usize>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.scale.factor, 3.5);
        assert_eq!(config.furigana.mode, FuriganaMode::Disabled);
        assert_eq!(config.runtime.threads, None);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config = Config::from_toml(
            r#"
            [polarity]
            mode = "no"

            [furigana]
            mode = "horizontal"
            keep_ratio = 0.8

            [runtime]
            threads = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.polarity.mode, NegateMode::No);
        assert_eq!(config.polarity.dark_bg_threshold, 0.5);
        assert_eq!(config.furigana.mode, FuriganaMode::Horizontal);
        assert_eq!(config.furigana.keep_ratio, 0.8);
        assert_eq!(config.furigana.max_spans, 50);
        assert_eq!(config.runtime.threads, Some(3));
        assert!(config.unsharp.enabled);
    }

    #[test]
    fn test_furigana_none_alias() {
        let config = Config::from_toml("[furigana]\nmode = \"none\"\n").unwrap();
        assert_eq!(config.furigana.mode, FuriganaMode::Disabled);
    }

    #[test]
    fn test_parse_error() {
        assert!(Config::from_toml("[scale]\nfactor = \"big\"\n").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.binarize.smooth_x = 2;
        config.runtime.threads = Some(8);
        let text = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[scale]\nenabled = false").unwrap();

        let config = Config::load_from_path(file.path()).unwrap();
        assert!(!config.scale.enabled);
    }

    #[test]
    fn test_load_from_missing_path() {
        let result = Config::load_from_path(Path::new("/nonexistent/ocr.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_cli_overrides_win() {
        let config = Config::from_toml("[scale]\nfactor = 2.0\n[runtime]\nthreads = 2\n").unwrap();
        let overrides = CliOverrides {
            scale_factor: Some(4.0),
            furigana: Some(FuriganaMode::Vertical),
            ..Default::default()
        };

        let options = config.merge_with_cli(&overrides).unwrap();
        assert_eq!(options.scale.factor, 4.0);
        assert_eq!(options.furigana.mode, FuriganaMode::Vertical);
        assert_eq!(options.threads, Some(2));
        assert_eq!(options.magnification(), 4.0);
    }

    #[test]
    fn test_empty_overrides_keep_file_values() {
        let config = Config::from_toml("[unsharp]\nhalfwidth = 3\n").unwrap();
        let options = config.merge_with_cli(&CliOverrides::new()).unwrap();
        assert_eq!(options.unsharp.halfwidth, 3);
        assert_eq!(options.unsharp.fract, 2.5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config::default();

        let overrides = CliOverrides {
            dark_bg_threshold: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(
            config.merge_with_cli(&overrides),
            Err(ConfigError::InvalidValue { field: "dark_bg_threshold", .. })
        ));

        let overrides = CliOverrides {
            scale_factor: Some(0.0),
            ..Default::default()
        };
        assert!(config.merge_with_cli(&overrides).is_err());

        // A bad factor is fine while scaling is off
        let overrides = CliOverrides {
            scale: Some(false),
            scale_factor: Some(0.0),
            ..Default::default()
        };
        assert!(config.merge_with_cli(&overrides).is_ok());
    }

    #[test]
    fn test_furigana_magnification_override() {
        let config = Config::from_toml("[scale]\nenabled = false\n").unwrap();
        let overrides = CliOverrides {
            furigana: Some(FuriganaMode::Vertical),
            furigana_magnification: Some(3.5),
            ..Default::default()
        };

        let options = config.merge_with_cli(&overrides).unwrap();
        assert!(!options.scale.enabled);
        assert_eq!(options.magnification(), 3.5);
    }

    #[test]
    fn test_invalid_magnification_rejected_only_with_furigana() {
        let config = Config::default();

        let overrides = CliOverrides {
            furigana: Some(FuriganaMode::Horizontal),
            furigana_magnification: Some(0.0),
            ..Default::default()
        };
        assert!(matches!(
            config.merge_with_cli(&overrides),
            Err(ConfigError::InvalidValue { field: "furigana_magnification", .. })
        ));

        let overrides = CliOverrides {
            furigana_magnification: Some(0.0),
            ..Default::default()
        };
        assert!(config.merge_with_cli(&overrides).is_ok());
    }

    #[test]
    fn test_search_paths_start_local() {
        let paths = Config::search_paths();
        assert_eq!(paths[0], PathBuf::from(LOCAL_CONFIG_FILE));
    }
}
