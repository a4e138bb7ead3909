// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{ProcessingError, Result};
use crate::imaging::{ModelKind, PngCompression};
use crate::pipeline::{ProgressStyle, Scale};
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "PIXEL_POLISH";
pub const DEFAULT_OUTPUT: &str = "output.png";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub defaults: DefaultsConfig,
    pub enhance: EnhanceConfig,
    pub matting: MattingConfig,
    pub output: OutputConfig,
    pub progress: ProgressConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DefaultsConfig {
    pub scale: Scale,
    pub output: PathBuf,
}

/// Multiplicative enhancement factors, applied sharpness → contrast → color.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct EnhanceConfig {
    pub sharpness: f32,
    pub contrast: f32,
    pub color: f32,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            sharpness: 1.6,
            contrast: 1.2,
            color: 1.1,
        }
    }
}

/// Background matting. With `model` set, the ONNX segmentation model is
/// used; otherwise the border colour key with `tolerance` and `feather`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MattingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<PathBuf>,
    pub kind: ModelKind,
    pub threads: usize,
    pub tolerance: f32,
    pub feather: f32,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct OutputConfig {
    pub compression: PngCompression,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ProgressConfig {
    pub style: ProgressStyle,
    pub color: bool,
}

impl Config {
    /// Layer built-in defaults, the TOML file and `PIXEL_POLISH__*` variables.
    ///
    /// An explicit `path` must exist; without one, `config/default.toml` is
    /// read only if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let defaults = config::Config::try_from(&Self::default_config())
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        } else {
            builder = builder
                .add_source(config::File::from(Path::new(DEFAULT_CONFIG_PATH)).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        Self {
            defaults: DefaultsConfig {
                scale: Scale::X2,
                output: PathBuf::from(DEFAULT_OUTPUT),
            },
            enhance: EnhanceConfig::default(),
            matting: MattingConfig {
                model: None,
                kind: ModelKind::U2net,
                threads: 1,
                tolerance: 48.0,
                feather: 24.0,
            },
            output: OutputConfig {
                compression: PngCompression::Best,
            },
            progress: ProgressConfig {
                style: ProgressStyle::Console,
                color: true,
            },
        }
    }

    /// Output path used when none is given, for either mode.
    pub fn default_output(&self) -> &Path {
        &self.defaults.output
    }

    fn validate(&self) -> Result<()> {
        let factors = [
            ("enhance.sharpness", self.enhance.sharpness),
            ("enhance.contrast", self.enhance.contrast),
            ("enhance.color", self.enhance.color),
        ];
        for (name, value) in factors {
            if !value.is_finite() || value <= 0.0 {
                return Err(ProcessingError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        let matting = [
            ("matting.tolerance", self.matting.tolerance),
            ("matting.feather", self.matting.feather),
        ];
        for (name, value) in matting {
            if !value.is_finite() || value < 0.0 {
                return Err(ProcessingError::Config(format!(
                    "{} must be zero or positive, got {}",
                    name, value
                )));
            }
        }

        if self.matting.threads == 0 {
            return Err(ProcessingError::Config(
                "matting.threads must be at least 1".to_string(),
            ));
        }

        if self.defaults.output.as_os_str().is_empty() {
            return Err(ProcessingError::Config(
                "defaults.output must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.enhance, EnhanceConfig::default());
        assert_eq!(config.defaults.scale, Scale::X2);
        assert_eq!(config.default_output(), Path::new("output.png"));
        assert!(config.matting.model.is_none());
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        std::fs::write(
            &path,
            "[defaults]\nscale = 4\n\n[progress]\nstyle = \"log\"\n\n[output]\ncompression = \"fast\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.defaults.scale, Scale::X4);
        assert_eq!(config.progress.style, ProgressStyle::Log);
        assert_eq!(config.output.compression, PngCompression::Fast);
        assert_eq!(config.enhance.sharpness, 1.6);
        assert_eq!(config.default_output(), Path::new("output.png"));
        assert!(config.matting.model.is_none());
    }

    #[test]
    fn test_matting_model_from_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        std::fs::write(
            &path,
            "[matting]\nmodel = \"models/isnet.onnx\"\nkind = \"isnet\"\nthreads = 4\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(
            config.matting.model.as_deref(),
            Some(Path::new("models/isnet.onnx"))
        );
        assert_eq!(config.matting.kind, ModelKind::Isnet);
        assert_eq!(config.matting.threads, 4);
        assert_eq!(config.matting.tolerance, 48.0);
    }

    #[test]
    fn test_unsupported_scale_in_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.toml");
        std::fs::write(&path, "[defaults]\nscale = 3\n").unwrap();

        assert!(matches!(
            Config::load(Some(&path)),
            Err(ProcessingError::Config(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.toml");
        assert!(Config::load(Some(&path)).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_factors() {
        let mut config = Config::default_config();
        config.enhance.contrast = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default_config();
        config.matting.feather = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = Config::default_config();
        config.defaults.output = PathBuf::new();
        assert!(config.validate().is_err());

        let mut config = Config::default_config();
        config.matting.threads = 0;
        assert!(config.validate().is_err());
    }
}
