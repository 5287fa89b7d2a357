//! Demo configuration
//!
//! A small TOML-backed settings struct shared by the demo binaries:
//! offscreen extent, validation toggle and output directory. Missing
//! files fall back to defaults so the demos run without any setup.

use ash::vk;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Settings shared by every demo program
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Offscreen target width in texels
    pub width: u32,
    /// Offscreen target height in texels
    pub height: u32,
    /// Enable validation layers and the debug messenger
    pub validation: bool,
    /// Directory the demos write their images into
    pub output_dir: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            validation: cfg!(debug_assertions),
            output_dir: ".".to_string(),
        }
    }
}

impl RenderSettings {
    /// Load settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load settings from a TOML file, defaulting when the file is absent
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(&path) {
            Ok(settings) => settings,
            Err(ConfigError::Io(_)) => {
                log::debug!(
                    "No settings at {:?}, using defaults",
                    path.as_ref()
                );
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring unreadable settings {:?}: {}", path.as_ref(), e);
                Self::default()
            }
        }
    }

    /// Offscreen extent from width and height
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    /// Resolve an output file name against the output directory
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.output_dir).join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_original_target() {
        let settings = RenderSettings::default();
        assert_eq!(settings.width, 512);
        assert_eq!(settings.height, 512);
        assert_eq!(settings.output_dir, ".");
    }

    #[test]
    fn parses_a_full_settings_file() {
        let settings: RenderSettings = toml::from_str(
            r#"
            width = 256
            height = 128
            validation = false
            output_dir = "out"
            "#,
        )
        .unwrap();

        assert_eq!(settings.width, 256);
        assert_eq!(settings.height, 128);
        assert!(!settings.validation);
        assert_eq!(settings.output_dir, "out");
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: RenderSettings = toml::from_str("width = 1024").unwrap();
        assert_eq!(settings.width, 1024);
        assert_eq!(settings.height, 512);
    }

    #[test]
    fn extent_mirrors_width_and_height() {
        let settings = RenderSettings {
            width: 64,
            height: 32,
            ..RenderSettings::default()
        };
        let extent = settings.extent();
        assert_eq!(extent.width, 64);
        assert_eq!(extent.height, 32);
    }

    #[test]
    fn output_path_joins_the_directory() {
        let settings = RenderSettings {
            output_dir: "renders".to_string(),
            ..RenderSettings::default()
        };
        assert_eq!(
            settings.output_path("image.bin"),
            PathBuf::from("renders/image.bin")
        );
    }
}
