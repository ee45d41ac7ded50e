//! Configuration management.

use anyhow::{Context, Result};
use panel_info::{DisplayPanel, PanelGeometry, Source};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Panel reported when no compatible string matches
    #[serde(default)]
    pub fallback: Option<FallbackConfig>,
}

/// Device database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// "builtin", or a path to a database file or panel directory
    #[serde(default = "default_database")]
    pub source: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            source: default_database(),
        }
    }
}

impl DatabaseConfig {
    /// Maps the configured source string to a database source.
    pub fn to_source(&self) -> Source {
        source_from_str(&self.source)
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    /// Print JSON instead of text
    #[serde(default)]
    pub json: bool,
}

/// Fallback panel geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Horizontal resolution in pixels
    pub width: u32,

    /// Vertical resolution in pixels
    pub height: u32,

    /// Corner radii, clockwise from top-left
    #[serde(default)]
    pub corner_radii: [u32; 4],
}

impl FallbackConfig {
    /// Builds the fallback panel, rejecting zero dimensions.
    pub fn to_panel(&self) -> Result<DisplayPanel> {
        let geometry = PanelGeometry::new(self.width, self.height, self.corner_radii)
            .context("Fallback panel needs a positive width and height")?;
        Ok(DisplayPanel::new(geometry).with_name("fallback"))
    }
}

// Default value functions
fn default_database() -> String {
    "builtin".to_string()
}

/// Parses a source string as used in the config file and on the command line.
pub fn source_from_str(s: &str) -> Source {
    if s.eq_ignore_ascii_case("builtin") {
        Source::Builtin
    } else {
        Source::from_path(s)
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(path.as_ref()).context("Failed to read configuration file")?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.database.source, "builtin");
        assert_eq!(config.database.to_source(), Source::Builtin);
        assert!(!config.output.json);
        assert!(config.fallback.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
            [database]
            source = "/usr/share/panel-info/devices.json"

            [output]
            json = true

            [fallback]
            width = 720
            height = 1440
            corner_radii = [20, 20, 20, 20]
            "#,
        )
        .unwrap();
        assert!(config.output.json);
        assert_eq!(
            config.database.to_source(),
            Source::File("/usr/share/panel-info/devices.json".into())
        );
        let panel = config.fallback.unwrap().to_panel().unwrap();
        assert_eq!(panel.width(), 720);
        assert_eq!(panel.corner_radii(), [20; 4]);
    }

    #[test]
    fn test_invalid_fallback() {
        let config = Config::parse("[fallback]\nwidth = 0\nheight = 1440\n").unwrap();
        assert!(config.fallback.unwrap().to_panel().is_err());
    }

    #[test]
    fn test_malformed_config() {
        assert!(Config::parse("[database\nsource = 1").is_err());
    }
}
