//! Configuration file management
//!
//! Loads TOML configuration files and provides benchmark settings.
//! Default config path: ~/.config/glesh/config.toml

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::ws::Backend;

/// Benchmark settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Window system and surface settings
    pub display: DisplayConfig,
    /// Wayland backend settings
    pub wayland: WaylandConfig,
    /// Benchmark selection and duration
    pub run: RunConfig,
}

/// Window system and surface settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// "wayland" or "fbdev"
    pub backend: Backend,
    /// Window width in pixels (0 = output size on Wayland)
    pub width: u32,
    /// Window height in pixels (0 = output size on Wayland)
    pub height: u32,
    /// Color depth in bits (0 = 32)
    pub depth: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            width: 0,
            height: 0,
            depth: 0,
        }
    }
}

/// Wayland backend settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaylandConfig {
    /// Max wait for compositor globals and output mode in ms (0 = wait forever)
    pub readiness_timeout_ms: u64,
}

impl WaylandConfig {
    pub fn readiness_timeout(&self) -> Option<Duration> {
        (self.readiness_timeout_ms > 0).then(|| Duration::from_millis(self.readiness_timeout_ms))
    }
}

/// Benchmark selection and duration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Seconds per benchmark (0 = until interrupted)
    pub duration: f64,
    /// Benchmarks to run, in order
    pub tests: Vec<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            duration: 10.0,
            tests: vec!["simple_tri".to_string()],
        }
    }
}

impl RunConfig {
    /// Loop duration; negative or non-finite values mean untimed
    pub fn duration(&self) -> Duration {
        if self.duration.is_finite() && self.duration > 0.0 {
            Duration::from_secs_f64(self.duration)
        } else {
            Duration::ZERO
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub backend: Option<Backend>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub depth: Option<u32>,
    pub duration: Option<f64>,
    /// Replaces the configured list when non-empty
    pub tests: Vec<String>,
}

impl Config {
    /// System-wide config path
    const SYSTEM_CONFIG_PATH: &'static str = "/etc/glesh/config.toml";

    /// Get the path that would be used for loading config
    /// Returns None if using built-in defaults
    pub fn config_path() -> Option<PathBuf> {
        // 1. GLESH_CONFIG environment variable
        if let Ok(path) = std::env::var("GLESH_CONFIG") {
            let p = Path::new(&path);
            if p.exists() {
                return Some(p.to_path_buf());
            }
            warn!("GLESH_CONFIG points to missing file: {}", path);
        }

        // 2. User config: ~/.config/glesh/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("glesh").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }
        }

        // 3. System config: /etc/glesh/config.toml
        let system_config = Path::new(Self::SYSTEM_CONFIG_PATH);
        if system_config.exists() {
            return Some(system_config.to_path_buf());
        }

        None
    }

    /// Load configuration with priority:
    /// 1. GLESH_CONFIG environment variable
    /// 2. ~/.config/glesh/config.toml (user config)
    /// 3. /etc/glesh/config.toml (system config)
    /// 4. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::config_path() {
            match Self::load_from_file(&path) {
                Ok(config) => {
                    info!("Loaded config: {}", path.display());
                    return config;
                }
                Err(e) => {
                    warn!("Failed to load config {}: {:#}", path.display(), e);
                }
            }
        }
        info!("Using built-in default config");
        Self::default()
    }

    /// Load settings from specified path
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded file
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(backend) = overrides.backend {
            self.display.backend = backend;
        }
        if let Some(width) = overrides.width {
            self.display.width = width;
        }
        if let Some(height) = overrides.height {
            self.display.height = height;
        }
        if let Some(depth) = overrides.depth {
            self.display.depth = depth;
        }
        if let Some(duration) = overrides.duration {
            self.run.duration = duration;
        }
        if !overrides.tests.is_empty() {
            self.run.tests = overrides.tests.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.display.width, 0);
        assert_eq!(config.run.duration(), Duration::from_secs(10));
        assert_eq!(config.run.tests, vec!["simple_tri"]);
        assert_eq!(config.wayland.readiness_timeout(), None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[display]\nbackend = \"fbdev\"\nwidth = 800\n\n[wayland]\nreadiness_timeout_ms = 2500"
        )
        .unwrap();

        let config = Config::load_from_file(file.path()).unwrap();
        assert_eq!(config.display.backend, Backend::Fbdev);
        assert_eq!(config.display.width, 800);
        assert_eq!(config.display.height, 0);
        assert_eq!(
            config.wayland.readiness_timeout(),
            Some(Duration::from_millis(2500))
        );
        assert_eq!(config.run, RunConfig::default());
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[display]\nbackend = \"x11\"").unwrap();
        assert!(Config::load_from_file(file.path()).is_err());
        assert!(Config::load_from_file(Path::new("/nonexistent/glesh.toml")).is_err());
    }

    #[test]
    fn test_overrides_win() {
        let mut config = Config::default();
        config.apply(&Overrides {
            backend: Some(Backend::Fbdev),
            height: Some(480),
            duration: Some(0.0),
            tests: vec!["textured_sphere".into()],
            ..Default::default()
        });
        assert_eq!(config.display.backend, Backend::Fbdev);
        assert_eq!(config.display.height, 480);
        assert_eq!(config.run.duration(), Duration::ZERO);
        assert_eq!(config.run.tests, vec!["textured_sphere"]);

        // Empty test list keeps the configured one
        config.apply(&Overrides::default());
        assert_eq!(config.run.tests, vec!["textured_sphere"]);
    }

    #[test]
    fn test_negative_duration_is_untimed() {
        let run = RunConfig {
            duration: -1.0,
            tests: Vec::new(),
        };
        assert_eq!(run.duration(), Duration::ZERO);
    }
}
