/// Application configuration management
/// Stores user preferences in <config_dir>/smartcity-dash/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::feed::{FeedKind, FeedOptions, JitterFeed};
use crate::utils::{APP_NAME, CONFIG_PATH_ENV, DEFAULT_REFRESH_INTERVAL};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Refresh period, humantime syntax ("5s")
    #[serde(with = "humantime_serde_compat")]
    pub refresh_interval: Duration,
    pub feed: FeedKind,
    pub snapshot_file: Option<PathBuf>,
    pub jitter_seed: Option<u64>,
    pub jitter_amplitude: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            feed: FeedKind::Reference,
            snapshot_file: None,
            jitter_seed: None,
            jitter_amplitude: JitterFeed::DEFAULT_AMPLITUDE,
        }
    }
}

impl AppConfig {
    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = dirs::config_dir()
            .context("Could not determine the user config directory")?
            .join(APP_NAME);

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from a file, falling back to defaults if it does not exist
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Problems that would stop the dashboard from starting
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.refresh_interval.is_zero() {
            errors.push("refresh_interval must be greater than zero".to_string());
        }

        if self.feed == FeedKind::File {
            match &self.snapshot_file {
                None => errors.push("feed = \"file\" requires snapshot_file".to_string()),
                Some(path) if !path.is_file() => {
                    errors.push(format!("snapshot_file {} does not exist", path.display()))
                }
                _ => {}
            }
        }

        if !(0.0..=0.9).contains(&self.jitter_amplitude) {
            errors.push("jitter_amplitude must be in [0.0, 0.9]".to_string());
        }

        errors
    }

    pub fn feed_options(&self) -> FeedOptions {
        FeedOptions {
            file: self.snapshot_file.clone(),
            seed: self.jitter_seed,
            jitter: self.jitter_amplitude,
        }
    }
}

/// Serialize `Duration` as a humantime string
mod humantime_serde_compat {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(D::Error::custom)
    }
}
