use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};

use crate::model::Coordinate;

/// Environment override for the weather-provider API key; takes precedence
/// over the config file.
pub const API_KEY_ENV: &str = "GEOPANEL_OPENWEATHER_API_KEY";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Independently toggleable panel behaviors. The observed iterations
/// disagree on which of these are present, so each is its own switch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureToggles {
    /// Click-to-select on the map surface.
    pub map_click: bool,
    /// Street/satellite imagery switching.
    pub imagery_toggle: bool,
    /// Recent-locations list.
    pub history: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self { map_click: true, imagery_toggle: true, history: true }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OpenWeather API key; [`API_KEY_ENV`] overrides this when set.
    pub weather_api_key: Option<String>,

    /// Optional fallback position for the `here` flow, as "lat, lon".
    pub home: Option<String>,

    /// Start on satellite imagery (the observed default).
    pub satellite: bool,

    /// Per-fetch network timeout in seconds.
    pub fetch_timeout_secs: u64,

    pub features: FeatureToggles,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            home: None,
            satellite: true,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            features: FeatureToggles::default(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if no file exists yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "geopanel", "geopanel")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// The weather API key, environment first, then the config file.
    /// Absence fails fast here so no malformed request is ever issued.
    pub fn weather_api_key(&self) -> Result<String> {
        if let Ok(key) = std::env::var(API_KEY_ENV)
            && !key.trim().is_empty()
        {
            return Ok(key);
        }

        self.weather_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `geopanel configure` or set {API_KEY_ENV}."
                )
            })
    }

    pub fn set_weather_api_key(&mut self, key: String) {
        self.weather_api_key = Some(key);
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// The configured home coordinate, if any; a malformed value is a
    /// config error rather than a silent `None`.
    pub fn home_coordinate(&self) -> Result<Option<Coordinate>> {
        let Some(raw) = self.home.as_deref() else {
            return Ok(None);
        };

        let coordinate = raw
            .parse::<Coordinate>()
            .with_context(|| format!("Invalid `home` coordinate in config: {raw:?}"))?;

        Ok(Some(coordinate))
    }
}
