use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, path::PathBuf};

use crate::fetch::FetchOptions;

pub const DIRECTORY_URL: &str = "https://internal.imd.gov.in/pages/city_weather_main_mausam.php";
pub const STANDARD_PAGE_URL_PREFIX: &str = "https://city.imd.gov.in/citywx/city_weather.php?id=";
pub const WARNINGS_PAGE_URL_PREFIX: &str =
    "https://city.imd.gov.in/citywx/city_weather_test_try_warnings.php?id=";

/// Which flavour of station page to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StationPage {
    Standard,
    /// The page variant that also carries the warnings column.
    #[default]
    Warnings,
}

impl StationPage {
    pub fn as_str(&self) -> &'static str {
        match self {
            StationPage::Standard => "standard",
            StationPage::Warnings => "warnings",
        }
    }

    pub const fn all() -> &'static [StationPage] {
        &[StationPage::Standard, StationPage::Warnings]
    }

    pub fn url_prefix(&self) -> &'static str {
        match self {
            StationPage::Standard => STANDARD_PAGE_URL_PREFIX,
            StationPage::Warnings => WARNINGS_PAGE_URL_PREFIX,
        }
    }
}

impl fmt::Display for StationPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for StationPage {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "standard" => Ok(StationPage::Standard),
            "warnings" => Ok(StationPage::Warnings),
            _ => Err(anyhow!(
                "Unknown station page '{value}'. Supported pages: standard, warnings."
            )),
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// "standard" or "warnings"; unset means "warnings".
    pub station_page: Option<String>,

    /// Overrides the station directory page.
    pub directory_url: Option<String>,

    /// Station name or id used when a command is given none.
    pub default_station: Option<String>,

    /// Example TOML:
    /// [fetch]
    /// max_retries = 5
    /// backoff_factor = 0.5
    #[serde(default)]
    pub fetch: FetchOptions,
}

impl Config {
    pub fn station_page(&self) -> Result<StationPage> {
        match self.station_page.as_deref() {
            Some(page) => StationPage::try_from(page),
            None => Ok(StationPage::default()),
        }
    }

    pub fn set_station_page(&mut self, page: StationPage) {
        self.station_page = Some(page.as_str().to_string());
    }

    pub fn station_url_prefix(&self) -> Result<&'static str> {
        Ok(self.station_page()?.url_prefix())
    }

    pub fn directory_url(&self) -> &str {
        self.directory_url.as_deref().unwrap_or(DIRECTORY_URL)
    }

    pub fn fetch_options(&self) -> &FetchOptions {
        &self.fetch
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.station_page()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("in", "imdfetch", "imd")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
