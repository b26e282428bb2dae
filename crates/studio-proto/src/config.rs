use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub tags: TagsConfig,
}

/// Where grabbed broadcasts end up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory for downloaded broadcasts.
    /// Defaults to `~/Music/Vladimir Matecky Studio`.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// The schedule site being scraped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Schedule URL without the trailing `/dd-MM-yyyy` segment.
    #[serde(default = "default_schedule_base_url")]
    pub schedule_base_url: String,
    /// Artwork embedded into every broadcast of a run.
    #[serde(default = "default_cover_art_url")]
    pub cover_art_url: String,
    /// Oldest date scanned (inclusive).
    #[serde(default = "default_oldest_date")]
    pub oldest_date: NaiveDate,
    #[serde(default = "default_broadcast_title")]
    pub broadcast_title: String,
}

/// Constant tag values written into every file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagsConfig {
    #[serde(default = "default_artist")]
    pub artist: String,
    #[serde(default = "default_publisher")]
    pub publisher: String,
    #[serde(default = "default_station_url")]
    pub publisher_url: String,
    #[serde(default = "default_station_url")]
    pub radio_url: String,
    #[serde(default = "default_copyright")]
    pub copyright: String,
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            schedule_base_url: default_schedule_base_url(),
            cover_art_url: default_cover_art_url(),
            oldest_date: default_oldest_date(),
            broadcast_title: default_broadcast_title(),
        }
    }
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            artist: default_artist(),
            publisher: default_publisher(),
            publisher_url: default_station_url(),
            radio_url: default_station_url(),
            copyright: default_copyright(),
            language: default_language(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    platform::music_dir().join("Vladimir Matecky Studio")
}

fn default_schedule_base_url() -> String {
    "https://radiomayak.ru/shows/show/id/59088/date".to_string()
}

fn default_cover_art_url() -> String {
    "https://cdn-st2.rtr-vesti.ru/vh/pictures/q/717/169.jpg".to_string()
}

fn default_oldest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2012, 12, 31).unwrap_or_default()
}

fn default_broadcast_title() -> String {
    "Студия Владимира Матецкого".to_string()
}

fn default_artist() -> String {
    "Владимир Матецкий".to_string()
}

fn default_publisher() -> String {
    "Государственная радиовещательная компания «Маяк»".to_string()
}

fn default_station_url() -> String {
    "https://radiomayak.ru/".to_string()
}

fn default_copyright() -> String {
    "© Государственная радиовещательная компания «Маяк»".to_string()
}

fn default_language() -> String {
    "Russian".to_string()
}

impl Config {
    /// Reads `path`, writing out the defaults first if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
