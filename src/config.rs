use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::entry::{FileNaming, Selection, get_n_age_date};
use crate::error::ConfigError;

/// Name of the configuration file in the home directory
pub const CONFIG_FILENAME: &str = ".podcast_downloader_config.json";

const DEFAULT_EXTENSION: &str = ".mp3";

/// What to download for a podcast whose directory holds no episode yet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum DirectoryPolicy {
    #[default]
    DownloadLast,
    DownloadAll,
    DownloadFromDays(u32),
}

impl DirectoryPolicy {
    /// The selection to use when there is no marker, relative to `now`
    pub fn selection(self, now: NaiveDateTime) -> Selection {
        match self {
            DirectoryPolicy::DownloadLast => Selection::LastOnly,
            DirectoryPolicy::DownloadAll => Selection::All,
            DirectoryPolicy::DownloadFromDays(days) => Selection::FromDate(get_n_age_date(days, now)),
        }
    }
}

impl FromStr for DirectoryPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "download_last" => Ok(DirectoryPolicy::DownloadLast),
            "download_all_from_feed" => Ok(DirectoryPolicy::DownloadAll),
            other => other
                .strip_prefix("download_from_")
                .and_then(|rest| rest.strip_suffix("_days"))
                .and_then(|days| days.parse().ok())
                .map(DirectoryPolicy::DownloadFromDays)
                .ok_or_else(|| ConfigError::InvalidDirectoryPolicy(other.to_string())),
        }
    }
}

impl TryFrom<String> for DirectoryPolicy {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for DirectoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectoryPolicy::DownloadLast => f.write_str("download_last"),
            DirectoryPolicy::DownloadAll => f.write_str("download_all_from_feed"),
            DirectoryPolicy::DownloadFromDays(days) => write!(f, "download_from_{days}_days"),
        }
    }
}

/// One podcast entry of the configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PodcastConfig {
    pub name: String,
    pub rss_link: String,
    pub path: String,
    #[serde(default)]
    pub require_date: bool,
    #[serde(default)]
    pub disable: bool,
    #[serde(default)]
    pub if_directory_empty: Option<DirectoryPolicy>,
}

impl PodcastConfig {
    pub fn naming(&self) -> FileNaming {
        if self.require_date {
            FileNaming::Dated
        } else {
            FileNaming::Simple
        }
    }

    /// Podcast directory with a leading `~` expanded
    pub fn directory(&self) -> PathBuf {
        expand_home(&self.path)
    }
}

/// The configuration file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub if_directory_empty: DirectoryPolicy,
    /// Maximum number of episodes downloaded per run, over all podcasts
    #[serde(default)]
    pub downloads_limit: Option<usize>,
    #[serde(default = "default_extension")]
    pub podcast_extension: String,
    #[serde(default)]
    pub podcasts: Vec<PodcastConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            if_directory_empty: DirectoryPolicy::default(),
            downloads_limit: None,
            podcast_extension: default_extension(),
            podcasts: Vec::new(),
        }
    }
}

impl Config {
    /// The directory policy for a podcast, its own setting first
    pub fn directory_policy(&self, podcast: &PodcastConfig) -> DirectoryPolicy {
        podcast.if_directory_empty.unwrap_or(self.if_directory_empty)
    }
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

/// `~/.podcast_downloader_config.json`
pub fn default_config_path() -> PathBuf {
    expand_home(&format!("~/{CONFIG_FILENAME}"))
}

pub fn parse_config(json: &str, path: &Path) -> Result<Config, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::JsonParseFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read and parse the configuration file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_config(&content, path)
}

fn expand_home(path: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);

    match (path.strip_prefix('~'), home) {
        (Some(rest), Some(home)) if rest.is_empty() || rest.starts_with('/') => {
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(path),
    }
}
