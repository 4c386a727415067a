use std::path::PathBuf;
use thiserror::Error;

/// Errors that make a feed unavailable: it cannot be fetched, read or parsed
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to fetch feed from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read feed file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse feed as RSS ({rss}) or Atom ({atom})")]
    ParseFailed {
        rss: rss::Error,
        atom: atom_syndication::Error,
    },

    #[error("Invalid feed URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors raised while turning raw feed entries into episode entries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EntryError {
    #[error("Feed entry #{position} is malformed: missing {field}")]
    MalformedEntry {
        /// Zero-based position of the entry in feed order
        position: usize,
        field: &'static str,
    },
}

/// Errors that can occur during episode downloads
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to create file {path}: {source}")]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream error while downloading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Errors that can occur when scanning a podcast directory
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while loading the configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON in {path}: {source}")]
    JsonParseFailed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "Unknown directory policy '{0}' (expected download_last, download_all_from_feed or download_from_<N>_days)"
    )]
    InvalidDirectoryPolicy(String),
}

/// Top-level errors for a single podcast sync
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Feed {url} is unavailable: {source}")]
    FeedUnavailable {
        url: String,
        #[source]
        source: FeedError,
    },

    #[error("Feed {url} could not be processed: {source}")]
    Entry {
        url: String,
        #[source]
        source: EntryError,
    },

    #[error("State error: {0}")]
    State(#[from] StateError),
}
