use std::sync::Arc;

/// Events emitted while podcasts are synchronized
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A podcast is disabled in the configuration
    PodcastSkipped { podcast: String },

    /// Feed is being fetched from URL or read from disk
    FetchingFeed { podcast: String, url: String },

    /// The feed could not be loaded or processed
    FeedFailed {
        podcast: String,
        url: String,
        error: String,
    },

    /// Entries to download have been selected
    EntriesSelected {
        podcast: String,
        /// File name of the last downloaded episode, if any
        marker: Option<String>,
        selected: usize,
    },

    /// A download is starting
    DownloadStarting {
        file_name: String,
        /// Index of this entry in the podcast's download queue
        index: usize,
        /// Total number of entries queued for this podcast
        total: usize,
        /// Expected content length in bytes, if known
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        file_name: String,
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// A download completed successfully
    DownloadCompleted {
        file_name: String,
        bytes_downloaded: u64,
    },

    /// A download failed
    DownloadFailed { file_name: String, error: String },

    /// The global download limit has been used up
    DownloadLimitReached { limit: usize },

    /// Partial files were cleaned up during directory scan
    PartialFilesCleanedUp { podcast: String, count: usize },

    /// All podcasts have been processed
    SyncCompleted {
        downloaded_count: usize,
        failed_count: usize,
        failed_podcasts: usize,
    },
}

/// Trait for reporting progress events during synchronization.
///
/// The library never prints; the binary decides how events are shown.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A reporter that silently ignores all events, for tests and quiet mode
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {}
}

impl NoopReporter {
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}
