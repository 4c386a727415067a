pub mod config;
pub mod entry;
pub mod error;
pub mod feed;
pub mod http;
pub mod progress;
pub mod state;
pub mod sync;

// Re-export main types for convenience
pub use config::{
    Config, DirectoryPolicy, PodcastConfig, default_config_path, load_config, parse_config,
};
pub use entry::{
    AudioEntry, Entry, FileNaming, FromDate, Selection, extract_audio_entries, get_n_age_date,
    only_entities_from_date, only_last_entity, only_new_entities, select_entries,
};
pub use error::{ConfigError, DownloadError, EntryError, FeedError, StateError, SyncError};
pub use feed::{Feed, Link, RawEntry, is_url, load_feed, parse_feed};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use state::{DirectoryState, last_downloaded_file};
pub use sync::{SyncResult, plan_podcast, sync_podcasts, sync_podcasts_at};
