mod download;
mod extract;
mod filename;
mod filter;

pub use download::{DownloadContext, PARTIAL_SUFFIX, download_entry};
pub use extract::{AUDIO_MIME_TYPE, AudioEntry, extract_audio_entries, is_audio, strip_entry};
pub use filename::{Entry, FileNaming, simple_file_name};
pub use filter::{
    FromDate, get_n_age_date, n_days_before_in, only_entities_from_date, only_last_entity,
    only_new_entities,
};

use chrono::NaiveDateTime;

use crate::error::EntryError;
use crate::feed::RawEntry;

/// Which slice of the feed a run downloads
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every entry in the feed
    All,
    /// Entries listed before the one stored under this file name
    NewSince(String),
    /// The most recent entry only
    LastOnly,
    /// Entries published on or after this day
    FromDate(NaiveDateTime),
}

impl Selection {
    pub fn apply<'a, I>(&'a self, entries: I) -> Box<dyn Iterator<Item = Entry> + 'a>
    where
        I: IntoIterator<Item = Entry> + 'a,
    {
        match self {
            Selection::All => Box::new(entries.into_iter()),
            Selection::NewSince(marker) => Box::new(only_new_entities(marker, entries)),
            Selection::LastOnly => Box::new(only_last_entity(entries)),
            Selection::FromDate(cutoff) => Box::new(only_entities_from_date(*cutoff).apply(entries)),
        }
    }
}

/// Run the whole pipeline over a feed's raw entries
///
/// Extraction, entry construction and the selection are chained lazily, so
/// raw entries past the end of the selection are never looked at. The first
/// malformed entry that is reached aborts the run with no partial result.
pub fn select_entries<I>(
    raw_entries: I,
    naming: FileNaming,
    selection: &Selection,
) -> Result<Vec<Entry>, EntryError>
where
    I: IntoIterator<Item = RawEntry>,
{
    let mut failure = None;

    let entries = extract_audio_entries(raw_entries).map_while(|extracted| match extracted {
        Ok(audio_entry) => Some(audio_entry.into_entry(naming)),
        Err(e) => {
            failure = Some(e);
            None
        }
    });

    let selected: Vec<Entry> = selection.apply(entries).collect();

    match failure {
        Some(e) => Err(e),
        None => Ok(selected),
    }
}
