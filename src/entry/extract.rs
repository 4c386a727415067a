use chrono::NaiveDateTime;

use crate::error::EntryError;
use crate::feed::{Link, RawEntry};

use super::filename::{Entry, FileNaming};

/// The only enclosure type treated as a playable episode
pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";

/// A feed entry reduced to its publish time and its audio enclosures
///
/// `audio_links` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioEntry {
    published_date: NaiveDateTime,
    audio_links: Vec<Link>,
}

impl AudioEntry {
    /// Returns `None` when there is no audio link to download
    pub fn new(published_date: NaiveDateTime, audio_links: Vec<Link>) -> Option<Self> {
        if audio_links.is_empty() {
            return None;
        }

        Some(Self {
            published_date,
            audio_links,
        })
    }

    pub fn published_date(&self) -> NaiveDateTime {
        self.published_date
    }

    pub fn audio_links(&self) -> &[Link] {
        &self.audio_links
    }

    /// Build the downloadable entry from the first audio link
    pub fn into_entry(self, naming: FileNaming) -> Entry {
        let link = self.audio_links[0].href.clone();
        Entry::new(naming, self.published_date, link)
    }
}

pub fn is_audio(link: &Link) -> bool {
    link.mime_type == AUDIO_MIME_TYPE
}

/// Reduce one raw entry to its audio part
///
/// `Ok(None)` means the entry carries no audio and is not an episode.
pub fn strip_entry(position: usize, raw: RawEntry) -> Result<Option<AudioEntry>, EntryError> {
    let published_date = raw.published_parsed.ok_or(EntryError::MalformedEntry {
        position,
        field: "published_parsed",
    })?;

    let links = raw.links.ok_or(EntryError::MalformedEntry {
        position,
        field: "links",
    })?;

    let audio_links = links.into_iter().filter(is_audio).collect();

    Ok(AudioEntry::new(published_date, audio_links))
}

/// Lazily turn raw feed entries into audio entries, in feed order
///
/// Entries without an audio enclosure are skipped. A malformed entry is
/// yielded as an error in its place; consumers stop at the first one.
pub fn extract_audio_entries<I>(raw_entries: I) -> impl Iterator<Item = Result<AudioEntry, EntryError>>
where
    I: IntoIterator<Item = RawEntry>,
{
    raw_entries
        .into_iter()
        .enumerate()
        .filter_map(|(position, raw)| strip_entry(position, raw).transpose())
}
