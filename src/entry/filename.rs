use chrono::NaiveDateTime;

/// How an entry's local file name is derived
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileNaming {
    /// Last segment of the enclosure URL
    #[default]
    Simple,
    /// Same as `Simple`, prefixed with `[YYYYMMDD] ` from the publish date
    Dated,
}

/// A downloadable episode: publish time plus the audio link to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    naming: FileNaming,
    published_date: NaiveDateTime,
    link: String,
}

impl Entry {
    pub fn new(naming: FileNaming, published_date: NaiveDateTime, link: impl Into<String>) -> Self {
        Self {
            naming,
            published_date,
            link: link.into(),
        }
    }

    pub fn simple(published_date: NaiveDateTime, link: impl Into<String>) -> Self {
        Self::new(FileNaming::Simple, published_date, link)
    }

    pub fn dated(published_date: NaiveDateTime, link: impl Into<String>) -> Self {
        Self::new(FileNaming::Dated, published_date, link)
    }

    pub fn naming(&self) -> FileNaming {
        self.naming
    }

    pub fn published_date(&self) -> NaiveDateTime {
        self.published_date
    }

    pub fn link(&self) -> &str {
        &self.link
    }

    /// The local file name this entry is stored under
    pub fn to_file_name(&self) -> String {
        let name = simple_file_name(&self.link);

        match self.naming {
            FileNaming::Simple => name,
            FileNaming::Dated => {
                format!("[{}] {}", self.published_date.format("%Y%m%d"), name)
            }
        }
    }
}

/// Lowercased last path segment of `link`, without its query string
///
/// A `?` opening the segment is kept: `.../?episode.mp3` names the file
/// `?episode.mp3`. Otherwise the name is cut at the last `?`.
pub fn simple_file_name(link: &str) -> String {
    let segment = link.rsplit_once('/').map_or(link, |(_, tail)| tail);
    let name = segment.to_lowercase();

    match name.find('?') {
        Some(position) if position > 0 => name
            .rsplit_once('?')
            .map_or(name.clone(), |(head, _)| head.to_string()),
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(23, 59, 59)
            .unwrap()
    }

    // === Simple names ===

    #[test]
    fn simple_name_strips_query_and_lowercases() {
        let entry = Entry::simple(date(2023, 7, 4), "https://x.com/A/Ep1.mp3?x=1");
        assert_eq!(entry.to_file_name(), "ep1.mp3");
    }

    #[test]
    fn simple_name_keeps_leading_question_mark() {
        let entry = Entry::simple(date(2023, 7, 4), "https://x.com/?episode.mp3");
        assert_eq!(entry.to_file_name(), "?episode.mp3");
    }

    #[test]
    fn simple_name_cuts_at_last_question_mark() {
        assert_eq!(simple_file_name("https://x.com/ep.mp3?a=1?b=2"), "ep.mp3?a=1");
    }

    #[test]
    fn simple_name_without_slash_uses_whole_link() {
        assert_eq!(simple_file_name("Episode.MP3"), "episode.mp3");
    }

    #[test]
    fn simple_name_of_trailing_slash_is_empty() {
        assert_eq!(simple_file_name("https://x.com/podcast/"), "");
    }

    #[test]
    fn simple_name_only_looks_after_the_last_slash() {
        assert_eq!(
            simple_file_name("https://cdn.x.com/track?u=https://x.com/Ep2.mp3"),
            "ep2.mp3"
        );
    }

    // === Dated names ===

    #[test]
    fn dated_name_prefixes_publish_day() {
        let entry = Entry::dated(date(2023, 7, 4), "https://x.com/A/Ep1.mp3");
        assert_eq!(entry.to_file_name(), "[20230704] ep1.mp3");
    }

    #[test]
    fn dated_name_pads_month_and_day() {
        let entry = Entry::dated(date(2024, 1, 5), "https://x.com/show.mp3?token=abc");
        assert_eq!(entry.to_file_name(), "[20240105] show.mp3");
    }

    #[test]
    fn naming_is_chosen_at_construction() {
        let published = date(2023, 7, 4);
        let link = "https://x.com/ep.mp3";

        assert_eq!(Entry::new(FileNaming::default(), published, link).to_file_name(), "ep.mp3");
        assert_eq!(Entry::new(FileNaming::Dated, published, link).naming(), FileNaming::Dated);
    }
}
