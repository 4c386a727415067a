// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use chrono::{Local, NaiveDateTime};

use crate::config::{Config, PodcastConfig};
use crate::entry::{DownloadContext, Entry, Selection, download_entry, select_entries};
use crate::error::SyncError;
use crate::feed::load_feed;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};
use crate::state::last_downloaded_file;

/// Result of a sync run over all configured podcasts
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    /// Number of episodes successfully downloaded
    pub downloaded: usize,
    /// Number of episodes that failed to download
    pub failed: usize,
    /// Podcasts whose feed could not be processed (name, error message)
    pub failed_podcasts: Vec<(String, String)>,
    /// Details of failed episodes (file name, error message)
    pub failed_episodes: Vec<(String, String)>,
}

/// Download budget shared by all podcasts of one run
#[derive(Debug, Clone, Copy)]
struct DownloadBudget {
    remaining: Option<usize>,
}

impl DownloadBudget {
    fn take(&mut self) -> bool {
        match self.remaining.as_mut() {
            None => true,
            Some(0) => false,
            Some(remaining) => {
                *remaining -= 1;
                true
            }
        }
    }
}

/// Decide what to download for one podcast
///
/// Loads the feed and looks for the last downloaded file. With a marker the
/// run continues from it; without one the podcast's directory policy
/// applies. The returned entries are oldest first, in download order.
pub async fn plan_podcast<C: HttpClient>(
    client: &C,
    config: &Config,
    podcast: &PodcastConfig,
    now: NaiveDateTime,
    reporter: &SharedProgressReporter,
) -> Result<Vec<Entry>, SyncError> {
    let url = podcast.rss_link.as_str();

    reporter.report(ProgressEvent::FetchingFeed {
        podcast: podcast.name.clone(),
        url: url.to_string(),
    });

    let feed = load_feed(client, url)
        .await
        .map_err(|e| SyncError::FeedUnavailable {
            url: url.to_string(),
            source: e,
        })?;

    let state = last_downloaded_file(&podcast.directory(), &config.podcast_extension)?;

    if state.partial_files_cleaned > 0 {
        reporter.report(ProgressEvent::PartialFilesCleanedUp {
            podcast: podcast.name.clone(),
            count: state.partial_files_cleaned,
        });
    }

    let selection = match &state.last_downloaded {
        Some(marker) => Selection::NewSince(marker.clone()),
        None => config.directory_policy(podcast).selection(now),
    };

    let mut selected =
        select_entries(feed.entries, podcast.naming(), &selection).map_err(|e| {
            SyncError::Entry {
                url: url.to_string(),
                source: e,
            }
        })?;
    selected.reverse();

    reporter.report(ProgressEvent::EntriesSelected {
        podcast: podcast.name.clone(),
        marker: state.last_downloaded,
        selected: selected.len(),
    });

    Ok(selected)
}

/// Synchronize every enabled podcast of the configuration
///
/// Podcasts are processed in configuration order and episodes are
/// downloaded one at a time, oldest first, so that the last file written is
/// always the newest episode. A feed that fails is reported and skipped; a
/// failed download does not stop the remaining ones.
pub async fn sync_podcasts<C: HttpClient>(
    client: &C,
    config: &Config,
    reporter: SharedProgressReporter,
) -> SyncResult {
    sync_podcasts_at(client, config, Local::now().naive_local(), reporter).await
}

/// `sync_podcasts` with an explicit notion of "now" for day-based policies
///
/// The next run resumes after the newest file on disk. An episode that failed
/// here while a newer one of the same podcast succeeded is therefore not
/// retried by later runs.
pub async fn sync_podcasts_at<C: HttpClient>(
    client: &C,
    config: &Config,
    now: NaiveDateTime,
    reporter: SharedProgressReporter,
) -> SyncResult {
    let mut result = SyncResult::default();
    let mut budget = DownloadBudget {
        remaining: config.downloads_limit,
    };

    'podcasts: for podcast in &config.podcasts {
        if podcast.disable {
            reporter.report(ProgressEvent::PodcastSkipped {
                podcast: podcast.name.clone(),
            });
            continue;
        }

        let entries = match plan_podcast(client, config, podcast, now, &reporter).await {
            Ok(entries) => entries,
            Err(e) => {
                reporter.report(ProgressEvent::FeedFailed {
                    podcast: podcast.name.clone(),
                    url: podcast.rss_link.clone(),
                    error: e.to_string(),
                });
                result.failed_podcasts.push((podcast.name.clone(), e.to_string()));
                continue;
            }
        };

        let directory = podcast.directory();
        let total = entries.len();

        for (index, entry) in entries.iter().enumerate() {
            if !budget.take() {
                reporter.report(ProgressEvent::DownloadLimitReached {
                    limit: config.downloads_limit.unwrap_or_default(),
                });
                break 'podcasts;
            }

            let context = DownloadContext { index, total };

            match download_entry(client, entry, &directory, &context, &reporter).await {
                Ok(_) => result.downloaded += 1,
                Err(e) => {
                    let file_name = entry.to_file_name();
                    reporter.report(ProgressEvent::DownloadFailed {
                        file_name: file_name.clone(),
                        error: e.to_string(),
                    });
                    result.failed += 1;
                    result.failed_episodes.push((file_name, e.to_string()));
                }
            }
        }
    }

    reporter.report(ProgressEvent::SyncCompleted {
        downloaded_count: result.downloaded,
        failed_count: result.failed,
        failed_podcasts: result.failed_podcasts.len(),
    });

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::DirectoryPolicy;
    use crate::http::{ByteStream, HttpResponse};
    use crate::progress::NoopReporter;
    use async_trait::async_trait;
    use bytes::Bytes;
    use chrono::NaiveDate;
    use std::path::Path;
    use tempfile::tempdir;

    #[derive(Clone)]
    struct MockHttpClient {
        feed_xml: String,
        audio_data: Vec<u8>,
    }

    #[async_trait]
    impl HttpClient for MockHttpClient {
        async fn get_bytes(&self, _url: &str) -> Result<Bytes, reqwest::Error> {
            Ok(Bytes::from(self.feed_xml.clone()))
        }

        async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
            let data = self.audio_data.clone();
            let len = data.len() as u64;
            let status = if url.contains("broken") { 500 } else { 200 };

            let stream: ByteStream =
                Box::pin(futures::stream::once(async move { Ok(Bytes::from(data)) }));

            Ok(HttpResponse {
                status,
                content_length: Some(len),
                body: stream,
            })
        }
    }

    const SAMPLE_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Test Podcast</title>
    <description>A test podcast</description>
    <item>
      <title>Episode 3</title>
      <pubDate>Sun, 15 Jan 2023 08:00:00 +0000</pubDate>
      <enclosure url="https://example.com/Ep3.mp3?t=1" type="audio/mpeg"/>
    </item>
    <item>
      <title>Trailer</title>
      <pubDate>Sat, 14 Jan 2023 08:00:00 +0000</pubDate>
      <link>https://example.com/trailer</link>
    </item>
    <item>
      <title>Episode 2</title>
      <pubDate>Tue, 10 Jan 2023 08:00:00 +0000</pubDate>
      <enclosure url="https://example.com/ep2.mp3" type="audio/mpeg"/>
    </item>
    <item>
      <title>Episode 1</title>
      <pubDate>Sun, 01 Jan 2023 08:00:00 +0000</pubDate>
      <enclosure url="https://example.com/ep1.mp3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    const MALFORMED_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0">
  <channel>
    <title>Broken dates</title>
    <item>
      <title>Undated</title>
      <enclosure url="https://example.com/undated.mp3" type="audio/mpeg"/>
    </item>
  </channel>
</rss>"#;

    fn client(feed: &str) -> MockHttpClient {
        MockHttpClient {
            feed_xml: feed.to_string(),
            audio_data: b"fake audio".to_vec(),
        }
    }

    fn podcast(name: &str, dir: &Path) -> PodcastConfig {
        PodcastConfig {
            name: name.to_string(),
            rss_link: format!("https://example.com/{name}/feed.xml"),
            path: dir.to_string_lossy().into_owned(),
            require_date: false,
            disable: false,
            if_directory_empty: None,
        }
    }

    fn config(policy: DirectoryPolicy, podcasts: Vec<PodcastConfig>) -> Config {
        Config {
            if_directory_empty: policy,
            podcasts,
            ..Config::default()
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 16)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn empty_directory_downloads_last_episode() {
        let dir = tempdir().unwrap();
        let config = config(DirectoryPolicy::DownloadLast, vec![podcast("show", dir.path())]);

        let result = sync_podcasts_at(&client(SAMPLE_FEED), &config, now(), NoopReporter::shared()).await;

        assert_eq!(result.downloaded, 1);
        assert_eq!(result.failed, 0);
        assert_eq!(files_in(dir.path()), vec!["ep3.mp3"]);
    }

    #[tokio::test]
    async fn second_run_finds_nothing_new() {
        let dir = tempdir().unwrap();
        let config = config(DirectoryPolicy::DownloadLast, vec![podcast("show", dir.path())]);
        let client = client(SAMPLE_FEED);

        sync_podcasts_at(&client, &config, now(), NoopReporter::shared()).await;
        let result = sync_podcasts_at(&client, &config, now(), NoopReporter::shared()).await;

        assert_eq!(result.downloaded, 0);
        assert_eq!(files_in(dir.path()), vec!["ep3.mp3"]);
    }

    #[tokio::test]
    async fn marker_limits_download_to_newer_episodes() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("ep1.mp3"), b"old").unwrap();
        let config = config(DirectoryPolicy::DownloadLast, vec![podcast("show", dir.path())]);

        let planned = plan_podcast(
            &client(SAMPLE_FEED),
            &config,
            &config.podcasts[0],
            now(),
            &NoopReporter::shared(),
        )
        .await
        .unwrap();

        let names: Vec<_> = planned.iter().map(Entry::to_file_name).collect();
        assert_eq!(names, vec!["ep2.mp3", "ep3.mp3"]);
    }

    #[tokio::test]
    async fn download_all_fetches_every_audio_entry() {
        let dir = tempdir().unwrap();
        let mut show = podcast("show", dir.path());
        show.require_date = true;
        let config = config(DirectoryPolicy::DownloadAll, vec![show]);

        let result = sync_podcasts_at(&client(SAMPLE_FEED), &config, now(), NoopReporter::shared()).await;

        assert_eq!(result.downloaded, 3);
        assert_eq!(
            files_in(dir.path()),
            vec!["[20230101] ep1.mp3", "[20230110] ep2.mp3", "[20230115] ep3.mp3"]
        );
    }

    #[tokio::test]
    async fn day_policy_uses_cutoff_from_now() {
        let dir = tempdir().unwrap();
        let mut show = podcast("show", dir.path());
        show.if_directory_empty = Some(DirectoryPolicy::DownloadFromDays(7));
        let config = config(DirectoryPolicy::DownloadLast, vec![show]);

        let planned = plan_podcast(
            &client(SAMPLE_FEED),
            &config,
            &config.podcasts[0],
            now(),
            &NoopReporter::shared(),
        )
        .await
        .unwrap();

        let names: Vec<_> = planned.iter().map(Entry::to_file_name).collect();
        assert_eq!(names, vec!["ep2.mp3", "ep3.mp3"]);
    }

    #[tokio::test]
    async fn downloads_limit_spans_podcasts_and_starts_oldest() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        let mut config = config(
            DirectoryPolicy::DownloadAll,
            vec![podcast("first", first.path()), podcast("second", second.path())],
        );
        config.downloads_limit = Some(2);

        let result = sync_podcasts_at(&client(SAMPLE_FEED), &config, now(), NoopReporter::shared()).await;

        assert_eq!(result.downloaded, 2);
        assert_eq!(files_in(first.path()), vec!["ep1.mp3", "ep2.mp3"]);
        assert!(files_in(second.path()).is_empty());
    }

    #[tokio::test]
    async fn disabled_podcasts_are_skipped() {
        let dir = tempdir().unwrap();
        let mut show = podcast("show", dir.path());
        show.disable = true;
        let config = config(DirectoryPolicy::DownloadAll, vec![show]);

        let result = sync_podcasts_at(&client(SAMPLE_FEED), &config, now(), NoopReporter::shared()).await;

        assert_eq!(result.downloaded, 0);
        assert!(files_in(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn malformed_feed_fails_only_that_podcast() {
        let dir = tempdir().unwrap();
        let config = config(DirectoryPolicy::DownloadAll, vec![podcast("show", dir.path())]);

        let result = sync_podcasts_at(&client(MALFORMED_FEED), &config, now(), NoopReporter::shared()).await;

        assert_eq!(result.downloaded, 0);
        assert_eq!(result.failed_podcasts.len(), 1);
        assert!(result.failed_podcasts[0].1.contains("malformed"));
    }

    #[tokio::test]
    async fn unavailable_feed_names_the_url() {
        let dir = tempdir().unwrap();
        let mut show = podcast("show", dir.path());
        show.rss_link = dir.path().join("missing.xml").to_string_lossy().into_owned();
        let config = config(DirectoryPolicy::DownloadAll, vec![show]);

        let result = sync_podcasts_at(&client(SAMPLE_FEED), &config, now(), NoopReporter::shared()).await;

        assert_eq!(result.failed_podcasts.len(), 1);
        assert!(result.failed_podcasts[0].1.contains("missing.xml"));
    }

    #[tokio::test]
    async fn failed_download_does_not_stop_the_run() {
        let dir = tempdir().unwrap();
        let feed = SAMPLE_FEED.replace("ep2.mp3", "broken.mp3");
        let config = config(DirectoryPolicy::DownloadAll, vec![podcast("show", dir.path())]);

        let result = sync_podcasts_at(&client(&feed), &config, now(), NoopReporter::shared()).await;

        assert_eq!(result.downloaded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failed_episodes[0].0, "broken.mp3");
        assert_eq!(files_in(dir.path()), vec!["ep1.mp3", "ep3.mp3"]);
    }

    #[test]
    fn budget_without_limit_never_runs_out() {
        let mut budget = DownloadBudget { remaining: None };
        assert!((0..100).all(|_| budget.take()));
    }

    #[test]
    fn budget_counts_down() {
        let mut budget = DownloadBudget { remaining: Some(1) };
        assert!(budget.take());
        assert!(!budget.take());
    }
}
