use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

use super::filename::Entry;

/// Suffix of files that are still being written
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Position of a download within the current podcast's queue
#[derive(Debug, Clone)]
pub struct DownloadContext {
    /// Index of this entry in the download queue
    pub index: usize,
    /// Total number of entries queued for this podcast
    pub total: usize,
}

/// Download an entry's audio link into `output_dir`
///
/// Bytes go to `<file name>.partial` first and the file is renamed once the
/// stream is complete, so an interrupted run never leaves a file that looks
/// finished. Returns the number of bytes downloaded.
pub async fn download_entry<C: HttpClient>(
    client: &C,
    entry: &Entry,
    output_dir: &Path,
    context: &DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let url = entry.link();
    let file_name = entry.to_file_name();
    let output_path = output_dir.join(&file_name);
    let partial_path = partial_path_for(&output_path);

    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if response.status >= 400 {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    reporter.report(ProgressEvent::DownloadStarting {
        file_name: file_name.clone(),
        index: context.index,
        total: context.total,
        content_length: response.content_length,
    });

    let mut file =
        File::create(&partial_path)
            .await
            .map_err(|e| DownloadError::FileCreateFailed {
                path: partial_path.clone(),
                source: e,
            })?;

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: partial_path.clone(),
                source: e,
            })?;

        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            file_name: file_name.clone(),
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: partial_path.clone(),
            source: e,
        })?;
    drop(file);

    tokio::fs::rename(&partial_path, &output_path)
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: output_path.clone(),
            source: e,
        })?;

    reporter.report(ProgressEvent::DownloadCompleted {
        file_name,
        bytes_downloaded,
    });

    Ok(bytes_downloaded)
}

fn partial_path_for(output_path: &Path) -> PathBuf {
    let mut partial = output_path.as_os_str().to_owned();
    partial.push(PARTIAL_SUFFIX);
    PathBuf::from(partial)
}
