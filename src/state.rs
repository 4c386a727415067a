use std::path::Path;
use std::time::SystemTime;

use crate::entry::PARTIAL_SUFFIX;
use crate::error::StateError;

/// What a podcast directory tells about earlier runs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryState {
    /// File name of the most recently downloaded episode
    pub last_downloaded: Option<String>,
    /// Number of partial files that were cleaned up during scan
    pub partial_files_cleaned: usize,
}

/// Scan a podcast directory for the last downloaded episode
///
/// The directory is created when missing. Leftover `.partial` files from
/// interrupted downloads are removed. Among files ending in `extension`
/// (case-insensitive) the one modified last wins, ties going to the greater
/// name.
pub fn last_downloaded_file(dir: &Path, extension: &str) -> Result<DirectoryState, StateError> {
    let mut state = DirectoryState::default();

    if !dir.exists() {
        std::fs::create_dir_all(dir).map_err(|e| StateError::CreateDirectoryFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        return Ok(state);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| StateError::ReadDirectoryFailed {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let extension = extension.to_lowercase();
    let mut newest: Option<(SystemTime, String)> = None;

    for entry in entries {
        let entry = entry.map_err(|e| StateError::ReadDirectoryFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };

        if file_name.ends_with(PARTIAL_SUFFIX) {
            if std::fs::remove_file(&path).is_ok() {
                state.partial_files_cleaned += 1;
            }
            continue;
        }

        if !path.is_file() || !file_name.to_lowercase().ends_with(&extension) {
            continue;
        }

        let modified = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        let candidate = (modified, file_name);
        if newest.as_ref().is_none_or(|current| candidate > *current) {
            newest = Some(candidate);
        }
    }

    state.last_downloaded = newest.map(|(_, file_name)| file_name);
    Ok(state)
}
