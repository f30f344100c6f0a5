// File discovery for catalog scans

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use crate::error::{VflowError, Result};

/// Discover all video files under a root, sorted by path.
/// A root that is itself a recognized file yields just that file.
pub fn discover_video_files(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(root).map_err(|e| VflowError::Scan {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();

    if meta.is_file() {
        if is_video_file(root, extensions) {
            files.push(root.to_path_buf());
        }
        return Ok(files);
    }

    // Probe readability up front so an unreadable root fails loudly
    // instead of producing an empty catalog
    fs::read_dir(root).map_err(|e| VflowError::Scan {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };
        let path = entry.path();
        if entry.file_type().is_file() && is_video_file(path, extensions) && !is_hidden(path) {
            files.push(path.to_path_buf());
        }
    }

    // Sort by path for consistent ordering
    files.sort();

    Ok(files)
}

/// Check if a file is a recognized video file based on extension
pub fn is_video_file(path: &Path, extensions: &[&str]) -> bool {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(e) => e.to_lowercase(),
        None => return false,
    };

    extensions.iter().any(|allowed| allowed.eq_ignore_ascii_case(&ext))
}

/// macOS drops `._NAME` resource forks next to every file on exFAT cards
fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |n| n.starts_with("._"))
}
