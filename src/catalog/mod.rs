// Media catalog: a read-only snapshot of the video files under one location

pub mod discover;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{VflowError, Result};

/// Where a file's resolved timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    Created,
    Modified,
}

/// Identity snapshot of one media file: (name, size, timestamp)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub timestamp: DateTime<Local>,
    pub timestamp_source: TimestampSource,
}

impl MediaFile {
    pub fn new(
        path: impl Into<PathBuf>,
        size: u64,
        timestamp: DateTime<Local>,
        timestamp_source: TimestampSource,
    ) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self { path, name, size, timestamp, timestamp_source }
    }

    /// Stat a file and resolve its best-available timestamp
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path)?;
        let (timestamp, source) = resolve_timestamp(meta.created().ok(), meta.modified().ok())
            .ok_or_else(|| VflowError::Other(format!(
                "No usable timestamp for {}", path.display()
            )))?;
        Ok(Self::new(path, meta.len(), timestamp, source))
    }

    /// File name without extension
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(idx) if idx > 0 => &self.name[..idx],
            _ => &self.name,
        }
    }

    /// Calendar date of the resolved timestamp
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Pick creation time when it is present and plausible, else modification time.
/// A birth time later than the mtime means the file was copied and the
/// birth time records the copy, not the recording.
pub fn resolve_timestamp(
    created: Option<SystemTime>,
    modified: Option<SystemTime>,
) -> Option<(DateTime<Local>, TimestampSource)> {
    match (created, modified) {
        (Some(c), Some(m)) if c <= m => Some((c.into(), TimestampSource::Created)),
        (Some(c), None) => Some((c.into(), TimestampSource::Created)),
        (_, Some(m)) => Some((m.into(), TimestampSource::Modified)),
        (None, None) => None,
    }
}

/// Ordered, immutable set of media files scoped to one location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaCatalog {
    root: PathBuf,
    files: Vec<MediaFile>,
}

impl MediaCatalog {
    /// Recursively scan `root` for files whose extension is in `extensions`.
    /// Finding no video files is not an error.
    pub fn scan(root: &Path, extensions: &[&str]) -> Result<Self> {
        let paths = discover::discover_video_files(root, extensions)?;
        let mut files = Vec::with_capacity(paths.len());

        for path in &paths {
            match MediaFile::from_path(path) {
                Ok(file) => files.push(file),
                Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
            }
        }

        log::debug!("Scanned {}: {} video files", root.display(), files.len());

        Ok(Self { root: root.to_path_buf(), files })
    }

    /// Build a catalog from an existing metadata snapshot
    pub fn from_files(root: impl Into<PathBuf>, files: Vec<MediaFile>) -> Self {
        Self { root: root.into(), files }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn files(&self) -> &[MediaFile] {
        &self.files
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MediaFile> {
        self.files.iter()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Earliest and latest calendar dates, or None for an empty catalog
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.files.iter().map(MediaFile::date).min()?;
        let last = self.files.iter().map(MediaFile::date).max()?;
        Some((first, last))
    }

    pub fn into_files(self) -> Vec<MediaFile> {
        self.files
    }
}

impl<'a> IntoIterator for &'a MediaCatalog {
    type Item = &'a MediaFile;
    type IntoIter = std::slice::Iter<'a, MediaFile>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::VIDEO_EXTENSIONS;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_timestamp_prefers_plausible_creation_time() {
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000);
        let created = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);

        let (ts, source) = resolve_timestamp(Some(created), Some(modified)).unwrap();
        assert_eq!(source, TimestampSource::Created);
        assert_eq!(SystemTime::from(ts), created);
    }

    #[test]
    fn test_resolve_timestamp_falls_back_when_creation_is_after_modification() {
        let modified = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let created = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000);

        let (ts, source) = resolve_timestamp(Some(created), Some(modified)).unwrap();
        assert_eq!(source, TimestampSource::Modified);
        assert_eq!(SystemTime::from(ts), modified);

        let (_, source) = resolve_timestamp(None, Some(modified)).unwrap();
        assert_eq!(source, TimestampSource::Modified);
        assert!(resolve_timestamp(None, None).is_none());
    }

    #[test]
    fn test_scan_builds_identity() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("A.mp4"), vec![0u8; 100]).unwrap();
        fs::write(tmp.path().join("B.MOV"), vec![0u8; 200]).unwrap();
        fs::write(tmp.path().join("notes.txt"), b"ignore me").unwrap();

        let catalog = MediaCatalog::scan(tmp.path(), &VIDEO_EXTENSIONS).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.files()[0].name, "A.mp4");
        assert_eq!(catalog.files()[0].size, 100);
        assert_eq!(catalog.files()[1].name, "B.MOV");
        assert_eq!(catalog.total_bytes(), 300);
    }

    #[test]
    fn test_scan_empty_directory_is_not_an_error() {
        let tmp = TempDir::new().unwrap();
        let catalog = MediaCatalog::scan(tmp.path(), &VIDEO_EXTENSIONS).unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.date_range().is_none());
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let tmp = TempDir::new().unwrap();
        let result = MediaCatalog::scan(&tmp.path().join("card"), &VIDEO_EXTENSIONS);
        assert!(matches!(result, Err(VflowError::Scan { .. })));
    }

    #[test]
    fn test_stem() {
        let ts = Local::now();
        let f = MediaFile::new("/card/C3317.MP4", 1, ts, TimestampSource::Modified);
        assert_eq!(f.stem(), "C3317");
        let f = MediaFile::new("/card/.hidden", 1, ts, TimestampSource::Modified);
        assert_eq!(f.stem(), ".hidden");
        let f = MediaFile::new("/card/clip.v2.mov", 1, ts, TimestampSource::Modified);
        assert_eq!(f.stem(), "clip.v2");
    }
}
