// Metadata transfer between original clips and their exports

pub mod exiftool;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::catalog::discover::discover_video_files;
use crate::error::Result;

/// Outcome of a folder-to-folder metadata copy
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataCopyReport {
    pub copied: usize,
    pub failed: Vec<(PathBuf, String)>,
    pub unmatched: Vec<PathBuf>,
}

/// Pair each target with the source that has the same file stem
/// (case-insensitive). Targets without a source are returned separately.
pub fn pair_by_stem(sources: &[PathBuf], targets: &[PathBuf]) -> (Vec<(PathBuf, PathBuf)>, Vec<PathBuf>) {
    let by_stem: HashMap<String, &PathBuf> = sources
        .iter()
        .filter_map(|p| stem_key(p).map(|k| (k, p)))
        .collect();

    let mut pairs = Vec::new();
    let mut unmatched = Vec::new();
    for target in targets {
        match stem_key(target).and_then(|k| by_stem.get(&k)) {
            Some(source) => pairs.push(((*source).clone(), target.clone())),
            None => unmatched.push(target.clone()),
        }
    }
    (pairs, unmatched)
}

fn stem_key(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().to_lowercase())
}

/// Copy metadata from every original in `source_folder` onto the export in
/// `target_folder` with the same stem. Per-file failures are collected.
pub fn copy_metadata_folder(
    source_folder: &Path,
    target_folder: &Path,
    extensions: &[&str],
) -> Result<MetadataCopyReport> {
    let sources = discover_video_files(source_folder, extensions)?;
    let targets = discover_video_files(target_folder, extensions)?;
    let (pairs, unmatched) = pair_by_stem(&sources, &targets);

    let mut report = MetadataCopyReport {
        unmatched,
        ..Default::default()
    };

    for (source, target) in &pairs {
        match exiftool::copy_metadata(source, target) {
            Ok(()) => report.copied += 1,
            Err(e) => {
                log::warn!("Metadata copy failed for {}: {}", target.display(), e);
                report.failed.push((target.clone(), e.to_string()));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_by_stem() {
        let sources = vec![PathBuf::from("/raw/C0001.MP4"), PathBuf::from("/raw/C0002.MP4")];
        let targets = vec![
            PathBuf::from("/exports/c0001.mov"),
            PathBuf::from("/exports/C0003.mov"),
        ];

        let (pairs, unmatched) = pair_by_stem(&sources, &targets);
        assert_eq!(pairs, vec![(PathBuf::from("/raw/C0001.MP4"), PathBuf::from("/exports/c0001.mov"))]);
        assert_eq!(unmatched, vec![PathBuf::from("/exports/C0003.mov")]);
    }
}
