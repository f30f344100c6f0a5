// On-disk layout of laptop, archive and work SSD locations

use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::Result;
use crate::plan::{DestinationRoot, DiskSpaceProbe, Tier};

/// `Video/<folder>` under the archive root
pub fn archive_prefix(folder: &str) -> PathBuf {
    Path::new(ARCHIVE_VIDEO_FOLDER).join(folder)
}

/// `<archive>/Video/<folder>/<shoot>`
pub fn archive_shoot_dir(archive: &Path, folder: &str, shoot: &str) -> PathBuf {
    archive.join(archive_prefix(folder)).join(shoot)
}

/// `<ssd>/<shoot>`
pub fn project_dir(work_ssd: &Path, shoot: &str) -> PathBuf {
    work_ssd.join(shoot)
}

/// Create the standard editing project folders for a shoot
pub fn create_project_structure(work_ssd: &Path, shoot: &str) -> Result<PathBuf> {
    let project = project_dir(work_ssd, shoot);
    for folder in PROJECT_FOLDERS {
        fs::create_dir_all(project.join(folder))?;
    }
    Ok(project)
}

/// Ingest destinations in priority order: laptop first, archive last so a
/// laptop failure can never prevent the archive copy.
pub fn ingest_destinations(laptop: &Path, archive: &Path, reserve_bytes: u64) -> Vec<DestinationRoot> {
    let probe = DiskSpaceProbe { reserve_bytes };
    vec![
        DestinationRoot::new(LOCATION_LAPTOP, laptop, Tier::Workspace).with_probe(probe.clone()),
        DestinationRoot::new(LOCATION_ARCHIVE, archive, Tier::Archive)
            .with_layout(archive_prefix(ARCHIVE_RAW_FOLDER), "")
            .with_probe(probe),
    ]
}

/// Work SSD project subfolder as a destination, e.g. `<ssd>/<shoot>/01_Source`
pub fn project_destination(work_ssd: &Path, folder: &str, reserve_bytes: u64) -> DestinationRoot {
    DestinationRoot::new(LOCATION_WORK_SSD, work_ssd, Tier::Workspace)
        .with_layout("", folder)
        .with_probe(DiskSpaceProbe { reserve_bytes })
}
