// Reconciliation planning: what each destination is missing for a shoot

pub mod destination;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::catalog::MediaFile;
use crate::error::{VflowError, Result};
use crate::shoot::ShootBucket;
pub use destination::{Availability, AvailabilityProbe, DestinationRoot, DiskSpaceProbe, FixedAvailability, Tier};

/// Why a file needs copying
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyAction {
    /// Not present at the destination
    Copy,
    /// Present under the same name with a different size
    Overwrite,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedCopy {
    pub file: MediaFile,
    pub dest_path: PathBuf,
    pub action: CopyAction,
    pub existing_size: Option<u64>,
    /// Stored under a suffixed name because another file of the shoot has the same name
    pub renamed: bool,
}

/// A file already present at the destination
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedSkip {
    pub file: MediaFile,
    pub dest_path: PathBuf,
}

/// Copy/skip split of one shoot against one destination.
/// `to_copy` and `to_skip` are disjoint and together hold every file of the shoot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyPlan {
    pub destination: String,
    pub tier: Tier,
    pub target_dir: PathBuf,
    pub to_copy: Vec<PlannedCopy>,
    pub to_skip: Vec<PlannedSkip>,
}

impl CopyPlan {
    pub fn bytes_to_copy(&self) -> u64 {
        self.to_copy.iter().map(|c| c.file.size).sum()
    }

    pub fn overwrite_candidates(&self) -> impl Iterator<Item = &PlannedCopy> {
        self.to_copy.iter().filter(|c| c.action == CopyAction::Overwrite)
    }

    pub fn is_up_to_date(&self) -> bool {
        self.to_copy.is_empty()
    }

    pub fn renamed(&self) -> impl Iterator<Item = &PlannedCopy> {
        self.to_copy.iter().filter(|c| c.renamed)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationSkip {
    pub destination: String,
    pub reason: String,
}

/// Plans for every destination that could take the shoot, plus the ones that couldn't
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub shoot: String,
    pub plans: Vec<CopyPlan>,
    pub unavailable: Vec<DestinationSkip>,
}

impl ReconciliationReport {
    /// No destination produced a plan
    pub fn is_total_failure(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn plan_for(&self, destination: &str) -> Option<&CopyPlan> {
        self.plans.iter().find(|p| p.destination == destination)
    }

    /// Turn a total failure into `TotalReconciliationFailure`
    pub fn ensure_any(self) -> Result<Self> {
        if self.is_total_failure() {
            return Err(VflowError::TotalReconciliationFailure { bucket: self.shoot });
        }
        Ok(self)
    }
}

/// Plan a shoot against an ordered list of destinations.
/// Each destination is handled independently: an unavailable one is recorded
/// and skipped, and later destinations are still planned.
pub fn plan(bucket: &ShootBucket, destinations: &[DestinationRoot]) -> ReconciliationReport {
    let mut report = ReconciliationReport {
        shoot: bucket.name.clone(),
        plans: Vec::with_capacity(destinations.len()),
        unavailable: Vec::new(),
    };

    let names = destination_names(bucket);

    for dest in destinations {
        match plan_with_names(bucket, &names, dest) {
            Ok(copy_plan) => {
                log::debug!(
                    "{} -> {}: {} to copy, {} already present",
                    bucket.name,
                    dest.label,
                    copy_plan.to_copy.len(),
                    copy_plan.to_skip.len()
                );
                report.plans.push(copy_plan);
            }
            Err(e) => {
                log::warn!("{}", e);
                report.unavailable.push(DestinationSkip {
                    destination: dest.label.clone(),
                    reason: match e {
                        VflowError::DestinationUnavailable { reason, .. } => reason,
                        other => other.to_string(),
                    },
                });
            }
        }
    }

    report
}

/// Classify every file of the shoot against one destination
pub fn plan_destination(bucket: &ShootBucket, dest: &DestinationRoot) -> Result<CopyPlan> {
    plan_with_names(bucket, &destination_names(bucket), dest)
}

fn plan_with_names(bucket: &ShootBucket, names: &[String], dest: &DestinationRoot) -> Result<CopyPlan> {
    let unavailable = |reason: String| VflowError::DestinationUnavailable {
        label: dest.label.clone(),
        reason,
    };

    let target_dir = dest.target_dir(&bucket.name);
    let existing = existing_files(&target_dir).map_err(|e| unavailable(e.to_string()))?;

    let mut to_copy = Vec::new();
    let mut to_skip = Vec::new();

    for (file, name) in bucket.files.iter().zip(names) {
        let dest_path = target_dir.join(name);
        let renamed = *name != file.name;
        match existing.get(name) {
            Some(&size) if size == file.size => to_skip.push(PlannedSkip {
                file: file.clone(),
                dest_path,
            }),
            Some(&size) => to_copy.push(PlannedCopy {
                file: file.clone(),
                dest_path,
                action: CopyAction::Overwrite,
                existing_size: Some(size),
                renamed,
            }),
            None => to_copy.push(PlannedCopy {
                file: file.clone(),
                dest_path,
                action: CopyAction::Copy,
                existing_size: None,
                renamed,
            }),
        }
    }

    let copy_plan = CopyPlan {
        destination: dest.label.clone(),
        tier: dest.tier,
        target_dir,
        to_copy,
        to_skip,
    };

    if let Availability::Unavailable(reason) = dest.check_availability(copy_plan.bytes_to_copy()) {
        return Err(unavailable(reason));
    }

    Ok(copy_plan)
}

/// Regular files directly inside `dir`, by name. A missing directory is empty.
pub fn existing_files(dir: &Path) -> Result<HashMap<String, u64>> {
    let mut files = HashMap::new();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e.into()),
    };

    for entry in entries {
        let entry = entry?;
        let meta = entry.metadata()?;
        if meta.is_file() {
            files.insert(entry.file_name().to_string_lossy().to_string(), meta.len());
        }
    }

    Ok(files)
}

/// File name each file of the shoot is stored under, in bucket order.
///
/// Cards with several clip folders can repeat a name. The first file keeps it and
/// later ones get `{stem}_{n}{ext}` with the lowest `n` that no other file uses.
/// Names are compared case-insensitively so the result also holds on exFAT and APFS.
/// The result depends only on the bucket, so repeated plans agree.
pub fn destination_names(bucket: &ShootBucket) -> Vec<String> {
    let taken: HashSet<String> = bucket.files.iter().map(|f| f.name.to_lowercase()).collect();
    let mut assigned = HashSet::new();
    let mut names = Vec::with_capacity(bucket.files.len());

    for file in &bucket.files {
        if assigned.insert(file.name.to_lowercase()) {
            names.push(file.name.clone());
            continue;
        }

        let (stem, ext) = match file.name.rfind('.') {
            Some(dot) if dot > 0 => file.name.split_at(dot),
            _ => (file.name.as_str(), ""),
        };
        let mut n = 1;
        let name = loop {
            let candidate = format!("{}_{}{}", stem, n, ext);
            let lower = candidate.to_lowercase();
            if !taken.contains(&lower) && assigned.insert(lower) {
                break candidate;
            }
            n += 1;
        };

        log::warn!(
            "Shoot '{}' has more than one file named {}; {} is stored as {}",
            bucket.name,
            file.name,
            file.path.display(),
            name
        );
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TimestampSource;
    use chrono::{Local, TimeZone};
    use tempfile::TempDir;

    fn bucket(files: &[(&str, u64)]) -> ShootBucket {
        let ts = Local.with_ymd_and_hms(2025, 9, 15, 10, 0, 0).unwrap();
        let files = files
            .iter()
            .map(|(name, size)| MediaFile::new(format!("/card/{}", name), *size, ts, TimestampSource::Modified))
            .collect();
        ShootBucket::named("2025-09-15_Trip", files)
    }

    fn available(label: &str, root: &Path, tier: Tier) -> DestinationRoot {
        DestinationRoot::new(label, root, tier).with_probe(FixedAvailability(Availability::Available))
    }

    fn write_existing(dir: &Path, name: &str, size: usize) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), vec![0u8; size]).unwrap();
    }

    /// Simulate the executor: materialize every planned copy at its destination
    fn apply(copy_plan: &CopyPlan) {
        for planned in &copy_plan.to_copy {
            fs::create_dir_all(&copy_plan.target_dir).unwrap();
            fs::write(&planned.dest_path, vec![0u8; planned.file.size as usize]).unwrap();
        }
    }

    #[test]
    fn test_skip_present_copy_missing() {
        let tmp = TempDir::new().unwrap();
        let dest = available("archive", tmp.path(), Tier::Archive);
        write_existing(&dest.target_dir("2025-09-15_Trip"), "A.mp4", 100);

        let report = plan(&bucket(&[("A.mp4", 100), ("B.mp4", 200)]), &[dest]);
        let p = report.plan_for("archive").unwrap();

        let skipped: Vec<_> = p.to_skip.iter().map(|s| s.file.name.as_str()).collect();
        let copied: Vec<_> = p.to_copy.iter().map(|c| c.file.name.as_str()).collect();
        assert_eq!(skipped, vec!["A.mp4"]);
        assert_eq!(copied, vec!["B.mp4"]);
        assert_eq!(p.to_copy[0].action, CopyAction::Copy);
        assert_eq!(p.bytes_to_copy(), 200);
    }

    #[test]
    fn test_size_mismatch_is_flagged_overwrite() {
        let tmp = TempDir::new().unwrap();
        let dest = available("archive", tmp.path(), Tier::Archive);
        write_existing(&dest.target_dir("2025-09-15_Trip"), "A.mp4", 100);

        let report = plan(&bucket(&[("A.mp4", 150)]), &[dest]);
        let p = report.plan_for("archive").unwrap();

        assert!(p.to_skip.is_empty());
        assert_eq!(p.to_copy.len(), 1);
        assert_eq!(p.to_copy[0].action, CopyAction::Overwrite);
        assert_eq!(p.to_copy[0].existing_size, Some(100));
        assert_eq!(p.overwrite_candidates().count(), 1);
    }

    #[test]
    fn test_unavailable_workspace_falls_back_to_archive() {
        let tmp = TempDir::new().unwrap();
        let laptop = DestinationRoot::new("laptop", tmp.path().join("laptop"), Tier::Workspace)
            .with_probe(FixedAvailability(Availability::Unavailable("disk full".into())));
        let archive = available("archive", &tmp.path().join("archive"), Tier::Archive);

        let report = plan(&bucket(&[("A.mp4", 1), ("B.mp4", 2), ("C.mp4", 3)]), &[laptop, archive]);

        assert_eq!(report.plans.len(), 1);
        assert!(report.plan_for("laptop").is_none());
        assert_eq!(report.plan_for("archive").unwrap().to_copy.len(), 3);
        assert_eq!(report.unavailable.len(), 1);
        assert_eq!(report.unavailable[0].destination, "laptop");
        assert_eq!(report.unavailable[0].reason, "disk full");
        assert!(!report.is_total_failure());
    }

    #[test]
    fn test_missing_root_uses_disk_probe_and_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let unplugged = DestinationRoot::new("laptop", tmp.path().join("gone"), Tier::Workspace);
        let archive = DestinationRoot::new("archive", tmp.path(), Tier::Archive);

        let report = plan(&bucket(&[("A.mp4", 1)]), &[unplugged, archive]);
        assert!(report.plan_for("laptop").is_none());
        assert!(report.plan_for("archive").is_some());
    }

    #[test]
    fn test_all_unavailable_is_total_failure() {
        let tmp = TempDir::new().unwrap();
        let dests = vec![
            DestinationRoot::new("laptop", tmp.path(), Tier::Workspace)
                .with_probe(FixedAvailability(Availability::Unavailable("full".into()))),
            DestinationRoot::new("archive", tmp.path(), Tier::Archive)
                .with_probe(FixedAvailability(Availability::Unavailable("unplugged".into()))),
        ];

        let report = plan(&bucket(&[("A.mp4", 1)]), &dests);
        assert!(report.is_total_failure());
        assert_eq!(report.unavailable.len(), 2);
        assert!(matches!(
            report.ensure_any(),
            Err(VflowError::TotalReconciliationFailure { .. })
        ));
    }

    #[test]
    fn test_plan_is_idempotent_and_converges() {
        let tmp = TempDir::new().unwrap();
        let dests = vec![
            available("laptop", &tmp.path().join("laptop"), Tier::Workspace),
            available("archive", &tmp.path().join("archive"), Tier::Archive).with_layout("Video/RAW", ""),
        ];
        let shoot = bucket(&[("A.mp4", 10), ("B.mp4", 20), ("C.mp4", 30)]);

        let first = plan(&shoot, &dests);
        let again = plan(&shoot, &dests);
        for (a, b) in first.plans.iter().zip(&again.plans) {
            assert_eq!(a.to_copy.len(), b.to_copy.len());
            assert_eq!(a.target_dir, b.target_dir);
        }

        for p in &first.plans {
            apply(p);
        }

        let after = plan(&shoot, &dests);
        assert_eq!(after.plans.len(), 2);
        for p in &after.plans {
            assert!(p.is_up_to_date(), "{} should have nothing left to copy", p.destination);
            assert_eq!(p.to_skip.len(), 3);
        }
    }

    #[test]
    fn test_planning_does_not_touch_filesystem() {
        let tmp = TempDir::new().unwrap();
        let dest = available("archive", tmp.path(), Tier::Archive).with_layout("Video/RAW", "");
        let shoot = bucket(&[("A.mp4", 10)]);

        for _ in 0..3 {
            let report = plan(&shoot, std::slice::from_ref(&dest));
            assert_eq!(report.plans[0].to_copy.len(), 1);
        }
        assert!(!tmp.path().join("Video").exists());
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_copy_and_skip_partition_the_shoot() {
        let tmp = TempDir::new().unwrap();
        let dest = available("archive", tmp.path(), Tier::Archive);
        let target = dest.target_dir("2025-09-15_Trip");
        write_existing(&target, "A.mp4", 1);
        write_existing(&target, "B.mp4", 99);
        write_existing(&target, "unrelated.mov", 5);

        let shoot = bucket(&[("A.mp4", 1), ("B.mp4", 2), ("C.mp4", 3)]);
        let report = plan(&shoot, &[dest]);
        let p = &report.plans[0];

        let mut all: Vec<String> = p.to_skip.iter().map(|s| s.file.name.clone()).collect();
        all.extend(p.to_copy.iter().map(|c| c.file.name.clone()));
        all.sort();
        assert_eq!(all, vec!["A.mp4", "B.mp4", "C.mp4"]);
        assert_eq!(p.to_skip.len() + p.to_copy.len(), shoot.len());
    }

    fn from_folders(files: &[(&str, &str, u64)]) -> ShootBucket {
        let ts = Local.with_ymd_and_hms(2025, 9, 15, 10, 0, 0).unwrap();
        let files = files
            .iter()
            .map(|(folder, name, size)| {
                MediaFile::new(format!("/card/{}/{}", folder, name), *size, ts, TimestampSource::Modified)
            })
            .collect();
        ShootBucket::named("2025-09-15_Trip", files)
    }

    #[test]
    fn test_same_name_in_two_clip_folders_gets_distinct_destinations() {
        let tmp = TempDir::new().unwrap();
        let dest = available("archive", tmp.path(), Tier::Archive);
        let shoot = from_folders(&[("100", "X.mp4", 15), ("101", "X.mp4", 27)]);

        let report = plan(&shoot, std::slice::from_ref(&dest));
        let p = report.plan_for("archive").unwrap();

        let dests: Vec<_> = p.to_copy.iter().map(|c| c.dest_path.clone()).collect();
        assert_eq!(dests, vec![p.target_dir.join("X.mp4"), p.target_dir.join("X_1.mp4")]);
        assert!(!p.to_copy[0].renamed);
        assert!(p.to_copy[1].renamed);
        assert_eq!(p.renamed().count(), 1);

        apply(p);
        let after = plan(&shoot, &[dest]);
        let p = after.plan_for("archive").unwrap();
        assert!(p.is_up_to_date());
        assert_eq!(p.to_skip.len(), 2);
    }

    #[test]
    fn test_renamed_duplicate_avoids_names_already_in_shoot() {
        let shoot = from_folders(&[("100", "X.mp4", 1), ("101", "x.MP4", 2), ("102", "X_1.mp4", 3)]);
        assert_eq!(destination_names(&shoot), vec!["X.mp4", "x_2.MP4", "X_1.mp4"]);
    }

    #[test]
    fn test_unique_names_are_kept() {
        let shoot = bucket(&[("A.mp4", 1), ("B.mp4", 2)]);
        assert_eq!(destination_names(&shoot), vec!["A.mp4", "B.mp4"]);
    }
}
