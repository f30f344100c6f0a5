// Verified file copy and CopyPlan execution

use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::constants::HASH_CHUNK_SIZE;
use crate::error::{VflowError, Result};
use crate::hash::{compute_full_hash, verify_hash};
use crate::plan::{CopyAction, CopyPlan};

/// How a plan is carried out
#[derive(Debug, Clone, Copy, Default)]
pub struct ExecuteOptions {
    /// Replace destination files whose size differs from the source
    pub overwrite: bool,
    /// Remove each source file once it is verified at the destination
    pub move_source: bool,
}

/// Per-destination outcome of executing a CopyPlan
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub destination: String,
    pub copied: usize,
    pub skipped: usize,
    pub bytes_copied: u64,
    /// Size-mismatched files left untouched because overwrite was not allowed
    pub refused_overwrites: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub sources_removed: usize,
}

impl ExecutionReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.refused_overwrites.is_empty()
    }
}

/// Copy every file in the plan's copy-set. Failures are collected per file
/// and never stop the remaining copies.
pub fn execute_plan(plan: &CopyPlan, options: &ExecuteOptions) -> ExecutionReport {
    let mut report = ExecutionReport {
        destination: plan.destination.clone(),
        skipped: plan.to_skip.len(),
        ..Default::default()
    };

    if !plan.to_copy.is_empty() {
        if let Err(e) = fs::create_dir_all(&plan.target_dir) {
            let reason = format!("cannot create {}: {}", plan.target_dir.display(), e);
            log::error!("{}", reason);
            report.failed = plan
                .to_copy
                .iter()
                .map(|c| (c.file.path.clone(), reason.clone()))
                .collect();
            return report;
        }
    }

    let mut claimed: HashSet<&Path> = plan.to_skip.iter().map(|s| s.dest_path.as_path()).collect();

    for planned in &plan.to_copy {
        if !claimed.insert(planned.dest_path.as_path()) {
            log::error!(
                "{} is already the destination of another file; not copying {}",
                planned.dest_path.display(),
                planned.file.path.display()
            );
            report
                .failed
                .push((planned.file.path.clone(), "destination claimed by another file".to_string()));
            continue;
        }

        if planned.action == CopyAction::Overwrite && !options.overwrite {
            log::warn!(
                "Not overwriting {} ({} bytes at destination, {} at source)",
                planned.dest_path.display(),
                planned.existing_size.unwrap_or(0),
                planned.file.size
            );
            report.refused_overwrites.push(planned.dest_path.clone());
            continue;
        }

        match copy_with_verify(&planned.file.path, &planned.dest_path) {
            Ok(_) => {
                report.copied += 1;
                report.bytes_copied += planned.file.size;
                log::info!("Copied {} -> {}", planned.file.name, planned.dest_path.display());
                if options.move_source {
                    remove_source(&planned.file.path, &mut report);
                }
            }
            Err(e) => {
                log::error!("Failed to copy {}: {}", planned.file.path.display(), e);
                report.failed.push((planned.file.path.clone(), e.to_string()));
            }
        }
    }

    if options.move_source {
        // Already present by name and size; only drop the source once the bytes agree
        for skip in &plan.to_skip {
            let source = &skip.file.path;
            match same_content(source, &skip.dest_path) {
                Ok(true) => remove_source(source, &mut report),
                Ok(false) => {
                    log::warn!(
                        "{} differs from {}; leaving source in place",
                        source.display(),
                        skip.dest_path.display()
                    );
                    report.failed.push((source.clone(), "content differs at destination".to_string()));
                }
                Err(e) => report.failed.push((source.clone(), e.to_string())),
            }
        }
    }

    report
}

fn remove_source(path: &Path, report: &mut ExecutionReport) {
    match fs::remove_file(path) {
        Ok(()) => report.sources_removed += 1,
        Err(e) => {
            log::warn!("Copied but could not remove source {}: {}", path.display(), e);
            report.failed.push((path.to_path_buf(), format!("source not removed: {}", e)));
        }
    }
}

fn same_content(a: &Path, b: &Path) -> Result<bool> {
    verify_hash(b, &compute_full_hash(a)?)
}

/// Copy via a temp file in the destination directory, verify by BLAKE3,
/// then rename into place. The final path only appears once verified.
/// Returns the verified hash.
pub fn copy_with_verify(source: &Path, dest: &Path) -> Result<String> {
    let source_hash = compute_full_hash(source)?;

    let dest_dir = dest.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(dest_dir)?;
    let file_name = dest
        .file_name()
        .ok_or_else(|| VflowError::InvalidPath(format!("No filename: {}", dest.display())))?;
    let temp_path = dest_dir.join(format!(
        "{}{}",
        crate::constants::TEMP_FILE_PREFIX,
        file_name.to_string_lossy()
    ));

    if let Err(e) = stream_copy(source, &temp_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    let dest_hash = compute_full_hash(&temp_path)?;
    if dest_hash != source_hash {
        let _ = fs::remove_file(&temp_path);
        return Err(VflowError::Verification(format!(
            "hash mismatch copying {} ({} vs {})",
            source.display(),
            source_hash,
            dest_hash
        )));
    }

    fs::rename(&temp_path, dest)?;

    // Preserve modification time
    if let Ok(modified) = fs::metadata(source).and_then(|m| m.modified()) {
        let _ = filetime::set_file_mtime(dest, filetime::FileTime::from_system_time(modified));
    }

    Ok(source_hash)
}

fn stream_copy(source: &Path, dest: &Path) -> Result<()> {
    let mut source_file = fs::File::open(source)?;
    let mut dest_file = fs::File::create(dest)?;
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = source_file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        dest_file.write_all(&buffer[..n])?;
    }
    dest_file.sync_all()?;
    Ok(())
}
