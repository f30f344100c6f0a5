// Workflows: ingest, prep, pull, archive, create-select, consolidate
//
// Each workflow scans, plans, then executes. Planning is read-only; with
// `dry_run` set nothing below the plan step touches the filesystem.

pub mod copy;
pub mod layout;


use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use serde::Serialize;

use crate::catalog::MediaCatalog;
use crate::constants::*;
use crate::error::{VflowError, Result};
use crate::metadata::exiftool;
use crate::plan::{self, DestinationRoot, DiskSpaceProbe, ReconciliationReport, Tier};
use crate::selector::{self, SelectorToken};
use crate::shoot::{resolve_shoots, ShootBucket, ShootRequest};
use copy::{copy_with_verify, execute_plan, ExecuteOptions, ExecutionReport};

/// Settings shared by every workflow
#[derive(Debug, Clone)]
pub struct RunContext {
    pub extensions: Vec<String>,
    pub reserve_bytes: u64,
    pub dry_run: bool,
    pub overwrite: bool,
}

impl RunContext {
    fn extensions(&self) -> Vec<&str> {
        self.extensions.iter().map(String::as_str).collect()
    }

    fn execute_options(&self, move_source: bool) -> ExecuteOptions {
        ExecuteOptions { overwrite: self.overwrite, move_source }
    }
}

/// Plan plus execution results for one shoot
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootOutcome {
    pub report: ReconciliationReport,
    pub executions: Vec<ExecutionReport>,
}

impl ShootOutcome {
    /// Nothing was backed up, or some copy failed
    pub fn has_failures(&self) -> bool {
        self.report.is_total_failure() || self.executions.iter().any(|e| !e.failed.is_empty())
    }
}

fn reconcile(bucket: &ShootBucket, destinations: &[DestinationRoot], ctx: &RunContext, move_source: bool) -> ShootOutcome {
    let report = plan::plan(bucket, destinations);

    if report.is_total_failure() {
        log::error!("No destination available for shoot '{}'; nothing copied", bucket.name);
        return ShootOutcome { report, executions: Vec::new() };
    }

    let executions = if ctx.dry_run {
        Vec::new()
    } else {
        let options = ctx.execute_options(move_source);
        report.plans.iter().map(|p| execute_plan(p, &options)).collect()
    };

    ShootOutcome { report, executions }
}

/// Pretty JSON for any workflow report
pub fn report_json<T: Serialize>(report: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

// --- ingest ---

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestSummary {
    pub files_found: usize,
    pub warnings: Vec<String>,
    pub shoots: Vec<ShootOutcome>,
}

impl IngestSummary {
    pub fn has_failures(&self) -> bool {
        self.shoots.iter().any(ShootOutcome::has_failures)
    }
}

/// Copy footage from a card to the laptop and the archive, one shoot folder
/// per detected shoot. Safe to re-run: files already present are skipped.
pub fn ingest_shoot(
    source: &Path,
    request: &ShootRequest<'_>,
    laptop: &Path,
    archive: &Path,
    ctx: &RunContext,
) -> Result<IngestSummary> {
    let catalog = MediaCatalog::scan(source, &ctx.extensions())?;
    let mut summary = IngestSummary {
        files_found: catalog.len(),
        ..Default::default()
    };

    if catalog.is_empty() {
        log::info!("No video files found in {}", source.display());
        return Ok(summary);
    }

    let resolution = resolve_shoots(&catalog, request)?;
    summary.warnings = resolution.warnings;

    let destinations = layout::ingest_destinations(laptop, archive, ctx.reserve_bytes);
    for bucket in &resolution.buckets {
        log::info!("Shoot '{}': {} files, {} bytes", bucket.name, bucket.len(), bucket.total_bytes());
        summary.shoots.push(reconcile(bucket, &destinations, ctx, false));
    }

    Ok(summary)
}

// --- prep ---

/// Move a shoot from the laptop into a new work SSD project (`01_Source`)
pub fn prep_shoot(shoot: &str, laptop: &Path, work_ssd: &Path, ctx: &RunContext) -> Result<ShootOutcome> {
    let source_dir = laptop.join(shoot);
    if !source_dir.is_dir() {
        return Err(VflowError::InvalidPath(format!(
            "Shoot '{}' not found on laptop: {}",
            shoot,
            source_dir.display()
        )));
    }

    let catalog = MediaCatalog::scan(&source_dir, &ctx.extensions())?;
    let bucket = ShootBucket::named(shoot, catalog.into_files());

    if !ctx.dry_run {
        layout::create_project_structure(work_ssd, shoot)?;
    }

    let dest = layout::project_destination(work_ssd, PROJECT_SOURCE_FOLDER, ctx.reserve_bytes);
    let outcome = reconcile(&bucket, std::slice::from_ref(&dest), ctx, true);

    if !ctx.dry_run && !outcome.has_failures() {
        remove_empty_dirs(&source_dir);
    }

    Ok(outcome)
}

/// Remove `dir` and its subdirectories if they hold no files
fn remove_empty_dirs(dir: &Path) {
    let mut dirs: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();
    // deepest first
    dirs.sort_by_key(|d| std::cmp::Reverse(d.components().count()));
    for d in dirs {
        let _ = fs::remove_dir(&d);
    }
}

// --- pull ---

/// What to pull from the archive
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PullSource {
    Raw,
    Selects,
    Both,
}

impl PullSource {
    /// (archive folder, project folder) pairs covered by this source
    fn folders(self) -> Vec<(&'static str, &'static str)> {
        let raw = (ARCHIVE_RAW_FOLDER, PROJECT_SOURCE_FOLDER);
        let selects = (ARCHIVE_SELECTS_FOLDER, PROJECT_SELECTS_FOLDER);
        match self {
            PullSource::Raw => vec![raw],
            PullSource::Selects => vec![selects],
            PullSource::Both => vec![raw, selects],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullSummary {
    pub warnings: Vec<String>,
    pub outcomes: Vec<ShootOutcome>,
}

impl PullSummary {
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(ShootOutcome::has_failures)
    }
}

/// Copy (not move) archived footage into the work SSD project.
/// `tokens` narrow the pull; tokens that match nothing become warnings.
pub fn pull_shoot(
    shoot: &str,
    work_ssd: &Path,
    archive: &Path,
    source: PullSource,
    tokens: &[SelectorToken],
    ctx: &RunContext,
) -> Result<PullSummary> {
    let mut summary = PullSummary::default();
    let mut found_any = false;
    let mut token_hits: HashSet<usize> = HashSet::new();

    if !ctx.dry_run {
        layout::create_project_structure(work_ssd, shoot)?;
    }

    for (archive_folder, project_folder) in source.folders() {
        let archive_dir = layout::archive_shoot_dir(archive, archive_folder, shoot);
        if !archive_dir.is_dir() {
            let msg = format!("Nothing archived for '{}' in {}", shoot, archive_dir.display());
            log::warn!("{}", msg);
            summary.warnings.push(msg);
            continue;
        }
        found_any = true;

        let catalog = MediaCatalog::scan(&archive_dir, &ctx.extensions())?;
        let selection = selector::select(catalog.files(), tokens);
        for (idx, token) in tokens.iter().enumerate() {
            if !selection.unmatched.contains(token) {
                token_hits.insert(idx);
            }
        }

        if selection.selected.is_empty() {
            continue;
        }

        let bucket = ShootBucket::named(shoot, selection.selected);
        let dest = layout::project_destination(work_ssd, project_folder, ctx.reserve_bytes);
        summary.outcomes.push(reconcile(&bucket, std::slice::from_ref(&dest), ctx, false));
    }

    if !found_any {
        return Err(VflowError::InvalidPath(format!("Shoot '{}' not found in archive", shoot)));
    }

    // A token only counts as unmatched if no pulled folder matched it
    for (idx, token) in tokens.iter().enumerate() {
        if !token_hits.contains(&idx) {
            let msg = VflowError::NoMatch(token.to_string()).to_string();
            log::warn!("{}", msg);
            summary.warnings.push(msg);
        }
    }

    Ok(summary)
}

// --- archive / create-select ---

/// Where a tagged export ended up
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub archived_to: PathBuf,
    pub copied_to_ssd: Option<PathBuf>,
    pub removed_sources: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

fn export_path(work_ssd: &Path, shoot: &str, file: &str) -> Result<PathBuf> {
    let path = layout::project_dir(work_ssd, shoot).join(PROJECT_EXPORTS_FOLDER).join(file);
    if !path.is_file() {
        return Err(VflowError::InvalidPath(format!("Export file not found: {}", path.display())));
    }
    Ok(path)
}

/// Tag a copy of the export, run `f` with it, and always clean the copy up
fn with_tagged_export<T>(export: &Path, tags_csv: &str, f: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
    let tags = exiftool::parse_tags(tags_csv);
    let tagged = exiftool::tag_media_file(export, &tags)?;
    let result = f(&tagged);
    if let Err(e) = fs::remove_file(&tagged) {
        log::warn!("Could not remove temporary file {}: {}", tagged.display(), e);
    }
    result
}

/// Archive a final render: tag it, copy it to `Video/Final_Renders/<shoot>`,
/// and unless `keep_log` remove the source clip(s) it was graded from.
pub fn archive_file(
    shoot: &str,
    file: &str,
    tags_csv: &str,
    keep_log: bool,
    work_ssd: &Path,
    archive: &Path,
) -> Result<ExportOutcome> {
    let export = export_path(work_ssd, shoot, file)?;
    let dest = layout::archive_shoot_dir(archive, ARCHIVE_FINALS_FOLDER, shoot).join(file);

    with_tagged_export(&export, tags_csv, |tagged| copy_with_verify(tagged, &dest))?;

    let mut outcome = ExportOutcome {
        archived_to: dest,
        ..Default::default()
    };

    if !keep_log {
        let source_dir = layout::project_dir(work_ssd, shoot).join(PROJECT_SOURCE_FOLDER);
        let stem = Path::new(file).file_stem().map(|s| s.to_string_lossy().to_lowercase());
        if let (Some(stem), true) = (stem, source_dir.is_dir()) {
            for entry in fs::read_dir(&source_dir)? {
                let path = entry?.path();
                let matches = path
                    .file_stem()
                    .map_or(false, |s| s.to_string_lossy().to_lowercase() == stem);
                if matches && path.is_file() {
                    match fs::remove_file(&path) {
                        Ok(()) => outcome.removed_sources.push(path),
                        Err(e) => outcome.warnings.push(format!("Could not remove {}: {}", path.display(), e)),
                    }
                }
            }
        }
    }

    Ok(outcome)
}

/// Tag a graded select and copy it to the archive selects folder (required)
/// and the SSD selects folder (best effort; the archive copy is what counts).
pub fn create_select(
    shoot: &str,
    file: &str,
    tags_csv: &str,
    work_ssd: &Path,
    archive: &Path,
) -> Result<ExportOutcome> {
    let export = export_path(work_ssd, shoot, file)?;
    let archive_dest = layout::archive_shoot_dir(archive, ARCHIVE_SELECTS_FOLDER, shoot).join(file);
    let ssd_dest = layout::project_dir(work_ssd, shoot).join(PROJECT_SELECTS_FOLDER).join(file);

    with_tagged_export(&export, tags_csv, |tagged| {
        copy_with_verify(tagged, &archive_dest)?;

        let mut outcome = ExportOutcome {
            archived_to: archive_dest.clone(),
            ..Default::default()
        };
        match copy_with_verify(tagged, &ssd_dest) {
            Ok(_) => outcome.copied_to_ssd = Some(ssd_dest.clone()),
            Err(e) => {
                let msg = format!("Could not copy select to SSD ({}). It is safely in the archive.", e);
                log::warn!("{}", msg);
                outcome.warnings.push(msg);
            }
        }
        Ok(outcome)
    })
}

// --- consolidate ---

/// Copy unique media from a source drive into `<archive>/<output_folder>`.
/// Files with the same name and size count once; files already in the
/// output folder are skipped.
pub fn consolidate(
    source: &Path,
    output_folder: &str,
    archive: &Path,
    ctx: &RunContext,
) -> Result<ShootOutcome> {
    let catalog = MediaCatalog::scan(source, &ctx.extensions())?;

    let mut seen = HashSet::new();
    let unique: Vec<_> = catalog
        .into_files()
        .into_iter()
        .filter(|f| seen.insert((f.name.clone(), f.size)))
        .collect();

    let bucket = ShootBucket::named(output_folder, unique);
    let dest = DestinationRoot::new(LOCATION_ARCHIVE, archive, Tier::Archive)
        .with_probe(DiskSpaceProbe { reserve_bytes: ctx.reserve_bytes });

    Ok(reconcile(&bucket, std::slice::from_ref(&dest), ctx, false))
}
