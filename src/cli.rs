// vflow CLI binary

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use clap::{Args, Parser, Subcommand};
use anyhow::{Context, Result};

use vflow_lib::config::{self, Config};
use vflow_lib::constants::*;
use vflow_lib::error::VflowError;
use vflow_lib::ingest::{self, copy::ExecutionReport, PullSource, RunContext, ShootOutcome};
use vflow_lib::metadata;
use vflow_lib::selector::parse_tokens;
use vflow_lib::shoot::ShootRequest;
use vflow_lib::tools;

#[derive(Parser)]
#[command(name = "vflow")]
#[command(about = "vflow - Footage ingest, shoot folders and archive management", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to $VFLOW_CONFIG or ~/.vflow_config.yml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Copy)]
struct CopyFlags {
    /// Show what would be copied without touching any files
    #[arg(long)]
    dry_run: bool,
    /// Replace destination files whose size differs from the source
    #[arg(long)]
    overwrite: bool,
    /// Print the plan and results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy footage from a card to the laptop and the archive
    Ingest {
        /// Card or folder to ingest
        #[arg(short = 's', long)]
        source: PathBuf,
        /// Shoot name, e.g. "2025-09-15_Wedding" or just "Wedding"
        #[arg(short = 'n', long)]
        shoot: Option<String>,
        /// Split into shoots wherever footage has a long gap
        #[arg(short = 'a', long)]
        auto: bool,
        /// Ingest even if the shoot name's dates don't match the footage
        #[arg(short = 'f', long)]
        force: bool,
        /// Gap in hours that starts a new shoot (overrides config)
        #[arg(long)]
        gap_hours: Option<i64>,
        #[command(flatten)]
        flags: CopyFlags,
    },

    /// Move a shoot from the laptop into a new SSD project
    Prep {
        #[arg(short = 'n', long)]
        shoot: String,
        #[command(flatten)]
        flags: CopyFlags,
    },

    /// Copy archived footage into the SSD project
    Pull {
        #[arg(short = 'n', long)]
        shoot: String,
        /// Which archive folder to pull from
        #[arg(short = 's', long, value_enum, default_value = "raw")]
        source: PullSource,
        /// Only pull files matching these names or clip ranges (e.g. C3317-C3351)
        #[arg(short = 'f', long, num_args = 1..)]
        files: Vec<String>,
        #[command(flatten)]
        flags: CopyFlags,
    },

    /// Tag a final render and archive it
    Archive {
        #[arg(short = 'n', long)]
        shoot: String,
        /// File name in the project's 03_Exports folder
        #[arg(short = 'f', long)]
        file: String,
        /// Comma-separated keywords
        #[arg(short = 't', long)]
        tags: String,
        /// Keep the source clip in 01_Source
        #[arg(long)]
        keep_log: bool,
    },

    /// Tag a graded select and copy it to the archive and the SSD
    CreateSelect {
        #[arg(short = 'n', long)]
        shoot: String,
        /// File name in the project's 03_Exports folder
        #[arg(short = 'f', long)]
        file: String,
        /// Comma-separated keywords
        #[arg(short = 't', long)]
        tags: String,
    },

    /// Copy unique media from an old drive into the archive
    Consolidate {
        #[arg(short = 's', long)]
        source: PathBuf,
        /// Folder under the archive root to copy into
        #[arg(short = 'o', long)]
        output_folder: String,
        #[command(flatten)]
        flags: CopyFlags,
    },

    /// Copy metadata from original clips onto exports with the same name
    CopyMeta {
        #[arg(short = 's', long)]
        source_folder: PathBuf,
        #[arg(short = 't', long)]
        target_folder: PathBuf,
    },

    /// Write a sample config file
    MakeConfig {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config_file = cli.config;

    let clean = match cli.command {
        Commands::Ingest { source, shoot, auto, force, gap_hours, flags } => {
            let config = load(&config_file)?;
            cmd_ingest(&config, &source, shoot.as_deref(), auto, force, gap_hours, flags)?
        }
        Commands::Prep { shoot, flags } => cmd_prep(&load(&config_file)?, &shoot, flags)?,
        Commands::Pull { shoot, source, files, flags } => {
            cmd_pull(&load(&config_file)?, &shoot, source, &files, flags)?
        }
        Commands::Archive { shoot, file, tags, keep_log } => {
            cmd_archive(&load(&config_file)?, &shoot, &file, &tags, keep_log)?
        }
        Commands::CreateSelect { shoot, file, tags } => {
            cmd_create_select(&load(&config_file)?, &shoot, &file, &tags)?
        }
        Commands::Consolidate { source, output_folder, flags } => {
            cmd_consolidate(&load(&config_file)?, &source, &output_folder, flags)?
        }
        Commands::CopyMeta { source_folder, target_folder } => {
            cmd_copy_meta(&load(&config_file)?, &source_folder, &target_folder)?
        }
        Commands::MakeConfig { force } => cmd_make_config(&config_file, force)?,
    };

    Ok(if clean { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var_os("RUST_LOG").is_none() {
        let level = match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        builder.filter_level(level);
    }
    builder.format_timestamp(None).init();
}

fn config_path(path: &Option<PathBuf>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.clone()),
        None => Ok(config::default_config_path()?),
    }
}

fn load(path: &Option<PathBuf>) -> Result<Config> {
    Ok(config::load_config(&config_path(path)?)?)
}

fn context(config: &Config, flags: CopyFlags) -> RunContext {
    RunContext {
        extensions: config.extensions().iter().map(|e| e.to_string()).collect(),
        reserve_bytes: config.min_free_bytes,
        dry_run: flags.dry_run,
        overwrite: flags.overwrite,
    }
}

fn cmd_ingest(
    config: &Config,
    source: &Path,
    shoot: Option<&str>,
    auto: bool,
    force: bool,
    gap_hours: Option<i64>,
    flags: CopyFlags,
) -> Result<bool> {
    // Availability of both is decided per shoot by the planner
    let laptop = config.location_path(LOCATION_LAPTOP)?;
    let archive = config.location_path(LOCATION_ARCHIVE)?;

    let request = ShootRequest {
        name: shoot,
        auto,
        force,
        gap_hours: gap_hours.unwrap_or(config.gap_hours),
    };
    if request.gap_hours < 0 {
        anyhow::bail!("--gap-hours must not be negative");
    }

    if !flags.json {
        println!("Ingesting from {}", source.display());
        if flags.dry_run {
            println!("(dry run: nothing will be copied)");
        }
    }

    let summary = ingest::ingest_shoot(source, &request, &laptop, &archive, &context(config, flags))?;
    if flags.json {
        println!("{}", ingest::report_json(&summary)?);
        return Ok(!summary.has_failures());
    }

    println!("Found {} video files", summary.files_found);
    print_warnings(&summary.warnings);

    if summary.shoots.is_empty() {
        println!("Nothing to ingest.");
        return Ok(true);
    }

    for outcome in &summary.shoots {
        print_outcome(outcome, flags.dry_run);
    }

    Ok(!summary.has_failures())
}

fn cmd_prep(config: &Config, shoot: &str, flags: CopyFlags) -> Result<bool> {
    let laptop = config.location(LOCATION_LAPTOP)?;
    let work_ssd = config.location(LOCATION_WORK_SSD)?;

    if !flags.json {
        println!("Preparing '{}' on {}", shoot, work_ssd.display());
    }
    let outcome = ingest::prep_shoot(shoot, &laptop, &work_ssd, &context(config, flags))?;
    if flags.json {
        println!("{}", ingest::report_json(&outcome)?);
    } else {
        print_outcome(&outcome, flags.dry_run);
    }

    Ok(!outcome.has_failures())
}

fn cmd_pull(config: &Config, shoot: &str, source: PullSource, files: &[String], flags: CopyFlags) -> Result<bool> {
    let work_ssd = config.location(LOCATION_WORK_SSD)?;
    let archive = config.location(LOCATION_ARCHIVE)?;
    let tokens = parse_tokens(files);

    if !flags.json {
        println!("Pulling '{}' from {}", shoot, archive.display());
    }
    let summary = ingest::pull_shoot(shoot, &work_ssd, &archive, source, &tokens, &context(config, flags))?;
    if flags.json {
        println!("{}", ingest::report_json(&summary)?);
        return Ok(!summary.has_failures());
    }

    print_warnings(&summary.warnings);
    if summary.outcomes.is_empty() {
        println!("No matching files to pull.");
    }
    for outcome in &summary.outcomes {
        print_outcome(outcome, flags.dry_run);
    }

    Ok(!summary.has_failures())
}

fn cmd_archive(config: &Config, shoot: &str, file: &str, tags: &str, keep_log: bool) -> Result<bool> {
    let work_ssd = config.location(LOCATION_WORK_SSD)?;
    let archive = config.location(LOCATION_ARCHIVE)?;
    require_exiftool(tags)?;

    let outcome = ingest::archive_file(shoot, file, tags, keep_log, &work_ssd, &archive)
        .with_context(|| format!("Failed to archive {}", file))?;

    println!("Archived {} -> {}", file, outcome.archived_to.display());
    for removed in &outcome.removed_sources {
        println!("  Removed source {}", removed.display());
    }
    print_warnings(&outcome.warnings);

    Ok(outcome.warnings.is_empty())
}

fn cmd_create_select(config: &Config, shoot: &str, file: &str, tags: &str) -> Result<bool> {
    let work_ssd = config.location(LOCATION_WORK_SSD)?;
    let archive = config.location(LOCATION_ARCHIVE)?;
    require_exiftool(tags)?;

    let outcome = ingest::create_select(shoot, file, tags, &work_ssd, &archive)
        .with_context(|| format!("Failed to create select from {}", file))?;

    println!("Select archived to {}", outcome.archived_to.display());
    if let Some(ref ssd) = outcome.copied_to_ssd {
        println!("Select copied to {}", ssd.display());
    }
    print_warnings(&outcome.warnings);

    // The archive copy succeeded; an SSD warning is not a failure
    Ok(true)
}

fn cmd_consolidate(config: &Config, source: &Path, output_folder: &str, flags: CopyFlags) -> Result<bool> {
    let archive = config.location_path(LOCATION_ARCHIVE)?;

    if !flags.json {
        println!("Consolidating {} into {}", source.display(), archive.join(output_folder).display());
    }
    let outcome = ingest::consolidate(source, output_folder, &archive, &context(config, flags))?;
    if flags.json {
        println!("{}", ingest::report_json(&outcome)?);
    } else {
        print_outcome(&outcome, flags.dry_run);
    }

    Ok(!outcome.has_failures())
}

fn cmd_copy_meta(config: &Config, source_folder: &Path, target_folder: &Path) -> Result<bool> {
    if !tools::is_exiftool_available() {
        anyhow::bail!("exiftool not found. Install it or set VFLOW_EXIFTOOL_PATH.");
    }

    let report = metadata::copy_metadata_folder(source_folder, target_folder, &config.extensions())?;

    println!("Metadata copied to {} files", report.copied);
    for path in &report.unmatched {
        println!("  No original for {}", path.display());
    }
    for (path, reason) in &report.failed {
        eprintln!("  FAILED {}: {}", path.display(), reason);
    }

    Ok(report.failed.is_empty())
}

fn cmd_make_config(path: &Option<PathBuf>, force: bool) -> Result<bool> {
    let path = config_path(path)?;

    if config::write_sample_config(&path, force)? {
        println!("Wrote sample config to {}", path.display());
        println!("Edit the locations before running other commands.");
        Ok(true)
    } else {
        println!("Config already exists at {}. Use --force to replace it.", path.display());
        Ok(false)
    }
}

// --- Helper Functions ---

fn require_exiftool(tags: &str) -> Result<()> {
    let tagging = !metadata::exiftool::parse_tags(tags).is_empty();
    if tagging && !tools::is_exiftool_available() {
        anyhow::bail!("exiftool not found. Install it or set VFLOW_EXIFTOOL_PATH.");
    }
    Ok(())
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
}

fn print_outcome(outcome: &ShootOutcome, dry_run: bool) {
    let report = &outcome.report;
    println!();
    println!("Shoot: {}", report.shoot);

    for skip in &report.unavailable {
        println!("  {:<12} unavailable: {}", skip.destination, skip.reason);
    }

    if report.is_total_failure() {
        let err = VflowError::TotalReconciliationFailure { bucket: report.shoot.clone() };
        eprintln!("  {}", err);
        return;
    }

    for plan in &report.plans {
        let overwrites = plan.overwrite_candidates().count();
        println!(
            "  {:<12} {:>4} to copy ({}), {:>4} already present, -> {}",
            plan.destination,
            plan.to_copy.len(),
            format_size(plan.bytes_to_copy()),
            plan.to_skip.len(),
            plan.target_dir.display()
        );
        if overwrites > 0 {
            println!("  {:<12} {} file(s) differ in size at the destination", "", overwrites);
        }
        let renamed = plan.renamed().count();
        if renamed > 0 {
            println!("  {:<12} {} duplicate name(s) stored with a numbered suffix", "", renamed);
        }
        if dry_run {
            for planned in &plan.to_copy {
                if planned.renamed {
                    println!("  {:<12}   {} (from {})", "", dest_name(&planned.dest_path), planned.file.path.display());
                } else {
                    println!("  {:<12}   {}", "", planned.file.name);
                }
            }
        }
    }

    for exec in &outcome.executions {
        print_execution(exec);
    }
}

fn dest_name(path: &Path) -> String {
    path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default()
}

fn print_execution(exec: &ExecutionReport) {
    println!(
        "  {:<12} copied {} ({}), skipped {}",
        exec.destination,
        exec.copied,
        format_size(exec.bytes_copied),
        exec.skipped
    );
    if exec.sources_removed > 0 {
        println!("  {:<12} removed {} source file(s)", "", exec.sources_removed);
    }
    for path in &exec.refused_overwrites {
        eprintln!("  Not overwritten (use --overwrite): {}", path.display());
    }
    for (path, reason) in &exec.failed {
        eprintln!("  FAILED {}: {}", path.display(), reason);
    }
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
