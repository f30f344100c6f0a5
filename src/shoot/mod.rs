// Shoot partitioning: split a catalog into dated shoots at large time gaps

pub mod naming;


use chrono::{DateTime, Duration, Local, NaiveDate};
use serde::Serialize;

use crate::catalog::{MediaCatalog, MediaFile};
use crate::error::{VflowError, Result};
use naming::{format_date_label, format_shoot_name, parse_shoot_date_range};

/// A named, time-contiguous group of files from one catalog
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShootBucket {
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub files: Vec<MediaFile>,
}

impl ShootBucket {
    /// Build a bucket named from its own date range. An empty bucket gets default dates.
    fn from_files(files: Vec<MediaFile>, suffix: Option<&str>) -> Self {
        let start_date = files.iter().map(MediaFile::date).min().unwrap_or_default();
        let end_date = files.iter().map(MediaFile::date).max().unwrap_or_default();
        Self {
            name: format_shoot_name(start_date, end_date, suffix),
            start_date,
            end_date,
            files,
        }
    }

    /// Bucket with a caller-chosen name; dates are still derived from the files
    pub fn named(name: impl Into<String>, files: Vec<MediaFile>) -> Self {
        let mut bucket = Self::from_files(files, None);
        bucket.name = name.into();
        bucket
    }

    pub fn date_label(&self) -> String {
        format_date_label(self.start_date, self.end_date)
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Local>> {
        self.files.iter().map(|f| f.timestamp).min()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Local>> {
        self.files.iter().map(|f| f.timestamp).max()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Indices where a new bucket starts in an ascending timestamp sequence.
/// Always begins with 0 for a non-empty input.
pub fn split_points(timestamps: &[DateTime<Local>], gap: Duration) -> Vec<usize> {
    if timestamps.is_empty() {
        return Vec::new();
    }

    let mut starts = vec![0];
    for (idx, pair) in timestamps.windows(2).enumerate() {
        if pair[1] - pair[0] > gap {
            starts.push(idx + 1);
        }
    }
    starts
}

/// Partition a catalog into shoots, naming each bucket by its own dates
pub fn partition(catalog: &MediaCatalog, gap_threshold_hours: i64) -> Vec<ShootBucket> {
    partition_named(catalog, gap_threshold_hours, None)
}

/// Partition a catalog into shoots; `suffix` is appended to every bucket name.
/// Equal timestamps never split.
pub fn partition_named(
    catalog: &MediaCatalog,
    gap_threshold_hours: i64,
    suffix: Option<&str>,
) -> Vec<ShootBucket> {
    let mut sorted: Vec<MediaFile> = catalog.files().to_vec();
    // Vec::sort_by_key is stable: equal timestamps keep scan order
    sorted.sort_by_key(|f| f.timestamp);

    let timestamps: Vec<DateTime<Local>> = sorted.iter().map(|f| f.timestamp).collect();
    let gap = Duration::try_hours(gap_threshold_hours.max(0)).unwrap_or(Duration::MAX);
    let starts = split_points(&timestamps, gap);

    let mut buckets = Vec::with_capacity(starts.len());
    let mut remaining = sorted;
    for &start in starts.iter().skip(1).rev() {
        let tail = remaining.split_off(start);
        buckets.push(ShootBucket::from_files(tail, suffix));
    }
    if !remaining.is_empty() {
        buckets.push(ShootBucket::from_files(remaining, suffix));
    }
    buckets.reverse();

    log::debug!(
        "Partitioned {} files into {} shoot(s) at {}h gap",
        catalog.len(),
        buckets.len(),
        gap_threshold_hours
    );

    buckets
}

/// How the user asked for shoots to be named
#[derive(Debug, Clone)]
pub struct ShootRequest<'a> {
    pub name: Option<&'a str>,
    pub auto: bool,
    pub force: bool,
    pub gap_hours: i64,
}

/// Buckets to ingest plus any warnings the caller should surface
#[derive(Debug, Clone, Default)]
pub struct ShootResolution {
    pub buckets: Vec<ShootBucket>,
    pub warnings: Vec<String>,
}

/// Apply the naming policy for an ingest.
///
/// - name only: the whole catalog is one shoot. A dated name is used as-is,
///   an undated one gets the catalog's date label prefixed.
/// - auto: split by gap, each bucket named by its own dates plus the
///   name's suffix. A dated name whose range does not cover the footage is a
///   `ValidationMismatch` unless `force` is set.
pub fn resolve_shoots(catalog: &MediaCatalog, request: &ShootRequest<'_>) -> Result<ShootResolution> {
    let name = request.name.map(str::trim).filter(|n| !n.is_empty());

    if !request.auto && name.is_none() {
        return Err(VflowError::Config("Either --shoot or --auto must be provided.".to_string()));
    }

    let (first, last) = match catalog.date_range() {
        Some(range) => range,
        None => return Ok(ShootResolution::default()),
    };

    let declared = name.and_then(parse_shoot_date_range);

    if !request.auto {
        let name = name.unwrap_or_default();
        let bucket_name = if declared.is_some() {
            name.to_string()
        } else {
            format_shoot_name(first, last, Some(name))
        };
        return Ok(ShootResolution {
            buckets: vec![ShootBucket::named(bucket_name, catalog.files().to_vec())],
            warnings: Vec::new(),
        });
    }

    let mut warnings = Vec::new();
    let suffix = match (&declared, name) {
        (Some(d), Some(raw)) => {
            if !(d.contains(first) && d.contains(last)) {
                let detected = format_date_label(first, last);
                if !request.force {
                    return Err(VflowError::ValidationMismatch {
                        declared: raw.to_string(),
                        detected,
                    });
                }
                let msg = format!(
                    "Shoot name '{}' does not match footage dates {}; continuing because --force was given",
                    raw, detected
                );
                log::warn!("{}", msg);
                warnings.push(msg);
            }
            Some(d.suffix.as_str())
        }
        (None, Some(raw)) => Some(raw),
        _ => None,
    };

    let buckets = partition_named(catalog, request.gap_hours, suffix);
    Ok(ShootResolution { buckets, warnings })
}
