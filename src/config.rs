// User configuration (~/.vflow_config.yml)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::constants::{CONFIG_ENV_VAR, CONFIG_FILENAME, DEFAULT_GAP_HOURS, VIDEO_EXTENSIONS};
use crate::error::{VflowError, Result};

const SAMPLE_CONFIG: &str = "\
# vflow storage locations
locations:
  laptop: /path/to/your/laptop/ingest/folder
  work_ssd: /path/to/your/fast/ssd/projects
  archive_hdd: /path/to/your/archive/hdd

# Hours between clips before a new shoot starts (ingest --auto)
gap_hours: 24

# Bytes to keep free on every destination
min_free_bytes: 0
";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub locations: BTreeMap<String, PathBuf>,
    #[serde(default = "default_gap_hours")]
    pub gap_hours: i64,
    #[serde(default)]
    pub min_free_bytes: u64,
    #[serde(default = "default_video_extensions")]
    pub video_extensions: Vec<String>,
}

fn default_gap_hours() -> i64 {
    DEFAULT_GAP_HOURS
}

fn default_video_extensions() -> Vec<String> {
    VIDEO_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

impl Config {
    /// Resolve a named location; it must be defined and be an existing directory
    pub fn location(&self, name: &str) -> Result<PathBuf> {
        let path = self.locations.get(name).ok_or_else(|| {
            VflowError::Config(format!("Location '{}' not defined in config file.", name))
        })?;

        if !path.is_dir() {
            return Err(VflowError::Config(format!(
                "The directory for location '{}' does not exist: {}",
                name,
                path.display()
            )));
        }

        Ok(path.clone())
    }

    /// Same as `location` but without the existence check, for destinations
    /// whose availability is decided later by the planner
    pub fn location_path(&self, name: &str) -> Result<PathBuf> {
        self.locations.get(name).cloned().ok_or_else(|| {
            VflowError::Config(format!("Location '{}' not defined in config file.", name))
        })
    }

    pub fn extensions(&self) -> Vec<&str> {
        self.video_extensions
            .iter()
            .map(|e| e.trim_start_matches('.'))
            .collect()
    }
}

/// Config path: $VFLOW_CONFIG, else ~/.vflow_config.yml
pub fn default_config_path() -> Result<PathBuf> {
    if let Ok(p) = std::env::var(CONFIG_ENV_VAR) {
        if !p.is_empty() {
            return Ok(PathBuf::from(p));
        }
    }

    let base = directories::BaseDirs::new()
        .ok_or_else(|| VflowError::Config("Could not determine home directory".to_string()))?;
    Ok(base.home_dir().join(CONFIG_FILENAME))
}

pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Err(VflowError::Config(format!(
            "Configuration file not found at: {}. Run 'vflow make-config' to create one.",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> Result<Config> {
    let config: Config = serde_yaml::from_str(contents)
        .map_err(|e| VflowError::Config(format!("Error parsing configuration file: {}", e)))?;

    if config.gap_hours < 0 {
        return Err(VflowError::Config("gap_hours must not be negative".to_string()));
    }
    if config.video_extensions.is_empty() {
        return Err(VflowError::Config("video_extensions must not be empty".to_string()));
    }

    log::debug!("Loaded config with {} locations", config.locations.len());
    Ok(config)
}

/// Write the sample config. Returns false when a file exists and `force` is off.
pub fn write_sample_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, SAMPLE_CONFIG)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = parse_config("locations:\n  laptop: /tmp/laptop\n").unwrap();
        assert_eq!(config.gap_hours, 24);
        assert_eq!(config.min_free_bytes, 0);
        assert_eq!(config.extensions(), VIDEO_EXTENSIONS.to_vec());
        assert_eq!(config.location_path("laptop").unwrap(), PathBuf::from("/tmp/laptop"));
    }

    #[test]
    fn test_parse_requires_locations() {
        let err = parse_config("gap_hours: 12\n").unwrap_err();
        assert!(matches!(err, VflowError::Config(_)));
    }

    #[test]
    fn test_parse_rejects_negative_gap() {
        let err = parse_config("locations: {}\ngap_hours: -1\n").unwrap_err();
        assert!(matches!(err, VflowError::Config(_)));
    }

    #[test]
    fn test_location_must_exist() {
        let tmp = TempDir::new().unwrap();
        let yaml = format!(
            "locations:\n  laptop: {}\n  archive_hdd: {}\n",
            tmp.path().display(),
            tmp.path().join("missing").display()
        );
        let config = parse_config(&yaml).unwrap();
        assert_eq!(config.location("laptop").unwrap(), tmp.path());
        assert!(config.location("archive_hdd").is_err());
        assert!(config.location("work_ssd").is_err());
    }

    #[test]
    fn test_sample_config_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILENAME);

        assert!(write_sample_config(&path, false).unwrap());
        assert!(!write_sample_config(&path, false).unwrap());
        assert!(write_sample_config(&path, true).unwrap());

        let config = load_config(&path).unwrap();
        assert_eq!(config.locations.len(), 3);
        assert!(config.locations.contains_key("archive_hdd"));
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            load_config(&tmp.path().join("nope.yml")),
            Err(VflowError::Config(_))
        ));
    }
}
