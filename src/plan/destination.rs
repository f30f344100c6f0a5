// Destination roots and their availability checks

use std::fmt;
use std::path::{Path, PathBuf};
use serde::Serialize;

/// Storage tier of a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Workspace,
    Archive,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Workspace => write!(f, "workspace"),
            Tier::Archive => write!(f, "archive"),
        }
    }
}

/// Answer from an availability check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(String),
}

/// Can a destination root accept `required_bytes` more right now?
/// Evaluated lazily, right before a destination's plan is produced.
pub trait AvailabilityProbe: fmt::Debug {
    fn check(&self, root: &Path, required_bytes: u64) -> Availability;
}

/// Checks the root is a writable directory with enough free space,
/// keeping `reserve_bytes` free after the copy.
#[derive(Debug, Clone, Default)]
pub struct DiskSpaceProbe {
    pub reserve_bytes: u64,
}

impl AvailabilityProbe for DiskSpaceProbe {
    fn check(&self, root: &Path, required_bytes: u64) -> Availability {
        let meta = match std::fs::metadata(root) {
            Ok(m) => m,
            Err(e) => return Availability::Unavailable(format!("{} is not accessible: {}", root.display(), e)),
        };
        if !meta.is_dir() {
            return Availability::Unavailable(format!("{} is not a directory", root.display()));
        }
        if meta.permissions().readonly() {
            return Availability::Unavailable(format!("{} is read-only", root.display()));
        }

        let free = match fs2::available_space(root) {
            Ok(f) => f,
            Err(e) => return Availability::Unavailable(format!("cannot read free space: {}", e)),
        };
        let needed = required_bytes.saturating_add(self.reserve_bytes);
        if free < needed {
            return Availability::Unavailable(format!(
                "needs {} bytes, only {} free",
                needed, free
            ));
        }

        Availability::Available
    }
}

/// Probe with a fixed answer, for callers that already know the state
#[derive(Debug, Clone)]
pub struct FixedAvailability(pub Availability);

impl AvailabilityProbe for FixedAvailability {
    fn check(&self, _root: &Path, _required_bytes: u64) -> Availability {
        self.0.clone()
    }
}

/// One place a shoot can be copied to.
/// Shoot files land in `root/prefix/<shoot>/suffix`.
#[derive(Debug)]
pub struct DestinationRoot {
    pub label: String,
    pub root: PathBuf,
    pub tier: Tier,
    pub prefix: PathBuf,
    pub suffix: PathBuf,
    probe: Box<dyn AvailabilityProbe>,
}

impl DestinationRoot {
    pub fn new(label: impl Into<String>, root: impl Into<PathBuf>, tier: Tier) -> Self {
        Self {
            label: label.into(),
            root: root.into(),
            tier,
            prefix: PathBuf::new(),
            suffix: PathBuf::new(),
            probe: Box::new(DiskSpaceProbe::default()),
        }
    }

    pub fn with_layout(mut self, prefix: impl Into<PathBuf>, suffix: impl Into<PathBuf>) -> Self {
        self.prefix = prefix.into();
        self.suffix = suffix.into();
        self
    }

    pub fn with_probe(mut self, probe: impl AvailabilityProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Directory the given shoot's files are copied into
    pub fn target_dir(&self, shoot_name: &str) -> PathBuf {
        let mut dir = self.root.clone();
        if !self.prefix.as_os_str().is_empty() {
            dir.push(&self.prefix);
        }
        dir.push(shoot_name);
        if !self.suffix.as_os_str().is_empty() {
            dir.push(&self.suffix);
        }
        dir
    }

    pub fn check_availability(&self, required_bytes: u64) -> Availability {
        self.probe.check(&self.root, required_bytes)
    }
}
