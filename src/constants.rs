// vflow Constants
// Folder names are part of the on-disk layout. Changing them orphans existing shoots.

// Config
pub const CONFIG_FILENAME: &str = ".vflow_config.yml";
pub const CONFIG_ENV_VAR: &str = "VFLOW_CONFIG";
pub const LOCATION_LAPTOP: &str = "laptop";
pub const LOCATION_WORK_SSD: &str = "work_ssd";
pub const LOCATION_ARCHIVE: &str = "archive_hdd";

// Time
pub const DEFAULT_GAP_HOURS: i64 = 24;
pub const SHOOT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const SHOOT_RANGE_JOINER: &str = "_to_";

// Hashing
pub const HASH_CHUNK_SIZE: usize = 1_048_576; // 1MB

// Copy
pub const TEMP_FILE_PREFIX: &str = ".vflow_tmp_";

// Archive layout: <archive>/Video/<tier>/<shoot>
pub const ARCHIVE_VIDEO_FOLDER: &str = "Video";
pub const ARCHIVE_RAW_FOLDER: &str = "RAW";
pub const ARCHIVE_SELECTS_FOLDER: &str = "Graded_Selects";
pub const ARCHIVE_FINALS_FOLDER: &str = "Final_Renders";

// Work SSD project layout: <ssd>/<shoot>/<folder>
pub const PROJECT_SOURCE_FOLDER: &str = "01_Source";
pub const PROJECT_RESOLVE_FOLDER: &str = "02_Resolve";
pub const PROJECT_EXPORTS_FOLDER: &str = "03_Exports";
pub const PROJECT_GRAPHICS_FOLDER: &str = "04_Graphics";
pub const PROJECT_SELECTS_FOLDER: &str = "05_Graded_Selects";

pub const PROJECT_FOLDERS: [&str; 5] = [
    PROJECT_SOURCE_FOLDER,
    PROJECT_RESOLVE_FOLDER,
    PROJECT_EXPORTS_FOLDER,
    PROJECT_GRAPHICS_FOLDER,
    PROJECT_SELECTS_FOLDER,
];

// Video extensions recognized by the catalog (matched case-insensitively)
pub const VIDEO_EXTENSIONS: [&str; 6] = ["mp4", "mov", "mxf", "mts", "avi", "m4v"];
