// External tool resolver for exiftool
//
// Resolution order:
// 1) Environment variable override (VFLOW_EXIFTOOL_PATH)
// 2) Binary next to the vflow executable (or in its bin/ subdirectory)
// 3) PATH fallback

use std::env;
use std::path::PathBuf;

/// Get the directory containing the current executable
fn exe_dir() -> Option<PathBuf> {
    env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
}

/// Resolve a tool path.
fn resolve_tool(env_key: &str, default_name: &str) -> PathBuf {
    // 1) Check environment variable override
    if let Ok(v) = env::var(env_key) {
        let p = PathBuf::from(&v);
        if p.exists() {
            return p;
        }
        log::warn!("{} points to {} which does not exist; ignoring", env_key, v);
    }

    // Add .exe on Windows
    let mut filename = default_name.to_string();
    if cfg!(windows) && !filename.to_lowercase().ends_with(".exe") {
        filename.push_str(".exe");
    }

    // 2) Check next to executable
    if let Some(dir) = exe_dir() {
        let candidate = dir.join(&filename);
        if candidate.exists() {
            return candidate;
        }

        let bin_candidate = dir.join("bin").join(&filename);
        if bin_candidate.exists() {
            return bin_candidate;
        }
    }

    // 3) Fall back to PATH
    PathBuf::from(default_name)
}

/// Get path to exiftool binary
pub fn exiftool_path() -> PathBuf {
    resolve_tool("VFLOW_EXIFTOOL_PATH", "exiftool")
}

/// Check if exiftool can be run
pub fn is_exiftool_available() -> bool {
    let path = exiftool_path();
    if path.is_file() {
        return true;
    }

    std::process::Command::new(&path)
        .arg("-ver")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_tool_fallback() {
        // Without env var set, should return the default name for PATH lookup
        let path = resolve_tool("VFLOW_TEST_NONEXISTENT", "vflow-testcmd");
        assert_eq!(path, PathBuf::from("vflow-testcmd"));
    }

    #[test]
    fn test_env_override() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let temp_file = temp_dir.path().join("vflow_test_tool");
        std::fs::write(&temp_file, "test").unwrap();

        std::env::set_var("VFLOW_TEST_TOOL", temp_file.to_str().unwrap());
        let path = resolve_tool("VFLOW_TEST_TOOL", "default");
        assert_eq!(path, temp_file);

        std::env::remove_var("VFLOW_TEST_TOOL");
    }
}
