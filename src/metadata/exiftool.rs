// ExifTool wrapper for keyword tagging and metadata transfer

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use crate::constants::TEMP_FILE_PREFIX;
use crate::error::{VflowError, Result};

/// Split a comma-separated tag list, dropping blanks and duplicates
pub fn parse_tags(tags_csv: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in tags_csv.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

/// Arguments that append each tag to both XMP Subject and IPTC/QuickTime Keywords
pub fn tagging_args(tags: &[String]) -> Vec<String> {
    let mut args = vec!["-overwrite_original".to_string()];
    for tag in tags {
        args.push(format!("-Keywords+={}", tag));
        args.push(format!("-Subject+={}", tag));
    }
    args
}

/// Write a tagged copy of `source` next to it and return the copy's path.
/// The original export is never modified; the caller removes the copy.
pub fn tag_media_file(source: &Path, tags: &[String]) -> Result<PathBuf> {
    let file_name = source
        .file_name()
        .ok_or_else(|| VflowError::InvalidPath(format!("No filename: {}", source.display())))?;
    let parent = source.parent().unwrap_or(Path::new("."));
    let tagged = parent.join(format!("{}{}", TEMP_FILE_PREFIX, file_name.to_string_lossy()));

    fs::copy(source, &tagged)?;

    if tags.is_empty() {
        return Ok(tagged);
    }

    if let Err(e) = run(&tagging_args(tags), &tagged) {
        let _ = fs::remove_file(&tagged);
        return Err(e);
    }

    log::info!("Tagged {} with {}", source.display(), tags.join(", "));
    Ok(tagged)
}

/// Copy all metadata from `source` onto `target` in place
pub fn copy_metadata(source: &Path, target: &Path) -> Result<()> {
    let args = vec![
        "-TagsFromFile".to_string(),
        source.to_string_lossy().to_string(),
        "-all:all".to_string(),
        "-overwrite_original".to_string(),
    ];
    run(&args, target)
}

fn run(args: &[String], file: &Path) -> Result<()> {
    let output = Command::new(crate::tools::exiftool_path())
        .args(args)
        .arg(file)
        .output()
        .map_err(|e| VflowError::ExifTool(format!("Failed to run exiftool: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(VflowError::ExifTool(format!(
            "exiftool exited with {} on {}: {}",
            output.status.code().unwrap_or(-1),
            file.display(),
            stderr
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        assert_eq!(parse_tags("sunset, beach ,,sunset,  "), vec!["sunset", "beach"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn test_tagging_args() {
        let args = tagging_args(&["a".to_string(), "b c".to_string()]);
        assert_eq!(
            args,
            vec![
                "-overwrite_original",
                "-Keywords+=a",
                "-Subject+=a",
                "-Keywords+=b c",
                "-Subject+=b c",
            ]
        );
    }

    #[test]
    fn test_tag_with_no_tags_only_copies() {
        let tmp = tempfile::TempDir::new().unwrap();
        let src = tmp.path().join("export.mp4");
        fs::write(&src, b"render").unwrap();

        let tagged = tag_media_file(&src, &[]).unwrap();
        assert_ne!(tagged, src);
        assert_eq!(fs::read(&tagged).unwrap(), b"render");
        assert!(src.exists());
    }
}
