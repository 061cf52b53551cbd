// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// Dataset preparation: frame extraction, train/val splitting, label
// checking, manifest emission and file accounting.

pub mod extract;
pub mod labels;
pub mod manifest;
pub mod split;
pub mod stats;

use std::path::Path;

pub use extract::{extract_frames, ExtractConfig, ExtractSummary};
pub use labels::{check_labels_dir, LabelIssue};
pub use manifest::DatasetManifest;
pub use split::{split_dataset, SplitConfig, SplitSummary};
pub use stats::{count_files, DatasetCounts};

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|want| *want == e)
        })
        .unwrap_or(false)
}

/// Names of regular files under `dir` with one of `extensions`,
/// sorted so downstream decisions are reproducible.
pub fn list_files(dir: &Path, extensions: &[&str]) -> anyhow::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("cannot read {}: {e}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && has_extension(&path, extensions) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                files.push(name.to_string());
            }
        }
    }
    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn extension_matching_is_case_insensitive() {
        assert!(has_extension(&PathBuf::from("clip.MP4"), VIDEO_EXTENSIONS));
        assert!(has_extension(&PathBuf::from("a/b/shot.jpeg"), IMAGE_EXTENSIONS));
        assert!(!has_extension(&PathBuf::from("notes.txt"), IMAGE_EXTENSIONS));
        assert!(!has_extension(&PathBuf::from("noext"), VIDEO_EXTENSIONS));
    }

    #[test]
    fn list_files_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.jpg", "a.png", "c.txt", "d.jpeg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.jpg")).unwrap();

        let files = list_files(dir.path(), IMAGE_EXTENSIONS).unwrap();
        assert_eq!(files, vec!["a.png", "b.jpg", "d.jpeg"]);
    }
}
