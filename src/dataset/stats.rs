// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::Result;
use std::path::Path;

use super::{list_files, IMAGE_EXTENSIONS};

/// Number of files in `dir` matching `extensions`. A missing directory
/// counts as zero.
pub fn count_files(dir: &Path, extensions: &[&str]) -> usize {
    if !dir.is_dir() {
        return 0;
    }
    list_files(dir, extensions).map(|f| f.len()).unwrap_or(0)
}

/// Image/label counts for a split dataset tree.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DatasetCounts {
    pub train_images: usize,
    pub train_labels: usize,
    pub val_images: usize,
    pub val_labels: usize,
}

impl DatasetCounts {
    pub fn collect(root: &Path) -> Result<Self> {
        Ok(Self {
            train_images: count_files(&root.join("train").join("images"), IMAGE_EXTENSIONS),
            train_labels: count_files(&root.join("train").join("labels"), &["txt"]),
            val_images: count_files(&root.join("val").join("images"), IMAGE_EXTENSIONS),
            val_labels: count_files(&root.join("val").join("labels"), &["txt"]),
        })
    }

    /// Human-readable warnings for image/label count mismatches.
    pub fn mismatches(&self) -> Vec<String> {
        let mut out = Vec::new();
        if self.train_images != self.train_labels {
            out.push(format!(
                "train: {} images but {} labels",
                self.train_images, self.train_labels
            ));
        }
        if self.val_images != self.val_labels {
            out.push(format!(
                "val: {} images but {} labels",
                self.val_images, self.val_labels
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_and_flags_mismatches() {
        let dir = tempfile::tempdir().unwrap();
        let train_images = dir.path().join("train").join("images");
        let train_labels = dir.path().join("train").join("labels");
        std::fs::create_dir_all(&train_images).unwrap();
        std::fs::create_dir_all(&train_labels).unwrap();
        for i in 0..3 {
            std::fs::write(train_images.join(format!("f{i}.jpg")), b"x").unwrap();
        }
        std::fs::write(train_labels.join("f0.txt"), "0 0.5 0.5 0.1 0.1\n").unwrap();

        let counts = DatasetCounts::collect(dir.path()).unwrap();
        assert_eq!(counts.train_images, 3);
        assert_eq!(counts.train_labels, 1);
        // missing val tree counts as empty, not an error
        assert_eq!(counts.val_images, 0);

        let warnings = counts.mismatches();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("train"));
    }
}
