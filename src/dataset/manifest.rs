// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// `data.yaml` describing a split dataset for the trainer.
#[derive(Debug, Clone)]
pub struct DatasetManifest {
    pub train_images: PathBuf,
    pub val_images: PathBuf,
    pub names: Vec<String>,
}

impl DatasetManifest {
    /// Build a manifest for a `train/images` + `val/images` tree under
    /// `root`, creating the directories when absent. Paths are made
    /// absolute so training can run from any working directory.
    pub fn for_split_root(root: &Path, names: Vec<String>) -> Result<Self> {
        if names.is_empty() {
            return Err(anyhow!("at least one class name is required"));
        }
        let train_images = root.join("train").join("images");
        let val_images = root.join("val").join("images");
        for dir in [&train_images, &val_images] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("cannot create {}", dir.display()))?;
        }
        Ok(Self {
            train_images: std::fs::canonicalize(&train_images)?,
            val_images: std::fs::canonicalize(&val_images)?,
            names,
        })
    }

    pub fn nc(&self) -> usize {
        self.names.len()
    }

    pub fn to_yaml(&self) -> String {
        let names = self
            .names
            .iter()
            .map(|n| format!("'{n}'"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "train: {}\nval: {}\n\nnc: {}\nnames: [{}]\n",
            self.train_images.display(),
            self.val_images.display(),
            self.nc(),
            names
        )
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_yaml())
            .with_context(|| format!("cannot write {}", path.display()))?;
        log::info!("wrote dataset config to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_lists_absolute_paths_and_classes() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["train/images", "val/images"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }

        let manifest = DatasetManifest::for_split_root(
            dir.path(),
            vec![String::from("Billing_Enabled"), String::from("Service_NotEnabled")],
        )
        .unwrap();
        assert!(manifest.train_images.is_absolute());

        let yaml = manifest.to_yaml();
        assert!(yaml.starts_with("train: /"));
        assert!(yaml.contains("\nval: /"));
        assert!(yaml.contains("\nnc: 2\n"));
        assert!(yaml.contains("names: ['Billing_Enabled', 'Service_NotEnabled']"));
    }

    #[test]
    fn creates_missing_tree() {
        let dir = tempfile::tempdir().unwrap();
        let manifest =
            DatasetManifest::for_split_root(dir.path(), vec![String::from("a")]).unwrap();
        assert!(manifest.train_images.is_dir());
        assert!(manifest.val_images.is_dir());
    }

    #[test]
    fn refuses_empty_class_list() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DatasetManifest::for_split_root(dir.path(), Vec::new()).is_err());
    }
}
