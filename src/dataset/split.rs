// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

use super::{list_files, IMAGE_EXTENSIONS};

pub struct SplitConfig {
    pub images_dir: PathBuf,
    pub labels_dir: PathBuf,
    pub output_dir: PathBuf,
    pub train_ratio: f64,
    pub seed: u64,
}

#[derive(Debug, Default)]
pub struct SplitSummary {
    pub total_images: usize,
    /// Images dropped for having no label file.
    pub excluded: Vec<String>,
    pub train: usize,
    pub val: usize,
}

fn label_name(image: &str) -> String {
    match image.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.txt"),
        None => format!("{image}.txt"),
    }
}

/// Shuffle labeled images with a seeded RNG and copy image/label pairs
/// into `train/` and `val/` trees. Unlabeled images are excluded and
/// reported; a dataset with none labeled is an error.
pub fn split_dataset(config: &SplitConfig) -> Result<SplitSummary> {
    if !(0.0..=1.0).contains(&config.train_ratio) {
        return Err(anyhow!(
            "train ratio must be within [0, 1], got {}",
            config.train_ratio
        ));
    }

    let train_images = config.output_dir.join("train").join("images");
    let train_labels = config.output_dir.join("train").join("labels");
    let val_images = config.output_dir.join("val").join("images");
    let val_labels = config.output_dir.join("val").join("labels");
    for dir in [&train_images, &train_labels, &val_images, &val_labels] {
        std::fs::create_dir_all(dir)?;
    }

    let images = list_files(&config.images_dir, IMAGE_EXTENSIONS)?;
    let mut summary = SplitSummary {
        total_images: images.len(),
        ..Default::default()
    };

    let mut labeled = Vec::new();
    for image in images {
        if config.labels_dir.join(label_name(&image)).is_file() {
            labeled.push(image);
        } else {
            log::warn!("no label for {image}, excluding from split");
            summary.excluded.push(image);
        }
    }
    if labeled.is_empty() {
        return Err(anyhow!(
            "no labeled images found in {} (labels in {})",
            config.images_dir.display(),
            config.labels_dir.display()
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    labeled.shuffle(&mut rng);

    let split_at = (labeled.len() as f64 * config.train_ratio) as usize;
    let (train_set, val_set) = labeled.split_at(split_at);

    copy_pairs(config, train_set, &train_images, &train_labels)?;
    copy_pairs(config, val_set, &val_images, &val_labels)?;
    summary.train = train_set.len();
    summary.val = val_set.len();

    Ok(summary)
}

fn copy_pairs(
    config: &SplitConfig,
    images: &[String],
    images_out: &Path,
    labels_out: &Path,
) -> Result<()> {
    for image in images {
        let label = label_name(image);
        std::fs::copy(config.images_dir.join(image), images_out.join(image))?;
        std::fs::copy(config.labels_dir.join(&label), labels_out.join(&label))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(labeled: usize, unlabeled: usize) -> (tempfile::TempDir, SplitConfig) {
        let dir = tempfile::tempdir().unwrap();
        let images_dir = dir.path().join("images");
        let labels_dir = dir.path().join("labels");
        std::fs::create_dir_all(&images_dir).unwrap();
        std::fs::create_dir_all(&labels_dir).unwrap();
        for i in 0..labeled {
            std::fs::write(images_dir.join(format!("img_{i}.jpg")), b"img").unwrap();
            std::fs::write(labels_dir.join(format!("img_{i}.txt")), "0 0.5 0.5 0.1 0.1\n")
                .unwrap();
        }
        for i in 0..unlabeled {
            std::fs::write(images_dir.join(format!("orphan_{i}.jpg")), b"img").unwrap();
        }
        let config = SplitConfig {
            images_dir,
            labels_dir,
            output_dir: dir.path().join("dataset"),
            train_ratio: 0.8,
            seed: 42,
        };
        (dir, config)
    }

    #[test]
    fn splits_eighty_twenty_and_excludes_orphans() {
        let (_dir, config) = setup(10, 3);
        let summary = split_dataset(&config).unwrap();
        assert_eq!(summary.total_images, 13);
        assert_eq!(summary.excluded.len(), 3);
        assert_eq!(summary.train, 8);
        assert_eq!(summary.val, 2);

        let train_images = list_files(
            &config.output_dir.join("train").join("images"),
            IMAGE_EXTENSIONS,
        )
        .unwrap();
        assert_eq!(train_images.len(), 8);
        // every copied image has its label alongside
        for image in train_images {
            let label = label_name(&image);
            assert!(config
                .output_dir
                .join("train")
                .join("labels")
                .join(label)
                .is_file());
        }
    }

    #[test]
    fn same_seed_same_assignment() {
        let (_dir_a, config_a) = setup(20, 0);
        let (_dir_b, config_b) = setup(20, 0);
        split_dataset(&config_a).unwrap();
        split_dataset(&config_b).unwrap();

        let val_a = list_files(
            &config_a.output_dir.join("val").join("images"),
            IMAGE_EXTENSIONS,
        )
        .unwrap();
        let val_b = list_files(
            &config_b.output_dir.join("val").join("images"),
            IMAGE_EXTENSIONS,
        )
        .unwrap();
        assert_eq!(val_a, val_b);
    }

    #[test]
    fn fails_without_any_labels() {
        let (_dir, config) = setup(0, 5);
        assert!(split_dataset(&config).is_err());
    }
}
