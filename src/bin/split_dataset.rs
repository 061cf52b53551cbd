// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use textverify::dataset::{split_dataset, SplitConfig};

/// Split labeled images into reproducible train/val sets.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Directory of images (.jpg/.jpeg/.png)
    #[arg(long, default_value = "images")]
    images_dir: PathBuf,

    /// Directory of YOLO label files ({stem}.txt)
    #[arg(long, default_value = "labels")]
    labels_dir: PathBuf,

    /// Split root, receives train/ and val/ trees
    #[arg(long, default_value = "dataset")]
    output_dir: PathBuf,

    /// Fraction of labeled images assigned to train
    #[arg(long, default_value_t = 0.8)]
    train_ratio: f64,

    /// Shuffle seed, fixed for reproducible splits
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let summary = split_dataset(&SplitConfig {
        images_dir: args.images_dir,
        labels_dir: args.labels_dir,
        output_dir: args.output_dir.clone(),
        train_ratio: args.train_ratio,
        seed: args.seed,
    })?;

    println!(
        "Found {} images, {} labeled ({} excluded)",
        summary.total_images,
        summary.total_images - summary.excluded.len(),
        summary.excluded.len()
    );
    println!(
        "Split into {} train / {} val under {}",
        summary.train,
        summary.val,
        args.output_dir.display()
    );
    Ok(())
}
