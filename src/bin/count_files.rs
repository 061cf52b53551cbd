// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use textverify::dataset::DatasetCounts;

/// Count images and labels in a split dataset tree.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Split root with train/ and val/ trees
    #[arg(long, default_value = "dataset")]
    dataset_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let counts = DatasetCounts::collect(&args.dataset_dir)?;
    println!("train/images: {}", counts.train_images);
    println!("train/labels: {}", counts.train_labels);
    println!("val/images:   {}", counts.val_images);
    println!("val/labels:   {}", counts.val_labels);

    for warning in counts.mismatches() {
        log::warn!("{warning}");
    }
    Ok(())
}
