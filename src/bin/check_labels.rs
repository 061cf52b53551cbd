// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use textverify::dataset::check_labels_dir;

/// Validate YOLO label files and report malformed annotations.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Label directories to check; defaults to the train/val labels of
    /// --dataset-dir when omitted
    dirs: Vec<PathBuf>,

    /// Split root used when no directories are given
    #[arg(long, default_value = "dataset")]
    dataset_dir: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let dirs = if args.dirs.is_empty() {
        vec![
            args.dataset_dir.join("train").join("labels"),
            args.dataset_dir.join("val").join("labels"),
        ]
    } else {
        args.dirs
    };

    let mut total = 0usize;
    for dir in &dirs {
        if !dir.is_dir() {
            log::warn!("skipping missing directory {}", dir.display());
            continue;
        }
        let issues = check_labels_dir(dir)?;
        for issue in &issues {
            println!("{issue}");
        }
        total += issues.len();
    }

    if total > 0 {
        return Err(anyhow!("{total} label issue(s) found"));
    }
    println!("All label files OK");
    Ok(())
}
