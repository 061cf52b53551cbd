// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;

use textverify::dataset::DatasetManifest;

/// Emit the data.yaml a split dataset needs for training.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Split root with train/ and val/ trees
    #[arg(long, default_value = "dataset")]
    dataset_dir: PathBuf,

    /// Output path; defaults to <dataset-dir>/data.yaml
    #[arg(long)]
    output: Option<PathBuf>,

    /// Class names in id order
    #[arg(long, required = true, num_args = 1..)]
    names: Vec<String>,

    /// Class count override; missing names are filled as class_{i}
    #[arg(long)]
    nc: Option<usize>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut names = args.names;
    if let Some(nc) = args.nc {
        if nc < names.len() {
            return Err(anyhow!(
                "--nc {} is smaller than the {} names given",
                nc,
                names.len()
            ));
        }
        for i in names.len()..nc {
            names.push(format!("class_{i}"));
        }
    }

    let manifest = DatasetManifest::for_split_root(&args.dataset_dir, names)?;
    let output = args
        .output
        .unwrap_or_else(|| args.dataset_dir.join("data.yaml"));
    manifest.write(&output)?;

    println!("Wrote {} ({} classes)", output.display(), manifest.nc());
    Ok(())
}
