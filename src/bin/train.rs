// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use textverify::train::{run_training, TrainConfig};

/// Launch detector training through the external ultralytics CLI.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Dataset descriptor (data.yaml)
    #[arg(long, default_value = "dataset/data.yaml")]
    data: PathBuf,

    /// Pretrained weights to start from
    #[arg(long, default_value = "yolov8n.pt")]
    model: String,

    /// Training epochs
    #[arg(long, default_value_t = 100)]
    epochs: u32,

    /// Square input size
    #[arg(long, default_value_t = 640)]
    imgsz: u32,

    /// Batch size
    #[arg(long, default_value_t = 16)]
    batch: u32,

    /// Run name under the project directory
    #[arg(long, default_value = "text_detect")]
    name: String,

    /// Project directory for run artifacts
    #[arg(long, default_value = "runs/detect")]
    project: String,

    /// Continue the last interrupted run
    #[arg(long)]
    resume: bool,

    /// Trainer executable
    #[arg(long, default_value = "yolo")]
    yolo_bin: String,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let best = run_training(&TrainConfig {
        data: args.data,
        model: args.model,
        epochs: args.epochs,
        imgsz: args.imgsz,
        batch: args.batch,
        name: args.name,
        project: args.project,
        resume: args.resume,
        yolo_bin: args.yolo_bin,
    })?;

    println!("Training complete, best weights at {}", best.display());
    Ok(())
}
