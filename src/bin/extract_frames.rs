// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use textverify::dataset::{extract_frames, ExtractConfig};

/// Sample frames out of a directory of videos for labeling.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Directory of source videos (.mp4/.avi/.mov/.mkv)
    #[arg(long, default_value = "videos")]
    videos_dir: PathBuf,

    /// Where extracted frames are written
    #[arg(long, default_value = "images")]
    output_dir: PathBuf,

    /// Frames to keep per second of video
    #[arg(long, default_value_t = 1.0)]
    frame_rate: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let summary = extract_frames(&ExtractConfig {
        videos_dir: args.videos_dir,
        output_dir: args.output_dir.clone(),
        frame_rate: args.frame_rate,
    })?;

    println!(
        "Done: {} frames from {} videos into {} ({} skipped)",
        summary.frames,
        summary.videos,
        args.output_dir.display(),
        summary.skipped
    );
    Ok(())
}
