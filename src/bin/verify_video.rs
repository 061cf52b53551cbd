// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;

use textverify::verify::{self, VerifyOptions, FIRST_HIT_CAP_MS};
use textverify::{DetectorArgs, YOLOv8};

/// Run the detector over a video and flag frames showing the target class.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Input video file
    #[arg(long, required = true)]
    input: PathBuf,

    #[command(flatten)]
    detector: DetectorArgs,

    /// Class id that counts as verified
    #[arg(long, default_value_t = 0)]
    target_class: usize,

    /// Banner drawn on verified frames
    #[arg(long, default_value = "This text verified")]
    message: String,

    /// Stop at the first verified frame and save it as a still
    #[arg(long)]
    first_hit: bool,

    /// Directory for first-hit stills
    #[arg(long, default_value = "detected_frames")]
    save_frame_dir: PathBuf,

    /// Re-encode the annotated stream (full pass only)
    #[arg(long)]
    save: bool,

    /// Annotated video path, used with --save
    #[arg(long, default_value = "verified_output.mp4")]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut model = YOLOv8::new(&args.detector)?;
    model.summary();

    let options = VerifyOptions {
        input: args.input,
        target_class: args.target_class,
        message: args.message,
        save_frame_dir: args.save_frame_dir,
        output: args.save.then_some(args.output),
        first_hit: args.first_hit,
        max_video_ms: FIRST_HIT_CAP_MS,
    };

    let started = Instant::now();
    let outcome = verify::run(&mut model, &options)?;
    verify::report(&outcome, &options);
    println!("Elapsed: {:.1}s", started.elapsed().as_secs_f32());
    Ok(())
}
