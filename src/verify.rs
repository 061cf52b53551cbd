// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// Frame-by-frame verification: run the detector over a video, look for
// the target class above the confidence threshold, annotate hits and
// optionally re-encode the annotated stream.

use anyhow::{anyhow, Context, Result};
use image::DynamicImage;
use std::path::PathBuf;
use std::time::Instant;

use crate::annotate;
use crate::video::{probe, FrameReader, VideoSink};
use crate::{DetectionResult, YOLOv8};

/// Video-time cap for first-hit scans. Long recordings either show the
/// target early or not at all.
pub const FIRST_HIT_CAP_MS: u64 = 3 * 60 * 1000;

const PROGRESS_EVERY: u64 = 100;

pub struct VerifyOptions {
    pub input: PathBuf,
    pub target_class: usize,
    pub message: String,
    /// Where first-hit mode drops the annotated still.
    pub save_frame_dir: PathBuf,
    /// Annotated re-encode target, full-pass mode only.
    pub output: Option<PathBuf>,
    pub first_hit: bool,
    pub max_video_ms: u64,
}

#[derive(Debug, Default)]
pub struct VerifyOutcome {
    pub detected: bool,
    /// 1-based frame number of the first hit.
    pub detected_frame: Option<u64>,
    pub frames_processed: u64,
    pub saved_to: Option<PathBuf>,
}

/// Milliseconds of video time covered by `index` frames at `fps`.
pub fn ms_for_frame(index: u64, fps: f64) -> u64 {
    if fps <= 0.0 {
        return 0;
    }
    (index as f64 * 1000.0 / fps) as u64
}

fn class_hits(result: &DetectionResult, target_class: usize, conf: f32) -> DetectionResult {
    DetectionResult::new(
        result
            .bboxes()
            .iter()
            .filter(|b| b.id() == target_class && b.confidence() >= conf)
            .cloned()
            .collect(),
    )
}

pub fn run(model: &mut YOLOv8, options: &VerifyOptions) -> Result<VerifyOutcome> {
    if !options.input.is_file() {
        return Err(anyhow!("video file not found: {}", options.input.display()));
    }
    if options.first_hit {
        first_hit_scan(model, options)
    } else {
        full_pass(model, options)
    }
}

/// Stop at the first frame containing the target class, save it as an
/// annotated still and report the hit. Gives up past the video-time cap.
fn first_hit_scan(model: &mut YOLOv8, options: &VerifyOptions) -> Result<VerifyOutcome> {
    let info = probe(&options.input)?;
    let font = annotate::load_font()?;
    let started = Instant::now();

    let mut reader = FrameReader::open(&options.input, None)?;
    let mut outcome = VerifyOutcome::default();
    let mut capped = false;

    while let Some(frame) = reader.next_frame() {
        if ms_for_frame(frame.index, info.fps) > options.max_video_ms {
            log::info!(
                "no detection within the first {}s of video, giving up",
                options.max_video_ms / 1000
            );
            capped = true;
            break;
        }
        outcome.frames_processed += 1;
        if outcome.frames_processed % PROGRESS_EVERY == 0 {
            log::info!(
                "processed {} frames ({:.1}s elapsed)",
                outcome.frames_processed,
                started.elapsed().as_secs_f32()
            );
        }

        let image = DynamicImage::ImageRgb8(frame.image);
        let t_infer = Instant::now();
        let results = model.run(&[image.clone()])?;
        log::debug!(
            "frame {}: inference took {:?}",
            outcome.frames_processed,
            t_infer.elapsed()
        );
        let hits = class_hits(&results[0], options.target_class, model.conf());
        let best = match hits.best_of_class(options.target_class, model.conf()) {
            Some(bbox) => bbox.confidence(),
            None => continue,
        };
        log::info!(
            "target detected at frame {} (conf {best:.2})",
            outcome.frames_processed
        );

        let mut annotated = image.into_rgb8();
        annotate::draw_detections(
            &mut annotated,
            &hits,
            model.names(),
            model.color_palette(),
            &font,
        );
        annotate::draw_banner(&mut annotated, &font, &options.message);

        std::fs::create_dir_all(&options.save_frame_dir)?;
        let still = options
            .save_frame_dir
            .join(format!("detected_frame_{}.png", outcome.frames_processed));
        annotated
            .save(&still)
            .with_context(|| format!("cannot save {}", still.display()))?;

        outcome.detected = true;
        outcome.detected_frame = Some(outcome.frames_processed);
        outcome.saved_to = Some(still);
        // dropping the reader cancels the decode thread
        return Ok(outcome);
    }

    if !capped {
        // the channel closed on its own: a decoder failure must not
        // read as a clean "not detected"
        reader.close()?;
    }
    Ok(outcome)
}

/// Annotate every frame, re-encoding to `output` when requested.
fn full_pass(model: &mut YOLOv8, options: &VerifyOptions) -> Result<VerifyOutcome> {
    let info = probe(&options.input)?;
    let font = annotate::load_font()?;
    let started = Instant::now();

    let mut sink = match &options.output {
        Some(path) => Some(VideoSink::create(path, info.width, info.height, info.fps)?),
        None => None,
    };

    let mut reader = FrameReader::open(&options.input, None)?;
    let mut outcome = VerifyOutcome::default();

    while let Some(frame) = reader.next_frame() {
        outcome.frames_processed += 1;
        if outcome.frames_processed % PROGRESS_EVERY == 0 {
            log::info!(
                "processed {} frames ({:.1}s elapsed)",
                outcome.frames_processed,
                started.elapsed().as_secs_f32()
            );
        }

        let image = DynamicImage::ImageRgb8(frame.image);
        let t_infer = Instant::now();
        let results = model.run(&[image.clone()])?;
        log::debug!(
            "frame {}: inference took {:?}",
            outcome.frames_processed,
            t_infer.elapsed()
        );
        let hits = class_hits(&results[0], options.target_class, model.conf());

        let mut annotated = image.into_rgb8();
        if let Some(best) = hits.best_of_class(options.target_class, model.conf()) {
            if !outcome.detected {
                outcome.detected = true;
                outcome.detected_frame = Some(outcome.frames_processed);
                log::info!(
                    "target detected at frame {} (conf {:.2})",
                    outcome.frames_processed,
                    best.confidence()
                );
            }
            annotate::draw_detections(
                &mut annotated,
                &hits,
                model.names(),
                model.color_palette(),
                &font,
            );
            annotate::draw_banner(&mut annotated, &font, &options.message);
        }

        if let Some(sink) = sink.as_mut() {
            sink.write_frame(&annotated)?;
        }
    }
    reader.close()?;

    if let Some(sink) = sink.take() {
        let written = sink.finish()?;
        log::info!("wrote {written} annotated frames");
        outcome.saved_to = options.output.clone();
    }

    Ok(outcome)
}

/// Print the human verdict the way operators expect to read it.
pub fn report(outcome: &VerifyOutcome, options: &VerifyOptions) {
    if outcome.detected {
        println!(
            "{} (frame {} of {} processed)",
            options.message,
            outcome.detected_frame.unwrap_or(0),
            outcome.frames_processed
        );
        if let Some(path) = &outcome.saved_to {
            println!("Annotated output: {}", path.display());
        }
    } else {
        println!(
            "No detection in {} frames of {}",
            outcome.frames_processed,
            options.input.display()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bbox;

    #[test]
    fn frame_time_math() {
        assert_eq!(ms_for_frame(0, 30.0), 0);
        assert_eq!(ms_for_frame(30, 30.0), 1000);
        // the cap is exceeded after 3 minutes at 25fps
        assert!(ms_for_frame(25 * 180 + 1, 25.0) > FIRST_HIT_CAP_MS);
        assert!(ms_for_frame(25 * 180 - 1, 25.0) <= FIRST_HIT_CAP_MS);
        assert_eq!(ms_for_frame(100, 0.0), 0);
    }

    #[test]
    fn hit_filter_keeps_only_target_class_above_threshold() {
        let result = DetectionResult::new(vec![
            Bbox::new(0.0, 0.0, 10.0, 10.0, 0, 0.8),
            Bbox::new(0.0, 0.0, 10.0, 10.0, 0, 0.3),
            Bbox::new(0.0, 0.0, 10.0, 10.0, 1, 0.99),
        ]);
        let hits = class_hits(&result, 0, 0.5);
        assert_eq!(hits.bboxes().len(), 1);
        assert!((hits.bboxes()[0].confidence() - 0.8).abs() < 1e-6);

        let none = class_hits(&result, 2, 0.1);
        assert!(none.is_empty());
    }
}
