// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

use super::{list_files, VIDEO_EXTENSIONS};
use crate::video::FrameReader;

pub struct ExtractConfig {
    pub videos_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Frames to keep per second of video.
    pub frame_rate: f64,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub videos: usize,
    pub frames: usize,
    pub skipped: usize,
}

pub fn frame_file_name(stem: &str, index: usize) -> String {
    format!("{stem}_frame_{index}.jpg")
}

/// Walk `videos_dir` and write sampled JPEG frames into `output_dir`.
/// A video that fails to decode is reported and skipped, the batch
/// keeps going.
pub fn extract_frames(config: &ExtractConfig) -> Result<ExtractSummary> {
    if config.frame_rate <= 0.0 {
        return Err(anyhow!("frame rate must be positive, got {}", config.frame_rate));
    }
    std::fs::create_dir_all(&config.output_dir)?;

    let videos = list_files(&config.videos_dir, VIDEO_EXTENSIONS)?;
    if videos.is_empty() {
        log::warn!("no video files found in {}", config.videos_dir.display());
    }

    let mut summary = ExtractSummary::default();
    for name in &videos {
        let video = config.videos_dir.join(name);
        match extract_one(&video, &config.output_dir, config.frame_rate) {
            Ok(count) => {
                println!("Extracted {count} frames from {name}");
                summary.videos += 1;
                summary.frames += count;
            }
            Err(e) => {
                log::error!("skipping {name}: {e:#}");
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}

fn extract_one(video: &Path, output_dir: &Path, frame_rate: f64) -> Result<usize> {
    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| anyhow!("bad video name: {}", video.display()))?
        .to_string();

    let mut reader = FrameReader::open(video, Some(frame_rate))?;
    let mut count = 0usize;
    while let Some(frame) = reader.next_frame() {
        let out = output_dir.join(frame_file_name(&stem, count));
        frame.image.save(&out)?;
        count += 1;
    }
    // surfaces decode errors on unreadable inputs
    reader.close()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_names_follow_video_stem() {
        assert_eq!(frame_file_name("demo_video", 0), "demo_video_frame_0.jpg");
        assert_eq!(frame_file_name("clip-2", 37), "clip-2_frame_37.jpg");
    }

    #[test]
    fn rejects_non_positive_rate() {
        let config = ExtractConfig {
            videos_dir: PathBuf::from("videos"),
            output_dir: PathBuf::from("out"),
            frame_rate: 0.0,
        };
        assert!(extract_frames(&config).is_err());
    }
}
