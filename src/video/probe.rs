// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::{anyhow, Context, Result};
use std::path::Path;
use std::process::Command;

/// Stream geometry and timing reported by ffprobe.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub nb_frames: Option<u64>,
    pub duration_s: Option<f64>,
}

/// Query the first video stream of `path` with ffprobe.
pub fn probe(path: &Path) -> Result<VideoInfo> {
    if !path.is_file() {
        return Err(anyhow!("video file not found: {}", path.display()));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_frames",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .context("failed to run ffprobe (is FFmpeg installed?)")?;

    if !output.status.success() {
        return Err(anyhow!(
            "ffprobe failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    parse_probe_output(&String::from_utf8_lossy(&output.stdout))
        .with_context(|| format!("unexpected ffprobe output for {}", path.display()))
}

/// ffprobe CSV: one stream line `width,height,r_frame_rate,nb_frames`
/// followed by one format line `duration`.
fn parse_probe_output(raw: &str) -> Result<VideoInfo> {
    let mut stream_line = None;
    let mut format_line = None;
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.matches(',').count() >= 2 {
            stream_line.get_or_insert(line);
        } else {
            format_line.get_or_insert(line);
        }
    }

    let stream = stream_line.ok_or_else(|| anyhow!("no video stream"))?;
    let fields: Vec<&str> = stream.split(',').collect();
    if fields.len() < 3 {
        return Err(anyhow!("short stream record: {stream}"));
    }

    let width: u32 = fields[0].parse().context("stream width")?;
    let height: u32 = fields[1].parse().context("stream height")?;
    let fps = parse_rate(fields[2])?;
    let nb_frames = fields.get(3).and_then(|v| v.parse().ok());
    let duration_s = format_line.and_then(|v| v.parse().ok());

    Ok(VideoInfo {
        width,
        height,
        fps,
        nb_frames,
        duration_s,
    })
}

/// `r_frame_rate` is a rational like `30000/1001`.
fn parse_rate(raw: &str) -> Result<f64> {
    match raw.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().context("frame rate numerator")?;
            let den: f64 = den.parse().context("frame rate denominator")?;
            if den == 0.0 {
                return Err(anyhow!("zero frame rate denominator: {raw}"));
            }
            Ok(num / den)
        }
        None => raw.parse().with_context(|| format!("bad frame rate: {raw}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ntsc_rate() {
        assert!((parse_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("25/1").unwrap(), 25.0);
    }

    #[test]
    fn parses_full_probe_record() {
        let raw = "1920,1080,30000/1001,5400\n180.5\n";
        let info = parse_probe_output(raw).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert!((info.fps - 29.97).abs() < 0.01);
        assert_eq!(info.nb_frames, Some(5400));
        assert_eq!(info.duration_s, Some(180.5));
    }

    #[test]
    fn tolerates_missing_frame_count() {
        // some containers report N/A for nb_frames
        let raw = "1280,720,25/1,N/A\n42.0\n";
        let info = parse_probe_output(raw).unwrap();
        assert_eq!(info.nb_frames, None);
        assert_eq!(info.fps, 25.0);
    }
}
