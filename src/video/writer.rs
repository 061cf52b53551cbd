// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use std::io::Write;
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

/// H.264 encoder fed raw rgb24 frames over an ffmpeg child's stdin.
pub struct VideoSink {
    child: Child,
    stdin: Option<ChildStdin>,
    width: u32,
    height: u32,
    frames: u64,
    path: String,
}

impl VideoSink {
    pub fn create(path: &Path, width: u32, height: u32, fps: f64) -> Result<Self> {
        Self::spawn("ffmpeg", path, width, height, fps)
    }

    fn spawn(bin: &str, path: &Path, width: u32, height: u32, fps: f64) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut child = Command::new(bin)
            .args([
                "-v",
                "error",
                "-y",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgb24",
                "-s",
                &format!("{width}x{height}"),
                "-r",
                &format!("{fps}"),
                "-i",
                "-",
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-pix_fmt",
                "yuv420p",
            ])
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to launch ffmpeg (is FFmpeg installed?)")?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| anyhow!("no stdin handle on ffmpeg child"))?;

        Ok(Self {
            child,
            stdin: Some(stdin),
            width,
            height,
            frames: 0,
            path: path.display().to_string(),
        })
    }

    pub fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.width() != self.width || frame.height() != self.height {
            return Err(anyhow!(
                "frame size {}x{} does not match sink {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            ));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| anyhow!("sink already finished"))?;
        stdin
            .write_all(frame.as_raw())
            .with_context(|| format!("encoder rejected frame {}", self.frames))?;
        self.frames += 1;
        Ok(())
    }

    /// Close stdin and wait for the encoder to flush. Returns the number
    /// of frames written.
    pub fn finish(mut self) -> Result<u64> {
        drop(self.stdin.take());
        let status = self.child.wait().context("waiting for ffmpeg")?;
        if !status.success() {
            return Err(anyhow!("ffmpeg exited with {status} writing {}", self.path));
        }
        Ok(self.frames)
    }
}

// Reap the child when the sink is abandoned mid-stream (encoder died,
// caller bailed on a write error) so no zombie is left behind.
impl Drop for VideoSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        match self.child.try_wait() {
            Ok(Some(status)) => {
                if !status.success() {
                    log::warn!("encoder for {} exited with {status}", self.path);
                }
            }
            _ => {
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_frame_size() {
        let dir = tempfile::tempdir().unwrap();
        // the size check fires before anything reaches the child
        let mut sink =
            VideoSink::spawn("cat", &dir.path().join("out.mp4"), 8, 8, 25.0).unwrap();
        let wrong = RgbImage::new(4, 4);
        assert!(sink.write_frame(&wrong).is_err());
    }

    #[test]
    fn reports_write_failure_and_reaps_dead_encoder() {
        let dir = tempfile::tempdir().unwrap();
        // `false` exits immediately, closing the pipe's read end
        let mut sink =
            VideoSink::spawn("false", &dir.path().join("out.mp4"), 4, 4, 25.0).unwrap();
        let frame = RgbImage::new(4, 4);

        let mut failed = false;
        for _ in 0..10_000 {
            if sink.write_frame(&frame).is_err() {
                failed = true;
                break;
            }
        }
        assert!(failed);
        // dropping without finish() must reap the child, not hang
        drop(sink);
    }
}
