// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// File decoder: FFmpeg pipeline feeding RGB frames through a bounded
// channel. A filter graph does the sampling and pixel conversion, so
// the frame callback only has to copy rows out of the AVFrame.

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use ez_ffmpeg::core::context::null_output::create_null_output;
use ez_ffmpeg::filter::frame_filter::FrameFilter;
use ez_ffmpeg::filter::frame_filter_context::FrameFilterContext;
use ez_ffmpeg::filter::frame_pipeline_builder::FramePipelineBuilder;
use ez_ffmpeg::{AVMediaType, FfmpegContext, Frame, Input};
use image::RgbImage;
use std::path::Path;

/// One decoded frame, indexed in decode order (post-sampling).
pub struct VideoFrame {
    pub index: u64,
    pub image: RgbImage,
}

/// 采样过滤器: rgb24帧 → 通道
#[derive(Clone)]
struct SampleFilter {
    tx: Sender<VideoFrame>,
    index: u64,
    dropped_frames: usize,
    total_frames: usize,
}

impl FrameFilter for SampleFilter {
    fn media_type(&self) -> AVMediaType {
        AVMediaType::AVMEDIA_TYPE_VIDEO
    }

    fn init(&mut self, _ctx: &FrameFilterContext) -> Result<(), String> {
        log::debug!("decode thread started");
        Ok(())
    }

    fn filter_frame(
        &mut self,
        frame: Frame,
        _ctx: &FrameFilterContext,
    ) -> Result<Option<Frame>, String> {
        unsafe {
            self.total_frames += 1;

            if frame.as_ptr().is_null() || frame.is_empty() || frame.is_corrupt() {
                self.dropped_frames += 1;
                return Ok(None);
            }

            let w = (*frame.as_ptr()).width as u32;
            let h = (*frame.as_ptr()).height as u32;
            if w == 0 || h == 0 {
                self.dropped_frames += 1;
                return Ok(None);
            }

            // rgb24: one packed plane
            let data = (*frame.as_ptr()).data[0];
            let stride = (*frame.as_ptr()).linesize[0] as usize;
            let row_len = w as usize * 3;
            if data.is_null() || stride < row_len {
                self.dropped_frames += 1;
                return Ok(None);
            }

            let mut buffer = vec![0u8; row_len * h as usize];
            for row in 0..h as usize {
                let src = std::slice::from_raw_parts(data.add(row * stride), row_len);
                buffer[row * row_len..(row + 1) * row_len].copy_from_slice(src);
            }

            let image = match RgbImage::from_raw(w, h, buffer) {
                Some(img) => img,
                None => {
                    self.dropped_frames += 1;
                    return Ok(None);
                }
            };

            let decoded = VideoFrame {
                index: self.index,
                image,
            };
            self.index += 1;

            // Blocking send applies backpressure on the decoder. A closed
            // channel means the consumer is done, stop decoding.
            if self.tx.send(decoded).is_err() {
                return Err(String::from(CONSUMER_GONE));
            }
        }
        Ok(Some(frame))
    }

    fn uninit(&mut self, _ctx: &FrameFilterContext) {
        if self.dropped_frames > 0 {
            log::debug!(
                "decoder dropped {} of {} frames",
                self.dropped_frames,
                self.total_frames
            );
        }
    }
}

const CONSUMER_GONE: &str = "frame consumer hung up";

/// Sequential reader over the video frames of a file.
///
/// With `sample_fps` set, FFmpeg's `fps` filter resamples the stream
/// before frames are handed over, which is how sparse extraction stays
/// cheap on long inputs.
pub struct FrameReader {
    rx: Receiver<VideoFrame>,
    handle: Option<std::thread::JoinHandle<Result<()>>>,
}

impl FrameReader {
    pub fn open(path: &Path, sample_fps: Option<f64>) -> Result<Self> {
        if !path.is_file() {
            return Err(anyhow!("video file not found: {}", path.display()));
        }
        let path = path
            .to_str()
            .ok_or_else(|| anyhow!("non-UTF-8 video path: {}", path.display()))?
            .to_string();

        let filter_desc = match sample_fps {
            Some(rate) => format!("fps={rate},format=rgb24"),
            None => String::from("format=rgb24"),
        };

        let (tx, rx) = bounded(4);
        let filter = SampleFilter {
            tx,
            index: 0,
            dropped_frames: 0,
            total_frames: 0,
        };

        let handle = std::thread::Builder::new()
            .name(String::from("video-decode"))
            .spawn(move || decode(&path, &filter_desc, filter))?;

        Ok(Self {
            rx,
            handle: Some(handle),
        })
    }

    pub fn next_frame(&mut self) -> Option<VideoFrame> {
        self.rx.recv().ok()
    }

    /// Join the decode thread and surface any decode failure. Call after
    /// draining; dropping the reader early instead is how a consumer
    /// cancels decoding.
    pub fn close(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| anyhow!("decode thread panicked"))?,
            None => Ok(()),
        }
    }
}

impl Iterator for FrameReader {
    type Item = VideoFrame;

    fn next(&mut self) -> Option<VideoFrame> {
        self.next_frame()
    }
}

fn decode(path: &str, filter_desc: &str, filter: SampleFilter) -> Result<()> {
    let pipe: FramePipelineBuilder = AVMediaType::AVMEDIA_TYPE_VIDEO.into();
    let pipe = pipe.filter("sample", Box::new(filter));
    let out = create_null_output().add_frame_pipeline(pipe);

    let ctx = FfmpegContext::builder()
        .input(Input::new(path))
        .filter_descs([filter_desc].into())
        .output(out)
        .build()
        .map_err(|e| anyhow!("failed to open {path}: {e}"))?;

    let sch = ctx
        .start()
        .map_err(|e| anyhow!("failed to start decoding {path}: {e}"))?;

    match sch.wait() {
        Ok(_) => Ok(()),
        // the filter aborts with CONSUMER_GONE when the reader is dropped
        Err(e) if e.to_string().contains(CONSUMER_GONE) => Ok(()),
        Err(e) => Err(anyhow!("decode error on {path}: {e}")),
    }
}
