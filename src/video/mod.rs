// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// Video input/output: FFmpeg-backed decoding, probing and encoding.

pub mod probe;
pub mod reader;
pub mod writer;

pub use probe::{probe, VideoInfo};
pub use reader::{FrameReader, VideoFrame};
pub use writer::VideoSink;
