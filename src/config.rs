// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

/// Detector options shared by every binary that loads ONNX weights.
#[derive(Parser, Clone, Debug)]
pub struct DetectorArgs {
    /// ONNX model path
    #[arg(long, required = true)]
    pub model: String,

    /// Device id for CUDA / TensorRT
    #[arg(long, default_value_t = 0)]
    pub device_id: u32,

    /// Enable TensorRT execution provider
    #[arg(long)]
    pub trt: bool,

    /// Enable CUDA execution provider
    #[arg(long)]
    pub cuda: bool,

    /// Confidence threshold
    #[arg(long, default_value_t = 0.5)]
    pub conf: f32,

    /// NMS IoU threshold
    #[arg(long, default_value_t = 0.45)]
    pub iou: f32,

    /// Model input height
    #[arg(long, default_value_t = 640)]
    pub height: u32,

    /// Model input width
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Number of classes, for models without embedded metadata
    #[arg(long)]
    pub nc: Option<u32>,

    /// Print per-stage timings
    #[arg(long)]
    pub profile: bool,
}
