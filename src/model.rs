// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// YOLOv8 detection model: loading, preprocess, inference, postprocess.

use anyhow::{anyhow, Result};
use image::{DynamicImage, GenericImageView};
use ndarray::{s, Array, Axis, IxDyn};

use crate::{non_max_suppression, Bbox, DetectionResult, DetectorArgs, OrtBackend, OrtConfig, OrtEP};

const CXYWH_OFFSET: usize = 4;

pub struct YOLOv8 {
    engine: OrtBackend,
    nc: u32,
    height: u32,
    width: u32,
    conf: f32,
    iou: f32,
    names: Vec<String>,
    color_palette: Vec<(u8, u8, u8)>,
    profile: bool,
}

impl YOLOv8 {
    pub fn new(config: &DetectorArgs) -> Result<Self> {
        // execution provider
        let ep = if config.trt {
            OrtEP::Trt(config.device_id)
        } else if config.cuda {
            OrtEP::CUDA(config.device_id)
        } else {
            OrtEP::CPU
        };

        let engine = OrtBackend::build(OrtConfig {
            model_path: config.model.clone(),
            ep,
        })?;

        let nc = engine
            .nc()
            .or(config.nc)
            .ok_or_else(|| anyhow!("failed to get num_classes, make it explicit with `--nc`"))?;

        // class names
        let names = engine.names().unwrap_or_else(|| {
            (0..nc).map(|i| format!("class_{i}")).collect()
        });

        // color palette
        let bright_colors = [
            (0, 255, 0),
            (255, 0, 0),
            (0, 0, 255),
            (255, 255, 0),
            (255, 0, 255),
            (0, 255, 255),
            (255, 128, 0),
            (255, 0, 128),
            (128, 255, 0),
            (0, 128, 255),
            (255, 255, 255),
            (128, 0, 255),
        ];
        let color_palette: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, _)| bright_colors[i % bright_colors.len()])
            .collect();

        Ok(Self {
            engine,
            names,
            conf: config.conf,
            iou: config.iou,
            color_palette,
            profile: config.profile,
            nc,
            height: config.height,
            width: config.width,
        })
    }

    fn scale_wh(&self, w0: f32, h0: f32, w1: f32, h1: f32) -> (f32, f32, f32) {
        let r = (w1 / w0).min(h1 / h0);
        (r, (w0 * r).round(), (h0 * r).round())
    }

    /// Letterbox resize to NCHW, gray padding.
    pub fn preprocess(&self, xs: &[DynamicImage]) -> Result<Array<f32, IxDyn>> {
        let mut ys =
            Array::ones((xs.len(), 3, self.height as usize, self.width as usize)).into_dyn();
        ys.fill(144.0 / 255.0);
        for (idx, x) in xs.iter().enumerate() {
            let (w0, h0) = x.dimensions();
            let (_, w_new, h_new) = self.scale_wh(
                w0 as f32,
                h0 as f32,
                self.width as f32,
                self.height as f32,
            );
            let img = x.resize_exact(
                w_new as u32,
                h_new as u32,
                image::imageops::FilterType::Triangle,
            );

            for (x, y, rgb) in img.pixels() {
                let x = x as usize;
                let y = y as usize;
                let [r, g, b, _] = rgb.0;
                ys[[idx, 0, y, x]] = (r as f32) / 255.0;
                ys[[idx, 1, y, x]] = (g as f32) / 255.0;
                ys[[idx, 2, y, x]] = (b as f32) / 255.0;
            }
        }

        Ok(ys)
    }

    pub fn run(&mut self, xs: &[DynamicImage]) -> Result<Vec<DetectionResult>> {
        let t_pre = std::time::Instant::now();
        let xs_ = self.preprocess(xs)?;
        if self.profile {
            println!("[Model Preprocess]: {:?}", t_pre.elapsed());
        }

        let ys = self.engine.run(xs_, self.profile)?;

        let t_post = std::time::Instant::now();
        let ys = self.postprocess(ys, xs)?;
        if self.profile {
            println!("[Model Postprocess]: {:?}", t_post.elapsed());
        }

        Ok(ys)
    }

    /// Decode the raw prediction head: [batch, 4 + nc, anchors].
    pub fn postprocess(
        &self,
        xs: Vec<Array<f32, IxDyn>>,
        xs0: &[DynamicImage],
    ) -> Result<Vec<DetectionResult>> {
        let preds = xs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;

        let mut ys = Vec::new();
        for (idx, anchor) in preds.axis_iter(Axis(0)).enumerate() {
            let width_original = xs0[idx].width() as f32;
            let height_original = xs0[idx].height() as f32;
            let ratio =
                (self.width as f32 / width_original).min(self.height as f32 / height_original);

            let mut data: Vec<Bbox> = Vec::new();
            for pred in anchor.axis_iter(Axis(1)) {
                let bbox = pred.slice(s![0..CXYWH_OFFSET]);
                let clss = pred.slice(s![CXYWH_OFFSET..CXYWH_OFFSET + self.nc as usize]);

                let (id, &confidence) = clss
                    .into_iter()
                    .enumerate()
                    .reduce(|max, x| if x.1 > max.1 { x } else { max })
                    .ok_or_else(|| anyhow!("prediction row shorter than 4 + nc"))?;

                if confidence < self.conf {
                    continue;
                }

                let cx = bbox[0] / ratio;
                let cy = bbox[1] / ratio;
                let w = bbox[2] / ratio;
                let h = bbox[3] / ratio;
                let x = cx - w / 2.;
                let y = cy - h / 2.;
                data.push(Bbox::new(
                    x.max(0.0f32).min(width_original),
                    y.max(0.0f32).min(height_original),
                    w,
                    h,
                    id,
                    confidence,
                ));
            }

            non_max_suppression(&mut data, self.iou);
            ys.push(DetectionResult::new(data));
        }

        Ok(ys)
    }

    pub fn summary(&self) {
        println!(
            "\nSummary:\n\
            > Model: {}{}\n\
            > EP: {:?} {}\n\
            > Dtype: {:?}\n\
            > Height: {}, Width: {}\n\
            > nc: {}, conf: {}, iou: {}\n\
            > names: {:?}\n\
            ",
            env!("CARGO_PKG_NAME"),
            match self.engine.author().zip(self.engine.version()) {
                Some((author, ver)) => format!(" ({} {})", author, ver),
                None => String::from(""),
            },
            self.engine.ep(),
            if let OrtEP::CPU = self.engine.ep() {
                ""
            } else {
                "(May still fall back to CPU)"
            },
            self.engine.dtype(),
            self.height,
            self.width,
            self.nc,
            self.conf,
            self.iou,
            self.names,
        );
    }

    pub fn conf(&self) -> f32 {
        self.conf
    }

    pub fn iou(&self) -> f32 {
        self.iou
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn nc(&self) -> u32 {
        self.nc
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn color_palette(&self) -> &[(u8, u8, u8)] {
        &self.color_palette
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    // Decode math exercised without an ONNX session, on a helper that
    // mirrors the postprocess anchor layout.
    fn decode_one(
        pred: Array3<f32>,
        nc: usize,
        conf: f32,
        iou: f32,
        model_wh: (f32, f32),
        image_wh: (f32, f32),
    ) -> Vec<Bbox> {
        let ratio = (model_wh.0 / image_wh.0).min(model_wh.1 / image_wh.1);
        let anchor = pred.index_axis_move(Axis(0), 0);
        let mut data = Vec::new();
        for p in anchor.axis_iter(Axis(1)) {
            let bbox = p.slice(s![0..4]);
            let clss = p.slice(s![4..4 + nc]);
            let (id, &confidence) = clss
                .into_iter()
                .enumerate()
                .reduce(|max, x| if x.1 > max.1 { x } else { max })
                .unwrap();
            if confidence < conf {
                continue;
            }
            let w = bbox[2] / ratio;
            let h = bbox[3] / ratio;
            let x = bbox[0] / ratio - w / 2.;
            let y = bbox[1] / ratio - h / 2.;
            data.push(Bbox::new(x.max(0.0), y.max(0.0), w, h, id, confidence));
        }
        non_max_suppression(&mut data, iou);
        data
    }

    #[test]
    fn decode_scales_boxes_back_to_source_dimensions() {
        // one anchor, nc = 2, model 640x640, source 1280x720 -> ratio 0.5
        let mut pred = Array3::<f32>::zeros((1, 6, 2));
        // anchor 0: confident class 1 at model-space center (320, 180), 100x50
        pred[[0, 0, 0]] = 320.0;
        pred[[0, 1, 0]] = 180.0;
        pred[[0, 2, 0]] = 100.0;
        pred[[0, 3, 0]] = 50.0;
        pred[[0, 4, 0]] = 0.1;
        pred[[0, 5, 0]] = 0.9;
        // anchor 1: below threshold
        pred[[0, 4, 1]] = 0.2;
        pred[[0, 5, 1]] = 0.3;

        let boxes = decode_one(pred, 2, 0.5, 0.45, (640.0, 640.0), (1280.0, 720.0));
        assert_eq!(boxes.len(), 1);
        let b = &boxes[0];
        assert_eq!(b.id(), 1);
        assert!((b.width() - 200.0).abs() < 1e-3);
        assert!((b.height() - 100.0).abs() < 1e-3);
        assert!((b.xmin() - (640.0 - 100.0)).abs() < 1e-3);
        assert!((b.ymin() - (360.0 - 50.0)).abs() < 1e-3);
    }
}
