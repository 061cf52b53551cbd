// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod annotate; // 标注绘制
pub mod config; // 检测器配置参数
pub mod dataset; // 数据集整理工具
pub mod model; // YOLOv8 模型
pub mod video; // 视频输入输出

pub mod ort_backend;
pub mod train;
pub mod verify;

pub use crate::config::DetectorArgs;
pub use crate::model::YOLOv8;
pub use crate::ort_backend::{OrtBackend, OrtConfig, OrtEP};

pub fn non_max_suppression(xs: &mut Vec<Bbox>, iou_threshold: f32) {
    xs.sort_by(|b1, b2| b2.confidence().partial_cmp(&b1.confidence()).unwrap());

    let mut current_index = 0;
    for index in 0..xs.len() {
        let mut drop = false;
        for prev_index in 0..current_index {
            let iou = xs[prev_index].iou(&xs[index]);
            if iou > iou_threshold {
                drop = true;
                break;
            }
        }
        if !drop {
            xs.swap(current_index, index);
            current_index += 1;
        }
    }
    xs.truncate(current_index);
}

/// Detections of a single frame.
#[derive(Clone, PartialEq, Default)]
pub struct DetectionResult {
    pub bboxes: Vec<Bbox>,
}

impl std::fmt::Debug for DetectionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectionResult")
            .field("Bboxes", &self.bboxes)
            .finish()
    }
}

impl DetectionResult {
    pub fn new(bboxes: Vec<Bbox>) -> Self {
        Self { bboxes }
    }

    pub fn bboxes(&self) -> &[Bbox] {
        &self.bboxes
    }

    pub fn is_empty(&self) -> bool {
        self.bboxes.is_empty()
    }

    /// Best detection of the given class at or above the confidence threshold.
    pub fn best_of_class(&self, id: usize, conf: f32) -> Option<&Bbox> {
        self.bboxes
            .iter()
            .filter(|b| b.id() == id && b.confidence() >= conf)
            .reduce(|max, b| {
                if b.confidence() > max.confidence() {
                    b
                } else {
                    max
                }
            })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bbox {
    // a bounding box around an object
    xmin: f32,
    ymin: f32,
    width: f32,
    height: f32,
    id: usize,
    confidence: f32,
}

impl Bbox {
    pub fn new(xmin: f32, ymin: f32, width: f32, height: f32, id: usize, confidence: f32) -> Self {
        Self {
            xmin,
            ymin,
            width,
            height,
            id,
            confidence,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn xmin(&self) -> f32 {
        self.xmin
    }

    pub fn ymin(&self) -> f32 {
        self.ymin
    }

    pub fn xmax(&self) -> f32 {
        self.xmin + self.width
    }

    pub fn ymax(&self) -> f32 {
        self.ymin + self.height
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn intersection_area(&self, another: &Bbox) -> f32 {
        let l = self.xmin.max(another.xmin);
        let r = (self.xmin + self.width).min(another.xmin + another.width);
        let t = self.ymin.max(another.ymin);
        let b = (self.ymin + self.height).min(another.ymin + another.height);
        (r - l + 1.).max(0.) * (b - t + 1.).max(0.)
    }

    pub fn union(&self, another: &Bbox) -> f32 {
        self.area() + another.area() - self.intersection_area(another)
    }

    pub fn iou(&self, another: &Bbox) -> f32 {
        self.intersection_area(another) / self.union(another)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_identical_boxes_is_one() {
        let a = Bbox::new(10.0, 10.0, 50.0, 50.0, 0, 0.9);
        let b = a.clone();
        assert!((a.iou(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn iou_of_disjoint_boxes_is_near_zero() {
        let a = Bbox::new(0.0, 0.0, 10.0, 10.0, 0, 0.9);
        let b = Bbox::new(500.0, 500.0, 10.0, 10.0, 0, 0.9);
        assert!(a.iou(&b) < 0.01);
    }

    #[test]
    fn nms_keeps_highest_confidence_among_overlaps() {
        let mut boxes = vec![
            Bbox::new(10.0, 10.0, 100.0, 100.0, 0, 0.7),
            Bbox::new(12.0, 12.0, 100.0, 100.0, 0, 0.9),
            Bbox::new(400.0, 400.0, 50.0, 50.0, 1, 0.6),
        ];
        non_max_suppression(&mut boxes, 0.45);
        assert_eq!(boxes.len(), 2);
        assert!((boxes[0].confidence() - 0.9).abs() < 1e-6);
        assert_eq!(boxes[1].id(), 1);
    }

    #[test]
    fn nms_keeps_non_overlapping_boxes() {
        let mut boxes = vec![
            Bbox::new(0.0, 0.0, 20.0, 20.0, 0, 0.8),
            Bbox::new(100.0, 100.0, 20.0, 20.0, 0, 0.5),
        ];
        non_max_suppression(&mut boxes, 0.45);
        assert_eq!(boxes.len(), 2);
    }

    #[test]
    fn best_of_class_respects_threshold_and_id() {
        let result = DetectionResult::new(vec![
            Bbox::new(0.0, 0.0, 10.0, 10.0, 0, 0.4),
            Bbox::new(0.0, 0.0, 10.0, 10.0, 0, 0.8),
            Bbox::new(0.0, 0.0, 10.0, 10.0, 1, 0.95),
        ]);
        let hit = result.best_of_class(0, 0.5).unwrap();
        assert!((hit.confidence() - 0.8).abs() < 1e-6);
        assert!(result.best_of_class(2, 0.1).is_none());
        assert!(result.best_of_class(0, 0.9).is_none());
    }
}
