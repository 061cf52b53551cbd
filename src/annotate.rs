// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// Overlay drawing for verification output: detection boxes, class
// labels and the verification banner.

use ab_glyph::{FontVec, PxScale};
use anyhow::{anyhow, Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::io::Read;

use crate::{Bbox, DetectionResult};

const FONT_URL: &str = "https://ultralytics.com/assets/Arial.ttf";

/// Label font, fetched once into the user cache directory.
pub fn load_font() -> Result<FontVec> {
    let mut path = dirs::cache_dir().ok_or_else(|| anyhow!("no cache directory"))?;
    path.push("textverify");
    std::fs::create_dir_all(&path)?;
    path.push("Arial.ttf");

    if !path.is_file() {
        log::info!("fetching label font -> {}", path.display());
        let resp = ureq::get(FONT_URL)
            .call()
            .with_context(|| format!("failed to download font from {FONT_URL}"))?;
        let mut bytes = Vec::new();
        resp.into_reader().read_to_end(&mut bytes)?;
        std::fs::write(&path, &bytes)?;
    }

    let bytes = std::fs::read(&path)?;
    FontVec::try_from_vec(bytes).map_err(|e| anyhow!("invalid font file: {e}"))
}

fn draw_box(frame: &mut RgbImage, bbox: &Bbox, color: Rgb<u8>) {
    let (fw, fh) = (frame.width() as f32, frame.height() as f32);
    let x = bbox.xmin().clamp(0.0, fw - 1.0) as i32;
    let y = bbox.ymin().clamp(0.0, fh - 1.0) as i32;
    let w = bbox.width().min(fw) as u32;
    let h = bbox.height().min(fh) as u32;
    if w < 2 || h < 2 {
        return;
    }
    // two nested rects for a 2px border
    draw_hollow_rect_mut(frame, Rect::at(x, y).of_size(w, h), color);
    if w > 4 && h > 4 {
        draw_hollow_rect_mut(frame, Rect::at(x + 1, y + 1).of_size(w - 2, h - 2), color);
    }
}

fn draw_label(frame: &mut RgbImage, font: &FontVec, text: &str, x: i32, y: i32, color: Rgb<u8>) {
    let scale = PxScale::from(18.0);
    let (tw, th) = text_size(scale, font, text);
    let ty = (y - th as i32 - 2).max(0);
    draw_filled_rect_mut(
        frame,
        Rect::at(x, ty).of_size(tw + 4, th + 4),
        Rgb([0u8, 0u8, 0u8]),
    );
    draw_text_mut(frame, color, x + 2, ty + 2, scale, font, text);
}

/// Draw boxes and `"{name} {conf:.2}"` labels for every detection.
pub fn draw_detections(
    frame: &mut RgbImage,
    result: &DetectionResult,
    names: &[String],
    palette: &[(u8, u8, u8)],
    font: &FontVec,
) {
    for bbox in result.bboxes() {
        let (r, g, b) = palette
            .get(bbox.id())
            .copied()
            .unwrap_or((0, 255, 0));
        let color = Rgb([r, g, b]);
        draw_box(frame, bbox, color);

        let name = names
            .get(bbox.id())
            .map(String::as_str)
            .unwrap_or("unknown");
        let label = format!("{} {:.2}", name, bbox.confidence());
        draw_label(frame, font, &label, bbox.xmin() as i32, bbox.ymin() as i32, color);
    }
}

/// Verification banner in the top-left corner.
pub fn draw_banner(frame: &mut RgbImage, font: &FontVec, message: &str) {
    let scale = PxScale::from(32.0);
    draw_text_mut(frame, Rgb([0u8, 255u8, 0u8]), 50, 50, scale, font, message);
}
