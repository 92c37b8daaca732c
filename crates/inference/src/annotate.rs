use crate::detection::DetectionBox;
use image::{Rgb, RgbImage};
use imageproc::{drawing::draw_hollow_rect_mut, rect::Rect};

pub const TARGET_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const OTHER_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
const LINE_THICKNESS: u32 = 2;

/// Draw every detection onto a copy of `frame`.
///
/// Boxes of `target_label` are red, everything else blue.
pub fn draw_detections(frame: &RgbImage, detections: &[DetectionBox], target_label: u16) -> RgbImage {
    let mut canvas = frame.clone();
    let (width, height) = canvas.dimensions();

    for det in detections {
        let Some(rect) = pixel_rect(det, width, height) else {
            tracing::trace!(?det, "Skipping degenerate box");
            continue;
        };
        let color = if det.class_id == target_label {
            TARGET_COLOR
        } else {
            OTHER_COLOR
        };

        for inset in 0..LINE_THICKNESS {
            let w = rect.width().saturating_sub(2 * inset);
            let h = rect.height().saturating_sub(2 * inset);
            if w == 0 || h == 0 {
                break;
            }
            let inner = Rect::at(rect.left() + inset as i32, rect.top() + inset as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, inner, color);
        }
    }

    canvas
}

fn pixel_rect(det: &DetectionBox, width: u32, height: u32) -> Option<Rect> {
    if width == 0 || height == 0 {
        return None;
    }
    let x1 = det.x1.max(0.0).round() as u32;
    let y1 = det.y1.max(0.0).round() as u32;
    let x2 = (det.x2.max(0.0).round() as u32).min(width - 1);
    let y2 = (det.y2.max(0.0).round() as u32).min(height - 1);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(Rect::at(x1 as i32, y1 as i32).of_size(x2 - x1 + 1, y2 - y1 + 1))
}
