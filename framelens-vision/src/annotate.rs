//! Frame annotation
//!
//! Draws detections onto a frame in detector order: translucent instance
//! mask first, then the bounding box, then a filled label tag above the
//! box with the class name and confidence. Labels use an embedded 5x7
//! glyph table so no font asset ships with the binary.

use crate::detector::{Detection, Detector, Mask};
use framelens_core::{Color, InferenceConfig};
use image::imageops::FilterType;
use image::{ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

/// Glyph cell width in the embedded font.
const GLYPH_WIDTH: u32 = 5;
/// Glyph cell height in the embedded font.
const GLYPH_HEIGHT: u32 = 7;
/// Integer upscale factor for label text.
const GLYPH_SCALE: u32 = 2;
/// Padding inside the label tag, in output pixels.
const LABEL_PADDING: u32 = 3;

/// Draw all detections onto the frame in the given order.
pub fn annotate_frame(
    frame: &mut RgbImage,
    detections: &[Detection],
    detector: &dyn Detector,
    color: Color,
    config: &InferenceConfig,
) {
    // Masks underneath everything else, matching the source draw order.
    for detection in detections {
        if let Some(mask) = &detection.mask {
            blend_mask(frame, mask, color, config.mask_threshold, config.mask_alpha);
        }
    }

    for detection in detections {
        let bbox = detection.bbox.clamp_to(frame.width(), frame.height());
        let x = bbox.x1 as i32;
        let y = bbox.y1 as i32;
        let w = bbox.width().max(1.0) as u32;
        let h = bbox.height().max(1.0) as u32;

        draw_box(frame, x, y, w, h, color, config.box_thickness);

        let label = format!(
            "{} {:.2}",
            detector.class_name(detection.class_id),
            detection.confidence
        );
        draw_label(frame, &label, x, y, color);
    }
}

/// Alpha-blend the overlay color into the frame wherever the resized mask
/// probability exceeds the threshold.
fn blend_mask(frame: &mut RgbImage, mask: &Mask, color: Color, threshold: f32, alpha: f32) {
    let prob_map: ImageBuffer<Luma<f32>, Vec<f32>> =
        match ImageBuffer::from_raw(mask.width, mask.height, mask.data.clone()) {
            Some(buf) => buf,
            None => return,
        };
    let resized = image::imageops::resize(
        &prob_map,
        frame.width(),
        frame.height(),
        FilterType::Triangle,
    );

    let [cr, cg, cb] = color.to_rgb_array();
    for (x, y, pixel) in frame.enumerate_pixels_mut() {
        if resized.get_pixel(x, y)[0] > threshold {
            let Rgb([r, g, b]) = *pixel;
            *pixel = Rgb([
                blend_channel(r, cr, alpha),
                blend_channel(g, cg, alpha),
                blend_channel(b, cb, alpha),
            ]);
        }
    }
}

fn blend_channel(base: u8, overlay: u8, alpha: f32) -> u8 {
    (base as f32 * (1.0 - alpha) + overlay as f32 * alpha).round() as u8
}

/// Hollow rectangle with the configured line thickness, drawn as nested
/// 1px rectangles.
fn draw_box(frame: &mut RgbImage, x: i32, y: i32, w: u32, h: u32, color: Color, thickness: u32) {
    let rgb = Rgb(color.to_rgb_array());
    for t in 0..thickness {
        let inset_w = w.saturating_sub(2 * t);
        let inset_h = h.saturating_sub(2 * t);
        if inset_w == 0 || inset_h == 0 {
            break;
        }
        let rect = Rect::at(x + t as i32, y + t as i32).of_size(inset_w, inset_h);
        draw_hollow_rect_mut(frame, rect, rgb);
    }
}

/// Filled label tag above the box: overlay-colored background, black text.
/// When the box touches the top edge, the tag sits inside the box instead.
fn draw_label(frame: &mut RgbImage, label: &str, box_x: i32, box_y: i32, color: Color) {
    let text_width = label.chars().count() as u32 * (GLYPH_WIDTH + 1) * GLYPH_SCALE;
    let tag_width = text_width + 2 * LABEL_PADDING;
    let tag_height = GLYPH_HEIGHT * GLYPH_SCALE + 2 * LABEL_PADDING;

    let tag_x = box_x.max(0);
    let tag_y = (box_y - tag_height as i32).max(0);

    if tag_x as u32 >= frame.width() || tag_y as u32 >= frame.height() {
        return;
    }

    let tag_width = tag_width.min(frame.width() - tag_x as u32);
    let tag_height = tag_height.min(frame.height() - tag_y as u32);
    draw_filled_rect_mut(
        frame,
        Rect::at(tag_x, tag_y).of_size(tag_width.max(1), tag_height.max(1)),
        Rgb(color.to_rgb_array()),
    );

    draw_text(
        frame,
        label,
        tag_x + LABEL_PADDING as i32,
        tag_y + LABEL_PADDING as i32,
        Rgb([0, 0, 0]),
    );
}

/// Render text with the embedded glyph table. Each glyph byte is one
/// column, least significant bit at the top.
fn draw_text(frame: &mut RgbImage, text: &str, x: i32, y: i32, color: Rgb<u8>) {
    let mut cursor_x = x;
    let advance = ((GLYPH_WIDTH + 1) * GLYPH_SCALE) as i32;

    for ch in text.chars() {
        let columns = glyph(ch);
        for (col, bits) in columns.iter().enumerate() {
            for row in 0..GLYPH_HEIGHT {
                if bits & (1 << row) == 0 {
                    continue;
                }
                for sx in 0..GLYPH_SCALE {
                    for sy in 0..GLYPH_SCALE {
                        let px = cursor_x + (col as u32 * GLYPH_SCALE + sx) as i32;
                        let py = y + (row * GLYPH_SCALE + sy) as i32;
                        if px >= 0
                            && py >= 0
                            && (px as u32) < frame.width()
                            && (py as u32) < frame.height()
                        {
                            frame.put_pixel(px as u32, py as u32, color);
                        }
                    }
                }
            }
        }
        cursor_x += advance;
    }
}

/// 5x7 column bitmaps for the label character set. Letters render as
/// uppercase; anything unmapped renders as a full block.
fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x60, 0x60, 0x00, 0x00],
        '-' => [0x08, 0x08, 0x08, 0x08, 0x08],
        '_' => [0x40, 0x40, 0x40, 0x40, 0x40],
        '0' => [0x3E, 0x51, 0x49, 0x45, 0x3E],
        '1' => [0x00, 0x42, 0x7F, 0x40, 0x00],
        '2' => [0x42, 0x61, 0x51, 0x49, 0x46],
        '3' => [0x21, 0x41, 0x45, 0x4B, 0x31],
        '4' => [0x18, 0x14, 0x12, 0x7F, 0x10],
        '5' => [0x27, 0x45, 0x45, 0x45, 0x39],
        '6' => [0x3C, 0x4A, 0x49, 0x49, 0x30],
        '7' => [0x01, 0x71, 0x09, 0x05, 0x03],
        '8' => [0x36, 0x49, 0x49, 0x49, 0x36],
        '9' => [0x06, 0x49, 0x49, 0x29, 0x1E],
        'A' => [0x7E, 0x11, 0x11, 0x11, 0x7E],
        'B' => [0x7F, 0x49, 0x49, 0x49, 0x36],
        'C' => [0x3E, 0x41, 0x41, 0x41, 0x22],
        'D' => [0x7F, 0x41, 0x41, 0x22, 0x1C],
        'E' => [0x7F, 0x49, 0x49, 0x49, 0x41],
        'F' => [0x7F, 0x09, 0x09, 0x09, 0x01],
        'G' => [0x3E, 0x41, 0x49, 0x49, 0x7A],
        'H' => [0x7F, 0x08, 0x08, 0x08, 0x7F],
        'I' => [0x00, 0x41, 0x7F, 0x41, 0x00],
        'J' => [0x20, 0x40, 0x41, 0x3F, 0x01],
        'K' => [0x7F, 0x08, 0x14, 0x22, 0x41],
        'L' => [0x7F, 0x40, 0x40, 0x40, 0x40],
        'M' => [0x7F, 0x02, 0x0C, 0x02, 0x7F],
        'N' => [0x7F, 0x04, 0x08, 0x10, 0x7F],
        'O' => [0x3E, 0x41, 0x41, 0x41, 0x3E],
        'P' => [0x7F, 0x09, 0x09, 0x09, 0x06],
        'Q' => [0x3E, 0x41, 0x51, 0x21, 0x5E],
        'R' => [0x7F, 0x09, 0x19, 0x29, 0x46],
        'S' => [0x46, 0x49, 0x49, 0x49, 0x31],
        'T' => [0x01, 0x01, 0x7F, 0x01, 0x01],
        'U' => [0x3F, 0x40, 0x40, 0x40, 0x3F],
        'V' => [0x1F, 0x20, 0x40, 0x20, 0x1F],
        'W' => [0x3F, 0x40, 0x38, 0x40, 0x3F],
        'X' => [0x63, 0x14, 0x08, 0x14, 0x63],
        'Y' => [0x07, 0x08, 0x70, 0x08, 0x07],
        'Z' => [0x61, 0x51, 0x49, 0x45, 0x43],
        _ => [0x7F, 0x7F, 0x7F, 0x7F, 0x7F],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::{BBox, StubDetector};

    fn blank_frame(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([10, 10, 10]))
    }

    fn detection_at(x1: f32, y1: f32, x2: f32, y2: f32) -> Detection {
        Detection {
            bbox: BBox { x1, y1, x2, y2 },
            confidence: 0.87,
            class_id: 0,
            mask: None,
        }
    }

    #[test]
    fn test_box_drawn_in_overlay_color() {
        let mut frame = blank_frame(100, 100);
        let detections = vec![detection_at(20.0, 40.0, 80.0, 90.0)];
        let stub = StubDetector::default();
        annotate_frame(
            &mut frame,
            &detections,
            &stub,
            Color::GREEN,
            &InferenceConfig::default(),
        );
        // Top-left corner of the box edge carries the overlay color.
        assert_eq!(*frame.get_pixel(20, 40), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_custom_color_used() {
        let mut frame = blank_frame(100, 100);
        let detections = vec![detection_at(10.0, 50.0, 60.0, 90.0)];
        let stub = StubDetector::default();
        let red = Color::from_rgb([255, 0, 0]);
        annotate_frame(
            &mut frame,
            &detections,
            &stub,
            red,
            &InferenceConfig::default(),
        );
        assert_eq!(*frame.get_pixel(10, 50), Rgb([255, 0, 0]));
    }

    #[test]
    fn test_mask_blending_changes_pixels_above_threshold() {
        let mut frame = blank_frame(32, 32);
        let before = *frame.get_pixel(16, 16);
        let mask = Mask {
            width: 8,
            height: 8,
            data: vec![0.9; 64],
        };
        blend_mask(&mut frame, &mask, Color::GREEN, 0.5, 0.4);
        let after = *frame.get_pixel(16, 16);
        assert_ne!(before, after);
        // Green channel moved toward 255 at 0.4 opacity.
        assert_eq!(after[1], blend_channel(10, 255, 0.4));
    }

    #[test]
    fn test_mask_below_threshold_leaves_frame_untouched() {
        let mut frame = blank_frame(32, 32);
        let before = frame.clone();
        let mask = Mask {
            width: 8,
            height: 8,
            data: vec![0.2; 64],
        };
        blend_mask(&mut frame, &mask, Color::GREEN, 0.5, 0.4);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_no_detections_leaves_frame_untouched() {
        let mut frame = blank_frame(32, 32);
        let before = frame.clone();
        let stub = StubDetector::default();
        annotate_frame(
            &mut frame,
            &[],
            &stub,
            Color::GREEN,
            &InferenceConfig::default(),
        );
        assert_eq!(frame, before);
    }

    #[test]
    fn test_annotation_survives_box_at_frame_edge() {
        let mut frame = blank_frame(64, 64);
        // Box flush with the top-left corner; label has no room above.
        let detections = vec![detection_at(0.0, 0.0, 63.0, 63.0)];
        let stub = StubDetector::default();
        annotate_frame(
            &mut frame,
            &detections,
            &stub,
            Color::GREEN,
            &InferenceConfig::default(),
        );
        assert_eq!(frame.dimensions(), (64, 64));
    }

    #[test]
    fn test_label_tag_filled_above_box() {
        let mut frame = blank_frame(200, 200);
        let detections = vec![detection_at(20.0, 100.0, 180.0, 180.0)];
        let stub = StubDetector::default();
        annotate_frame(
            &mut frame,
            &detections,
            &stub,
            Color::GREEN,
            &InferenceConfig::default(),
        );
        // A pixel just above the box top edge sits inside the tag
        // background (or its black text).
        let px = *frame.get_pixel(25, 95);
        assert!(px == Rgb([0, 255, 0]) || px == Rgb([0, 0, 0]));
    }

    #[test]
    fn test_glyph_table_covers_label_charset() {
        for ch in "abcdefghijklmnopqrstuvwxyz0123456789 .-_".chars() {
            let block = glyph('\u{1F600}');
            assert_ne!(glyph(ch), block, "glyph for {:?} falls back to block", ch);
        }
    }
}
