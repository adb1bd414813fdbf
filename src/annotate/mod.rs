//! Draws detections onto images.
//!
//! Normalized polygons from the API become integer pixel boxes, which are
//! rendered as unfilled rectangles with a filled label tab above the top
//! edge. Drawing is best effort: anything outside the image is clipped.

mod font;

use image::{Rgb, RgbImage};
use tracing::warn;

use crate::api::Detection;
use crate::geom::{NormalizedPolygon, PixelBox};

pub const STROKE_WIDTH: i64 = 3;
pub const BOX_COLOR: Rgb<u8> = Rgb([230, 25, 75]);
pub const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
pub const LABEL_SCALE: i64 = 2;
pub const LABEL_PADDING: i64 = 2;

/// A pixel box with the text drawn next to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabeledBox {
    pub bbox: PixelBox,
    pub label: String,
}

impl LabeledBox {
    pub fn new(bbox: PixelBox, name: &str, score: f64) -> Self {
        Self {
            bbox,
            label: format!("{name} {score:.2}"),
        }
    }
}

/// Converts a normalized polygon into a pixel box on a `width` x `height`
/// image.
pub fn normalize(polygon: &NormalizedPolygon, width: u32, height: u32) -> PixelBox {
    polygon.to_pixel_box(width, height)
}

/// Pixel boxes for all detections of one image.
///
/// Detections with a non-finite corner are skipped.
pub fn labeled_boxes(detections: &[Detection], width: u32, height: u32) -> Vec<LabeledBox> {
    detections
        .iter()
        .filter(|detection| {
            let finite = detection.bounding_box.is_finite();
            if !finite {
                warn!(name = %detection.name, "skipping detection with non-finite box");
            }
            finite
        })
        .map(|detection| {
            LabeledBox::new(
                normalize(&detection.bounding_box, width, height),
                &detection.name,
                detection.score,
            )
        })
        .collect()
}

/// Returns a copy of `image` with every box and its label drawn on it.
///
/// Boxes whose minimum exceeds their maximum on either axis are skipped.
pub fn render(image: &RgbImage, boxes: &[LabeledBox]) -> RgbImage {
    let mut canvas = image.clone();
    let drawable: Vec<&LabeledBox> = boxes
        .iter()
        .filter(|labeled| labeled.bbox.is_ordered())
        .collect();

    for labeled in &drawable {
        stroke_rect(&mut canvas, &labeled.bbox, STROKE_WIDTH, BOX_COLOR);
    }

    // Labels go on top of every rectangle.
    let label_height = font::GLYPH_HEIGHT * LABEL_SCALE + 2 * LABEL_PADDING;
    for labeled in &drawable {
        let label_width = font::text_width(&labeled.label, LABEL_SCALE) + 2 * LABEL_PADDING;
        let left = labeled.bbox.x_min;
        let mut top = labeled.bbox.y_min.saturating_sub(label_height);
        if top < 0 {
            top = labeled.bbox.y_min;
        }
        fill_rect(
            &mut canvas,
            PixelBox::from_xyxy(
                left,
                top,
                left.saturating_add(label_width - 1),
                top.saturating_add(label_height - 1),
            ),
            BOX_COLOR,
        );
        font::draw_text(
            &mut canvas,
            left.saturating_add(LABEL_PADDING),
            top.saturating_add(LABEL_PADDING),
            &labeled.label,
            LABEL_SCALE,
            TEXT_COLOR,
        );
    }

    canvas
}

/// Fills the inclusive rectangle `area`, clipped to the image.
fn fill_rect(image: &mut RgbImage, area: PixelBox, color: Rgb<u8>) {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    let left = area.x_min.max(0);
    let top = area.y_min.max(0);
    let right = area.x_max.min(width - 1);
    let bottom = area.y_max.min(height - 1);
    if left > right || top > bottom {
        return;
    }

    for y in top..=bottom {
        for x in left..=right {
            image.put_pixel(x as u32, y as u32, color);
        }
    }
}

/// Draws the outline of `bbox`, growing the stroke inward. Boxes thinner
/// than the stroke are filled.
fn stroke_rect(image: &mut RgbImage, bbox: &PixelBox, stroke: i64, color: Rgb<u8>) {
    let PixelBox {
        x_min,
        y_min,
        x_max,
        y_max,
    } = *bbox;
    let edge = (stroke - 1).min(bbox.width()).min(bbox.height());

    fill_rect(image, PixelBox::from_xyxy(x_min, y_min, x_max, y_min + edge), color);
    fill_rect(image, PixelBox::from_xyxy(x_min, y_max - edge, x_max, y_max), color);
    fill_rect(image, PixelBox::from_xyxy(x_min, y_min, x_min + edge, y_max), color);
    fill_rect(image, PixelBox::from_xyxy(x_max - edge, y_min, x_max, y_max), color);
}
