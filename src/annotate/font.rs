//! A tiny 5x7 bitmap font for box labels.
//!
//! Letters render in upper case. Characters without a glyph leave a blank
//! cell of the same width.

use image::{Rgb, RgbImage};

pub const GLYPH_WIDTH: i64 = 5;
pub const GLYPH_HEIGHT: i64 = 7;
/// Horizontal distance between glyph origins, in unscaled pixels.
pub const GLYPH_ADVANCE: i64 = 6;

/// Width in pixels of `text` drawn at `scale`, without trailing spacing.
pub fn text_width(text: &str, scale: i64) -> i64 {
    let cells = text.chars().count() as i64;
    if cells == 0 {
        return 0;
    }
    (cells * GLYPH_ADVANCE - (GLYPH_ADVANCE - GLYPH_WIDTH)) * scale
}

/// Draws `text` with its top-left corner at (`x`, `y`), clipped to the image.
pub fn draw_text(image: &mut RgbImage, x: i64, y: i64, text: &str, scale: i64, color: Rgb<u8>) {
    let (width, height) = (i64::from(image.width()), i64::from(image.height()));
    let mut origin = x;
    for ch in text.chars().flat_map(char::to_uppercase) {
        if let Some(rows) = glyph(ch) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if (bits >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                        continue;
                    }
                    let px = origin.saturating_add(col * scale);
                    let py = y.saturating_add(row as i64 * scale);
                    for dy in 0..scale {
                        for dx in 0..scale {
                            let (cx, cy) = (px.saturating_add(dx), py.saturating_add(dy));
                            if (0..width).contains(&cx) && (0..height).contains(&cy) {
                                image.put_pixel(cx as u32, cy as u32, color);
                            }
                        }
                    }
                }
            }
        }
        origin = origin.saturating_add(GLYPH_ADVANCE * scale);
    }
}

fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'B' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'D' => [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110],
        'E' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000, 0b10000],
        'G' => [0b01110, 0b10001, 0b10000, 0b10111, 0b10001, 0b10001, 0b01111],
        'H' => [0b10001, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'J' => [0b00111, 0b00010, 0b00010, 0b00010, 0b00010, 0b10010, 0b01100],
        'K' => [0b10001, 0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'M' => [0b10001, 0b11011, 0b10101, 0b10101, 0b10001, 0b10001, 0b10001],
        'N' => [0b10001, 0b11001, 0b10101, 0b10101, 0b10011, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'P' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10000, 0b10000, 0b10000],
        'Q' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b01110, 0b00001, 0b00001, 0b10001, 0b01110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'V' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01010, 0b00100],
        'W' => [0b10001, 0b10001, 0b10001, 0b10101, 0b10101, 0b10101, 0b01010],
        'X' => [0b10001, 0b10001, 0b01010, 0b00100, 0b01010, 0b10001, 0b10001],
        'Y' => [0b10001, 0b10001, 0b01010, 0b00100, 0b00100, 0b00100, 0b00100],
        'Z' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        '.' => [0, 0, 0, 0, 0, 0b00110, 0b00110],
        '-' => [0, 0, 0, 0b11111, 0, 0, 0],
        '_' => [0, 0, 0, 0, 0, 0, 0b11111],
        '/' => [0b00001, 0b00010, 0b00010, 0b00100, 0b01000, 0b01000, 0b10000],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_width() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("a", 1), 5);
        assert_eq!(text_width("dog 0.87", 2), (8 * 6 - 1) * 2);
    }

    #[test]
    fn test_draw_text_is_case_insensitive() {
        let blank = RgbImage::new(20, 10);
        let white = Rgb([255, 255, 255]);

        let mut lower = blank.clone();
        draw_text(&mut lower, 1, 1, "ok", 1, white);
        let mut upper = blank.clone();
        draw_text(&mut upper, 1, 1, "OK", 1, white);

        assert_eq!(lower, upper);
        assert_ne!(lower, blank);
    }

    #[test]
    fn test_draw_text_clips_at_edges() {
        let mut image = RgbImage::new(4, 4);
        draw_text(&mut image, -3, -3, "8", 2, Rgb([1, 2, 3]));
        draw_text(&mut image, 100, 100, "8", 2, Rgb([1, 2, 3]));
        draw_text(&mut image, i64::MAX - 1, i64::MAX - 1, "88", 2, Rgb([1, 2, 3]));
        assert!(image.pixels().all(|p| *p == Rgb([1, 2, 3]) || *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_space_has_no_ink() {
        let mut image = RgbImage::new(12, 8);
        draw_text(&mut image, 0, 0, " ", 1, Rgb([255, 0, 0]));
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
