//! Bounding boxes: the normalized polygon the API returns and the integer
//! pixel box drawn onto images.

use serde::{Deserialize, Serialize};

use super::coord::Coord;
use super::space::{Normalized, Pixel};

/// Polygon corners as fractions of image width and height.
///
/// Always holds at least one point; deserialization rejects an empty array.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NormalizedPolygon(Vec<Coord<Normalized>>);

impl NormalizedPolygon {
    /// Creates a polygon, or `None` when `points` is empty.
    pub fn new(points: Vec<Coord<Normalized>>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self(points))
        }
    }

    pub fn points(&self) -> &[Coord<Normalized>] {
        &self.0
    }

    /// True if every corner has finite coordinates.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(Coord::is_finite)
    }

    /// Axis-aligned pixel box enclosing the polygon on a `width` x `height`
    /// image. x pairs with width and y with height; each edge is floored.
    pub fn to_pixel_box(&self, width: u32, height: u32) -> PixelBox {
        let corners: Vec<Coord<Pixel>> = self
            .0
            .iter()
            .map(|point| point.to_pixel(width, height))
            .collect();
        PixelBox::enclosing(&corners).unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for NormalizedPolygon {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<Coord<Normalized>>::deserialize(deserializer)?;
        NormalizedPolygon::new(points)
            .ok_or_else(|| serde::de::Error::custom("bounding box has no points"))
    }
}

/// An axis-aligned box in integer pixel coordinates (XYXY).
///
/// Not clipped to any image: boxes from out-of-range predictions may extend
/// past the edges and are clipped when drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PixelBox {
    pub x_min: i64,
    pub y_min: i64,
    pub x_max: i64,
    pub y_max: i64,
}

impl PixelBox {
    #[inline]
    pub fn from_xyxy(x_min: i64, y_min: i64, x_max: i64, y_max: i64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Smallest box containing all `corners`, or `None` if there are none.
    pub fn enclosing(corners: &[Coord<Pixel>]) -> Option<Self> {
        let (first, rest) = corners.split_first()?;
        let (mut x_lo, mut y_lo, mut x_hi, mut y_hi) = (first.x, first.y, first.x, first.y);
        for corner in rest {
            x_lo = x_lo.min(corner.x);
            x_hi = x_hi.max(corner.x);
            y_lo = y_lo.min(corner.y);
            y_hi = y_hi.max(corner.y);
        }
        Some(Self::from_xyxy(
            x_lo as i64,
            y_lo as i64,
            x_hi as i64,
            y_hi as i64,
        ))
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.x_max.saturating_sub(self.x_min)
    }

    #[inline]
    pub fn height(&self) -> i64 {
        self.y_max.saturating_sub(self.y_min)
    }

    /// Returns true if min <= max on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.x_min <= self.x_max && self.y_min <= self.y_max
    }
}
