//! Points tagged with their coordinate space.

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::space::{Normalized, Pixel};

/// A 2D point whose space is fixed at the type level.
///
/// On the wire this is a plain `{"x": .., "y": ..}` object, which is how the
/// detection API encodes polygon corners. Extra keys are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Coord<TSpace> {
    pub x: f64,
    pub y: f64,
    #[serde(skip)]
    _space: PhantomData<TSpace>,
}

impl<TSpace> Coord<TSpace> {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            _space: PhantomData,
        }
    }

    /// Returns true if neither component is NaN or infinite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Coord<Normalized> {
    /// The pixel this point falls on in a `width` x `height` image.
    ///
    /// x scales with the width and y with the height, each floored. Results
    /// are clamped to one image extent past either edge.
    pub fn to_pixel(&self, width: u32, height: u32) -> Coord<Pixel> {
        Coord::new(scale_axis(self.x, width), scale_axis(self.y, height))
    }
}

fn scale_axis(value: f64, extent: u32) -> f64 {
    let extent = f64::from(extent);
    (value * extent).floor().clamp(-extent, 2.0 * extent)
}
