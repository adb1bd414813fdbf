//! Geometry shared by the API model and the annotator.
//!
//! API points carry a [`Normalized`] space marker and pixel positions a
//! [`Pixel`] marker, so the two cannot be mixed by accident. Normalized
//! points cross over through [`Coord::to_pixel`].

mod bbox;
mod coord;
mod space;

pub use bbox::{NormalizedPolygon, PixelBox};
pub use coord::Coord;
pub use space::{Normalized, Pixel};
