//! Zero-sized coordinate space markers.
//!
//! Both are uninhabited and only appear as the type parameter of
//! [`Coord`](super::Coord), so an API point cannot be passed where a pixel
//! position is expected.

use std::fmt;

/// Fractions of the image width (x) and height (y), nominally in `[0, 1]`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

/// Whole pixels on a concrete image, origin at the top-left corner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
