#![allow(dead_code)]

use bboxer::geom::{Coord, Normalized, NormalizedPolygon};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_unit_point() -> impl Strategy<Value = Coord<Normalized>> {
    (0.0f64..=1.0, 0.0f64..=1.0).prop_map(|(x, y)| Coord::new(x, y))
}

/// Polygons with 1 to `max_points` corners inside the unit square.
pub fn arb_polygon(max_points: usize) -> impl Strategy<Value = NormalizedPolygon> {
    prop::collection::vec(arb_unit_point(), 1..=max_points)
        .prop_map(|points| NormalizedPolygon::new(points).expect("non-empty"))
}

pub fn arb_image_size() -> impl Strategy<Value = (u32, u32)> {
    (1u32..=4096, 1u32..=4096)
}
