//! Fuzz target for prediction response parsing.
//!
//! Feeds arbitrary bytes to both the single and the batch response parser,
//! then converts every returned polygon to a pixel box.
//!
//! Run with:
//!   cargo +nightly fuzz run prediction_response_parse

#![no_main]

use bboxer::annotate::normalize;
use bboxer::api::{parse_prediction, PredictionKind};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Prediction responses are small; cap input to avoid OOM.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    for batch in [false, true] {
        let Ok(prediction) = parse_prediction(data, batch) else {
            continue;
        };
        let detections: Vec<_> = match prediction.kind() {
            PredictionKind::Single(single) => single.detections.iter().collect(),
            PredictionKind::Batch(batch) => batch
                .batch_results
                .iter()
                .flat_map(|result| result.detections.iter())
                .collect(),
        };
        for detection in detections {
            let _ = normalize(&detection.bounding_box, 1920, 1080);
        }
    }
});
