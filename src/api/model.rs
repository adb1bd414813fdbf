//! Request and response bodies of the detection API.

use serde::{Deserialize, Serialize};

use crate::geom::NormalizedPolygon;
use crate::source::EncodedPayload;

/// One detected object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub name: String,
    pub score: f64,
    pub bounding_box: NormalizedPolygon,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictOneRequest<'a> {
    pub image: &'a EncodedPayload,
}

#[derive(Debug, Serialize)]
pub(crate) struct PredictBatchRequest<'a> {
    pub images: &'a [EncodedPayload],
}

/// Response of the single-image endpoint.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SingleResult {
    /// Server-side inference time.
    pub time: f64,
    pub detections: Vec<Detection>,
}

/// Detections for one image of a batch.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ImageResult {
    pub detections: Vec<Detection>,
}

/// Response of the batch endpoint, in input order.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub batch_results: Vec<ImageResult>,
}
