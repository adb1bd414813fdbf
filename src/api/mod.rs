//! Client for the remote object-detection API.
//!
//! One image goes to the single-image endpoint, two or more go to the batch
//! endpoint in one request. Failures are reported immediately; there are no
//! retries and no timeouts beyond the transport defaults.

mod model;

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::BboxerError;
use crate::source::EncodedPayload;

pub use model::{BatchResult, Detection, ImageResult, SingleResult};
use model::{PredictBatchRequest, PredictOneRequest};

/// Builds the blocking HTTP agent shared by the image source and the client.
///
/// Non-2xx statuses come back as responses rather than errors so callers can
/// read the error body.
pub fn agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build();
    config.into()
}

/// Typed view of a prediction response.
#[derive(Clone, Debug, PartialEq)]
pub enum PredictionKind {
    Single(SingleResult),
    Batch(BatchResult),
}

/// A successful prediction: the raw JSON body plus its typed form.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    raw: Value,
    kind: PredictionKind,
}

impl Prediction {
    /// The response body exactly as the server sent it.
    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn kind(&self) -> &PredictionKind {
        &self.kind
    }

    /// Detections per input image, in input order.
    ///
    /// Errors if the number of results differs from `expected`.
    pub fn per_image(&self, expected: usize) -> Result<Vec<&[Detection]>, BboxerError> {
        let detections: Vec<&[Detection]> = match &self.kind {
            PredictionKind::Single(single) => vec![single.detections.as_slice()],
            PredictionKind::Batch(batch) => batch
                .batch_results
                .iter()
                .map(|result| result.detections.as_slice())
                .collect(),
        };
        if detections.len() != expected {
            return Err(BboxerError::ResponseShape {
                expected,
                actual: detections.len(),
            });
        }
        Ok(detections)
    }
}

/// Parses a 2xx response body from the single (`batch == false`) or batch
/// endpoint.
pub fn parse_prediction(body: &[u8], batch: bool) -> Result<Prediction, BboxerError> {
    let raw: Value =
        serde_json::from_slice(body).map_err(|e| BboxerError::ResponseParse(e.to_string()))?;
    let kind = if batch {
        serde_json::from_value(raw.clone()).map(PredictionKind::Batch)
    } else {
        serde_json::from_value(raw.clone()).map(PredictionKind::Single)
    }
    .map_err(|e| BboxerError::ResponseParse(e.to_string()))?;
    Ok(Prediction { raw, kind })
}

/// Sends prediction requests to one base URL.
pub struct DetectionClient {
    agent: ureq::Agent,
    settings: Settings,
    base_url: String,
}

impl DetectionClient {
    pub fn new(agent: ureq::Agent, settings: Settings, base_url: impl Into<String>) -> Self {
        Self {
            agent,
            settings,
            base_url: base_url.into(),
        }
    }

    /// Submits the payloads in one request.
    ///
    /// `auth_header` is the full `Authorization` value (`"Bearer ..."`).
    pub fn predict(
        &self,
        payloads: &[EncodedPayload],
        auth_header: Option<&str>,
    ) -> Result<Prediction, BboxerError> {
        let (url, body, batch) = match payloads {
            [] => return Err(BboxerError::NoImages),
            [image] => (
                self.settings.predict_one_url(&self.base_url),
                serde_json::to_vec(&PredictOneRequest { image }),
                false,
            ),
            images => (
                self.settings.predict_batch_url(&self.base_url),
                serde_json::to_vec(&PredictBatchRequest { images }),
                true,
            ),
        };
        let body = body.map_err(|e| BboxerError::Http {
            url: url.clone(),
            message: e.to_string(),
        })?;

        info!(%url, images = payloads.len(), "requesting prediction");
        let started = Instant::now();

        let mut request = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json");
        if let Some(value) = auth_header {
            request = request.header("Authorization", value);
        }

        let mut response = request
            .send(body.as_slice())
            .map_err(|e| BboxerError::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "prediction response"
        );

        if !status.is_success() {
            // The error body is diagnostic only; an unreadable one must not
            // replace the status failure.
            let text = response.body_mut().read_to_string().unwrap_or_default();
            let body = serde_json::from_str::<Value>(&text).ok();
            warn!(status = status.as_u16(), "prediction request failed");
            return Err(BboxerError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| BboxerError::Http {
                url: url.clone(),
                message: e.to_string(),
            })?;
        parse_prediction(&bytes, batch)
    }
}
