use std::path::PathBuf;
use thiserror::Error;

/// The main error type for bboxer operations.
///
/// Every variant is terminal for the current invocation: nothing is retried.
#[derive(Debug, Error)]
pub enum BboxerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid image reference '{0}'")]
    InvalidImageRef(String),

    #[error("Image source unavailable: {reference}: {reason}")]
    SourceUnavailable { reference: String, reason: String },

    #[error("Failed to authenticate: {0}")]
    AuthenticationFailed(String),

    #[error("Request failed with status {status}")]
    RequestFailed {
        status: u16,
        /// Server error body, when it parsed as JSON.
        body: Option<serde_json::Value>,
    },

    #[error("HTTP request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("Failed to parse prediction response: {0}")]
    ResponseParse(String),

    #[error("Prediction response has {actual} result(s) for {expected} image(s)")]
    ResponseShape { expected: usize, actual: usize },

    #[error("No images given")]
    NoImages,

    #[error("Failed to write annotated image to {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Interrupted")]
    Interrupted,
}

impl BboxerError {
    pub(crate) fn source_unavailable(reference: impl Into<String>, reason: impl ToString) -> Self {
        BboxerError::SourceUnavailable {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }
}
