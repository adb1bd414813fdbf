//! Saving annotated images without overwriting earlier runs.

use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::info;

use crate::error::BboxerError;

const SUFFIX: &str = "bboxes";
const EXTENSION: &str = "png";

/// First free path among `<stem>_bboxes.png`, `<stem>_bboxes_1.png`, ...
///
/// Probing is not atomic; two concurrent runs may pick the same name.
pub fn next_available_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{stem}_{SUFFIX}.{EXTENSION}"));
    if !first.exists() {
        return first;
    }
    (1u64..)
        .map(|n| dir.join(format!("{stem}_{SUFFIX}_{n}.{EXTENSION}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

/// Writes `image` as PNG under `dir`, creating the directory if needed.
pub fn save_annotated(image: &RgbImage, dir: &Path, stem: &str) -> Result<PathBuf, BboxerError> {
    std::fs::create_dir_all(dir)?;
    let path = next_available_path(dir, stem);
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .map_err(|source| BboxerError::ImageWrite {
            path: path.clone(),
            source,
        })?;
    info!(path = %path.display(), "annotated image saved");
    Ok(path)
}
