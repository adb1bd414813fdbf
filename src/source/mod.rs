//! Image sources: turn a command-line argument into what the detection API
//! needs (a URL or base64 content) and into decoded pixels for drawing.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::RgbImage;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::BboxerError;

/// Upper bound on a downloaded image body.
const MAX_REMOTE_IMAGE_BYTES: u64 = 64 * 1024 * 1024;

/// Where an image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageRef {
    /// An `http(s)://` URL the server can fetch itself. `raw` is the argument
    /// exactly as given; `url` is its parsed form.
    RemoteUrl { raw: String, url: Url },
    /// A file on the local filesystem; its bytes are sent inline.
    LocalPath(PathBuf),
}

impl FromStr for ImageRef {
    type Err = BboxerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.is_empty() {
            return Err(BboxerError::InvalidImageRef(value.to_string()));
        }

        let remainder = value
            .strip_prefix("https://")
            .or_else(|| value.strip_prefix("http://"));
        match remainder {
            Some(rest) if !rest.is_empty() => Url::parse(value)
                .map(|url| ImageRef::RemoteUrl {
                    raw: value.to_string(),
                    url,
                })
                .map_err(|_| BboxerError::InvalidImageRef(value.to_string())),
            Some(_) => Err(BboxerError::InvalidImageRef(value.to_string())),
            None => Ok(ImageRef::LocalPath(PathBuf::from(value))),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRef::RemoteUrl { raw, .. } => f.write_str(raw),
            ImageRef::LocalPath(path) => write!(f, "{}", path.display()),
        }
    }
}

impl ImageRef {
    /// A short file-name stem for output naming.
    ///
    /// Local paths use the file stem; URLs use the stem of their last
    /// non-empty path segment. Falls back to `"image"`.
    pub fn stem(&self) -> String {
        let stem = match self {
            ImageRef::LocalPath(path) => path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string),
            ImageRef::RemoteUrl { url, .. } => url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .and_then(|segment| Path::new(segment).file_stem())
                .and_then(|stem| stem.to_str())
                .map(str::to_string),
        };
        stem.filter(|s| !s.is_empty())
            .unwrap_or_else(|| "image".to_string())
    }
}

/// What goes into the request body for one image.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EncodedPayload {
    Url(String),
    Base64(String),
}

impl EncodedPayload {
    pub fn as_str(&self) -> &str {
        match self {
            EncodedPayload::Url(url) => url,
            EncodedPayload::Base64(data) => data,
        }
    }
}

/// Base64 (standard alphabet, padded) of raw file bytes.
pub fn encode_bytes(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Resolves [`ImageRef`]s over the network or the filesystem.
///
/// Nothing is cached: every call reads or downloads again.
pub struct ImageSource {
    agent: ureq::Agent,
}

impl ImageSource {
    pub fn new(agent: ureq::Agent) -> Self {
        Self { agent }
    }

    /// Produces only the request payload, without decoding pixels.
    pub fn encode(&self, image_ref: &ImageRef) -> Result<EncodedPayload, BboxerError> {
        match image_ref {
            ImageRef::RemoteUrl { raw, .. } => Ok(EncodedPayload::Url(raw.clone())),
            ImageRef::LocalPath(path) => {
                let bytes = read_local(path)?;
                Ok(EncodedPayload::Base64(encode_bytes(&bytes)))
            }
        }
    }

    /// Produces the request payload and the decoded image.
    pub fn resolve(&self, image_ref: &ImageRef) -> Result<(EncodedPayload, RgbImage), BboxerError> {
        match image_ref {
            ImageRef::RemoteUrl { raw, .. } => {
                let bytes = self.download(raw)?;
                let pixels = decode(image_ref, &bytes)?;
                Ok((EncodedPayload::Url(raw.clone()), pixels))
            }
            ImageRef::LocalPath(path) => {
                let bytes = read_local(path)?;
                let pixels = decode(image_ref, &bytes)?;
                Ok((EncodedPayload::Base64(encode_bytes(&bytes)), pixels))
            }
        }
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, BboxerError> {
        debug!(url, "downloading image");
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|source| BboxerError::source_unavailable(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BboxerError::source_unavailable(
                url,
                format!("server answered {}", status.as_u16()),
            ));
        }

        response
            .body_mut()
            .with_config()
            .limit(MAX_REMOTE_IMAGE_BYTES)
            .read_to_vec()
            .map_err(|source| BboxerError::source_unavailable(url, source))
    }
}

fn read_local(path: &Path) -> Result<Vec<u8>, BboxerError> {
    std::fs::read(path)
        .map_err(|source| BboxerError::source_unavailable(path.display().to_string(), source))
}

fn decode(image_ref: &ImageRef, bytes: &[u8]) -> Result<RgbImage, BboxerError> {
    image::load_from_memory(bytes)
        .map(|decoded| decoded.to_rgb8())
        .map_err(|source| BboxerError::source_unavailable(image_ref.to_string(), source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_urls() {
        let parsed: ImageRef = "https://example.com/cat.jpg".parse().unwrap();
        assert!(matches!(parsed, ImageRef::RemoteUrl { .. }));

        let parsed: ImageRef = "http://localhost:8080/img?id=3".parse().unwrap();
        assert!(matches!(parsed, ImageRef::RemoteUrl { .. }));
    }

    #[test]
    fn test_remote_payload_is_the_argument_verbatim() {
        let source = ImageSource::new(ureq::Agent::new_with_defaults());
        for raw in [
            "https://Example.com",
            "http://example.com/a%2fb/../c.png?sig=AbC%3D&x=1",
            "https://example.com/Photos/Cat.JPG",
        ] {
            let image_ref: ImageRef = raw.parse().unwrap();
            assert_eq!(image_ref.to_string(), raw);
            assert_eq!(
                source.encode(&image_ref).unwrap(),
                EncodedPayload::Url(raw.to_string())
            );
        }
    }

    #[test]
    fn test_parse_local_paths() {
        let parsed: ImageRef = "photos/dog.png".parse().unwrap();
        assert_eq!(parsed, ImageRef::LocalPath(PathBuf::from("photos/dog.png")));

        // Other schemes are treated as paths and fail later when read.
        let parsed: ImageRef = "ftp://example.com/cat.jpg".parse().unwrap();
        assert!(matches!(parsed, ImageRef::LocalPath(_)));
    }

    #[test]
    fn test_parse_rejects_empty_and_bare_scheme() {
        assert!(matches!(
            "".parse::<ImageRef>(),
            Err(BboxerError::InvalidImageRef(_))
        ));
        assert!(matches!(
            "https://".parse::<ImageRef>(),
            Err(BboxerError::InvalidImageRef(_))
        ));
    }

    #[test]
    fn test_stem() {
        let local: ImageRef = "a/b/street.scene.jpg".parse().unwrap();
        assert_eq!(local.stem(), "street.scene");

        let remote: ImageRef = "https://example.com/images/cat.jpg?size=2".parse().unwrap();
        assert_eq!(remote.stem(), "cat");

        let bare: ImageRef = "https://example.com/".parse().unwrap();
        assert_eq!(bare.stem(), "image");
    }

    #[test]
    fn test_payload_serializes_as_bare_string() {
        let payload = EncodedPayload::Url("https://example.com/a.png".into());
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            "\"https://example.com/a.png\""
        );
        assert_eq!(EncodedPayload::Base64("AAEC".into()).as_str(), "AAEC");
    }

    #[test]
    fn test_encode_bytes_is_padded_standard_base64() {
        assert_eq!(encode_bytes(&[0xff, 0xfe]), "//4=");
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let source = ImageSource::new(ureq::Agent::new_with_defaults());
        let image_ref: ImageRef = "definitely/not/here.png".parse().unwrap();
        assert!(matches!(
            source.encode(&image_ref),
            Err(BboxerError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_resolve_local_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.png");
        RgbImage::from_pixel(4, 3, image::Rgb([10, 20, 30]))
            .save(&path)
            .unwrap();

        let source = ImageSource::new(ureq::Agent::new_with_defaults());
        let image_ref = ImageRef::LocalPath(path.clone());
        let (payload, pixels) = source.resolve(&image_ref).unwrap();

        assert_eq!(pixels.dimensions(), (4, 3));
        let raw = std::fs::read(&path).unwrap();
        assert_eq!(payload, EncodedPayload::Base64(encode_bytes(&raw)));
    }

    #[test]
    fn test_undecodable_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.png");
        std::fs::write(&path, b"not an image").unwrap();

        let source = ImageSource::new(ureq::Agent::new_with_defaults());
        let result = source.resolve(&ImageRef::LocalPath(path));
        assert!(matches!(result, Err(BboxerError::SourceUnavailable { .. })));
    }
}
