#![allow(dead_code)]

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use tokio::runtime::Runtime;
use wiremock::{Mock, MockServer, Request};

pub const SINGLE_PATH: &str = "/api/latest/object-detection/predict";
pub const BATCH_PATH: &str = "/api/latest/object-detection/predict/batch";

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([40, 90, 160]));
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageFormat::Png)
        .expect("encode png");
    bytes.into_inner()
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, png_bytes(width, height)).expect("write png file");
}

/// A wiremock server driven from synchronous tests.
///
/// `server` is declared first so it is dropped before its runtime.
pub struct MockApi {
    pub server: MockServer,
    runtime: Runtime,
}

impl MockApi {
    pub fn start() -> Self {
        let runtime = Runtime::new().expect("tokio runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn received(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    pub fn received_on(&self, path: &str) -> Vec<Request> {
        self.received()
            .into_iter()
            .filter(|request| request.url.path() == path)
            .collect()
    }
}

pub fn authorization(request: &Request) -> Option<String> {
    request
        .headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
