//! Bboxer: object detection from the command line.
//!
//! Bboxer sends images (URLs or local files) to a remote object-detection
//! API and draws the returned boxes onto the images, or prints the raw JSON
//! result.
//!
//! # Modules
//!
//! - [`source`]: Image references, request payloads and decoded pixels
//! - [`auth`]: Bearer tokens and the persisted token cache
//! - [`api`]: Single and batch prediction requests
//! - [`annotate`]: Normalized to pixel box conversion and drawing
//! - [`geom`]: Space-tagged coordinates and box types
//! - [`output`]: Non-overwriting output file names
//! - [`config`]: Service and identity-provider settings
//! - [`error`]: Error types for bboxer operations

pub mod annotate;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod geom;
pub mod interrupt;
pub mod output;
pub mod source;

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub use error::BboxerError;

use api::DetectionClient;
use auth::{CredentialStore, DeviceCodeAcquirer, TokenProvider};
use config::Settings;
use interrupt::Interrupt;
use source::{ImageRef, ImageSource};

/// The bboxer CLI application.
#[derive(Parser)]
#[command(name = "bboxer")]
#[command(version, author, about = "Detect objects from images.")]
struct Cli {
    /// HTTP/HTTPS URLs or paths to images.
    #[arg(required = true, num_args = 1..)]
    images: Vec<String>,

    /// Base URL (with port, if applies) to send requests to instead of the
    /// default service. No credentials are sent to it.
    #[arg(short, long)]
    url: Option<String>,

    /// Print the JSON response instead of saving annotated images.
    #[arg(long)]
    no_save: bool,

    /// Directory for annotated images.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Token cache file.
    #[arg(long, env = "BBOXER_TOKEN_CACHE")]
    token_cache: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// Run the bboxer CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), BboxerError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut settings = Settings::from_env();
    if let Some(path) = cli.token_cache.clone() {
        settings.token_cache = path;
    }
    let base_url = cli
        .url
        .clone()
        .unwrap_or_else(|| settings.api_default_url.clone());

    let image_refs = cli
        .images
        .iter()
        .map(|value| value.parse::<ImageRef>())
        .collect::<Result<Vec<_>, _>>()?;

    let interrupt = Interrupt::install();
    let agent = api::agent();

    let source = ImageSource::new(agent.clone());
    let mut payloads = Vec::with_capacity(image_refs.len());
    let mut images = Vec::with_capacity(image_refs.len());
    for image_ref in &image_refs {
        if interrupt.is_raised() {
            return Err(BboxerError::Interrupted);
        }
        if cli.no_save {
            payloads.push(source.encode(image_ref)?);
        } else {
            let (payload, pixels) = source.resolve(image_ref)?;
            payloads.push(payload);
            images.push(pixels);
        }
    }

    // The token cache is only touched for the default endpoint. The store
    // writes a changed cache back when it goes out of scope, on error too.
    let auth_header = if settings.is_default_endpoint(&base_url) {
        let mut store = CredentialStore::open(&settings.token_cache)?;
        let acquirer = DeviceCodeAcquirer::new(agent.clone(), &settings, interrupt.clone());
        TokenProvider::new(&settings, &mut store, acquirer).auth_header(&base_url)?
    } else {
        debug!(%base_url, "custom endpoint, skipping credentials");
        None
    };
    if interrupt.is_raised() {
        return Err(BboxerError::Interrupted);
    }

    let client = DetectionClient::new(agent, settings.clone(), base_url);
    let prediction = client.predict(&payloads, auth_header.as_deref())?;

    if cli.no_save {
        let text = serde_json::to_string_pretty(prediction.raw())
            .map_err(|e| BboxerError::ResponseParse(e.to_string()))?;
        println!("{text}");
        return Ok(());
    }

    let per_image = prediction.per_image(image_refs.len())?;
    for ((image_ref, image), detections) in image_refs.iter().zip(&images).zip(per_image) {
        let boxes = annotate::labeled_boxes(detections, image.width(), image.height());
        let rendered = annotate::render(image, &boxes);
        let path = output::save_annotated(&rendered, &cli.output_dir, &image_ref.stem())?;
        info!(image = %image_ref, detections = detections.len(), "annotated");
        println!("{}", path.display());
    }

    Ok(())
}

/// Print an error for the user on stderr.
///
/// Server error bodies are shown when they were valid JSON.
pub fn report_error(err: &BboxerError) {
    eprintln!("Error: {err}");
    if let BboxerError::RequestFailed {
        body: Some(body), ..
    } = err
    {
        if let Ok(text) = serde_json::to_string_pretty(body) {
            eprintln!("{text}");
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bboxer={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
