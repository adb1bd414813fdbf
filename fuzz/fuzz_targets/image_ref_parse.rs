//! Fuzz target for image reference parsing.
//!
//! Checks that classifying a command-line argument as URL or path and
//! deriving its output stem never panics.

#![no_main]

use bboxer::source::ImageRef;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(image_ref) = text.parse::<ImageRef>() {
        let _ = image_ref.stem();
        let _ = image_ref.to_string();
    }
});
