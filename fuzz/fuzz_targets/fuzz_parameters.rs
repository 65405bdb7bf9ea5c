#![no_main]

use std::path::Path;

use drawstack::config::{parse_with_warnings, FileFormat};
use drawstack::{Blueprint, Parameters};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        for (format, name) in [(FileFormat::Toml, "p.toml"), (FileFormat::Yaml, "p.yaml")] {
            if let Ok((params, _)) = parse_with_warnings::<Parameters>(content, format, Path::new(name)) {
                let _ = Blueprint::draw_backend(&params);
            }
        }
    }
});
