#![no_main]

use drawstack::infrastructure::repositories::{parse_state, render_state};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Parsing state must never panic; anything accepted must render again
        if let Ok(state) = parse_state(content) {
            let _ = render_state(&state);
        }
    }
});
