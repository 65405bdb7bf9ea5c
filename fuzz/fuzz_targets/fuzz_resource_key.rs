#![no_main]

use drawstack::ResourceKey;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(key) = s.parse::<ResourceKey>() {
            // Display and FromStr agree on anything accepted
            assert_eq!(key.to_string().parse::<ResourceKey>().ok(), Some(key));
        }
    }
});
