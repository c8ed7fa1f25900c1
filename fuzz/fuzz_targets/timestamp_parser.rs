#![no_main]

use libfuzzer_sys::fuzz_target;
use sprintlens::timestamp::{parse_optional, parse_timestamp};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let parsed = parse_timestamp(input);
        // Both entry points must agree on what is a timestamp
        if let Ok(Some(optional)) = parse_optional(Some(input)) {
            assert_eq!(parsed, Some(optional));
        }
    }
});
