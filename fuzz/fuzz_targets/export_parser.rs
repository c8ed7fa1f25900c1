#![no_main]

use libfuzzer_sys::fuzz_target;
use sprintlens::source::{JsonExportSource, RecordSource};

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Arbitrary exports may be rejected but never panic
        if let Ok(source) = JsonExportSource::from_json_str(input) {
            let _ = source.load();
        }
    }
});
