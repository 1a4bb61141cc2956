#![no_main]

use libfuzzer_sys::fuzz_target;
use profsheet::document::TelemetryDocument;
use profsheet::{ReportConfig, ReportSynthesizer};
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    // Malformed input is an error, never a panic; anything that parses must lay out
    if let Ok(doc) = TelemetryDocument::from_json_str(Path::new("fuzz/geninfo.json"), input) {
        let config = ReportConfig::default();
        if let Ok(mut synth) = ReportSynthesizer::new(&config, 2) {
            let _ = synth.add_document(&doc);
            let _ = synth.finish();
        }
    }
});
