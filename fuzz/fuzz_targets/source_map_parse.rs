#![no_main]

use libfuzzer_sys::fuzz_target;
use mapship::SourceMapDocument;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(doc) = SourceMapDocument::parse(text, "fuzz.js.map") {
        let json = doc.to_json().expect("serializes");
        let reparsed = SourceMapDocument::parse(&json, "fuzz.js.map").expect("reparses");
        assert_eq!(reparsed.sources, doc.sources);
    }
});
