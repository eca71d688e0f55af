#![no_main]

use std::path::Path;

use libfuzzer_sys::fuzz_target;
use mapship::transform::{is_sentinel, strip_source};

fuzz_target!(|source: &str| {
    let root = Path::new("/project");
    let Some(stripped) = strip_source(source, root, root) else {
        return;
    };
    assert!(!is_sentinel(source));
    assert!(!stripped.starts_with('/'));

    // A map at the project root strips to a fixed point.
    if let Some(again) = strip_source(&stripped, root, root) {
        assert_eq!(again, stripped);
    }
});
