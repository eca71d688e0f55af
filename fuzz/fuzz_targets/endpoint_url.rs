#![no_main]

use libfuzzer_sys::fuzz_target;
use mapship::build_endpoint_url;

fuzz_target!(|data: (&str, bool)| {
    let (endpoint, react_native) = data;
    let path = if react_native {
        "/react-native-source-map"
    } else {
        "/sourcemap"
    };

    if let Ok(url) = build_endpoint_url(endpoint, path) {
        // Whatever was accepted must be an http(s) URL.
        assert!(url.starts_with("http://") || url.starts_with("https://"));
    }
});
