#![no_main]

use libfuzzer_sys::fuzz_target;
use mapship_transport::{ErrorCode, classify_fetch_status, classify_status};

fuzz_target!(|status: u16| {
    match classify_status(status) {
        None => assert_eq!(status, 200),
        Some(code) => {
            if (400..500).contains(&status) {
                assert!(!code.is_retryable());
            }
            if (500..600).contains(&status) {
                assert_eq!(code, ErrorCode::ServerError);
            }
        }
    }

    if (200..300).contains(&status) {
        assert!(classify_fetch_status(status).is_none());
    }
});
