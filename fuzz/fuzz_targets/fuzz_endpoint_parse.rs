#![no_main]

use libfuzzer_sys::fuzz_target;
use secure_stream::Endpoint;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(endpoint) = Endpoint::parse(s) {
            assert!(!endpoint.host().is_empty());
            assert_ne!(endpoint.port(), 0);
            // Whatever parses must re-parse to the same endpoint
            let reparsed = Endpoint::parse(&endpoint.to_string()).unwrap();
            assert_eq!(reparsed, endpoint);
        }
    }
});
