//! Histogram helpers

use super::labels;

/// Record how long resolve + connect + handshake took
pub fn connect_duration(millis: u64) {
    metrics::histogram!(labels::CONNECT_DURATION_MS).record(millis as f64);
}

/// Record the size of an assembled response
pub fn response_size(bytes: usize) {
    metrics::histogram!(labels::RESPONSE_SIZE_BYTES).record(bytes as f64);
}
