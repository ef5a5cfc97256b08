//! Counter helpers

use super::labels;

/// A connect attempt started
pub fn connection_attempted() {
    metrics::counter!(labels::CONNECTIONS_ATTEMPTED).increment(1);
}

/// A connect attempt failed; `reason` is an `Error::category` label
pub fn connection_failed(reason: &'static str) {
    metrics::counter!(labels::CONNECTIONS_FAILED, labels::REASON => reason).increment(1);
}

/// A TLS session was established
pub fn connection_established() {
    metrics::counter!(labels::CONNECTIONS_ESTABLISHED).increment(1);
}

/// Request bytes written to the peer
pub fn bytes_sent(n: usize) {
    metrics::counter!(labels::BYTES_SENT).increment(n as u64);
}

/// Bytes read from the peer
pub fn bytes_received(n: usize) {
    metrics::counter!(labels::BYTES_RECEIVED).increment(n as u64);
}

/// A session failed mid-stream
pub fn stream_error(kind: &'static str) {
    metrics::counter!(labels::STREAM_ERRORS, labels::KIND => kind).increment(1);
}
