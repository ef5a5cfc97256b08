//! Metric names and label values

/// Connection attempts
pub const CONNECTIONS_ATTEMPTED: &str = "secure_stream_connections_attempted_total";
/// Failed connection attempts, labelled by `reason`
pub const CONNECTIONS_FAILED: &str = "secure_stream_connections_failed_total";
/// Successful handshakes
pub const CONNECTIONS_ESTABLISHED: &str = "secure_stream_connections_established_total";
/// Request bytes written, including terminators
pub const BYTES_SENT: &str = "secure_stream_bytes_sent_total";
/// Raw bytes read from the peer
pub const BYTES_RECEIVED: &str = "secure_stream_bytes_received_total";
/// Mid-session failures, labelled by `kind`
pub const STREAM_ERRORS: &str = "secure_stream_stream_errors_total";
/// Time from connect start to completed handshake
pub const CONNECT_DURATION_MS: &str = "secure_stream_connect_duration_ms";
/// Size of each assembled response
pub const RESPONSE_SIZE_BYTES: &str = "secure_stream_response_size_bytes";

/// Label key for connect failure reasons
pub const REASON: &str = "reason";
/// Label key for stream error kinds
pub const KIND: &str = "kind";

/// Stream error: read failed
pub const KIND_READ: &str = "read";
/// Stream error: write failed
pub const KIND_WRITE: &str = "write";
/// Stream error: per-read idle timeout elapsed
pub const KIND_TIMEOUT: &str = "timeout";
/// Stream error: response cap exceeded
pub const KIND_TOO_LARGE: &str = "too_large";
