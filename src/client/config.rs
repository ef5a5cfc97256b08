//! Client configuration

use crate::protocol::constants::DEFAULT_READ_BUFFER_CAPACITY;
use std::time::Duration;

/// Client configuration
///
/// Transport-level knobs only; the trust policy is configured separately on
/// the client. Use `ClientConfig::builder()` for a fluent API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Limit on resolve + TCP connect + TLS handshake (default: none)
    pub connect_timeout: Option<Duration>,
    /// Limit on how long a single read may wait for data (default: none, so
    /// `read_response` returns only when the peer closes)
    pub read_timeout: Option<Duration>,
    /// Upper bound on an assembled response, in bytes (default: none)
    pub max_response_size: Option<usize>,
    /// Set `TCP_NODELAY` on the socket (default: true)
    pub nodelay: bool,
    /// Initial read buffer capacity (default: 8 KiB)
    pub read_buffer_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: None,
            read_timeout: None,
            max_response_size: None,
            nodelay: true,
            read_buffer_capacity: DEFAULT_READ_BUFFER_CAPACITY,
        }
    }
}

impl ClientConfig {
    /// Create a builder starting from the defaults
    ///
    /// # Examples
    ///
    /// ```
    /// use secure_stream::ClientConfig;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::builder()
    ///     .connect_timeout(Duration::from_secs(10))
    ///     .max_response_size(1 << 20)
    ///     .build();
    /// assert_eq!(config.read_timeout, None);
    /// ```
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: ClientConfig::default(),
        }
    }
}

/// Builder for creating `ClientConfig`
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the connect timeout
    ///
    /// Default: None (no timeout)
    pub fn connect_timeout(mut self, duration: Duration) -> Self {
        self.config.connect_timeout = Some(duration);
        self
    }

    /// Set the per-read idle timeout
    ///
    /// Default: None (wait for the peer indefinitely)
    pub fn read_timeout(mut self, duration: Duration) -> Self {
        self.config.read_timeout = Some(duration);
        self
    }

    /// Cap the size of an assembled response
    ///
    /// Default: None (unbounded)
    pub fn max_response_size(mut self, bytes: usize) -> Self {
        self.config.max_response_size = Some(bytes);
        self
    }

    /// Enable or disable `TCP_NODELAY`
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Set the initial read buffer capacity
    pub fn read_buffer_capacity(mut self, bytes: usize) -> Self {
        self.config.read_buffer_capacity = bytes;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ClientConfig {
        self.config
    }
}
