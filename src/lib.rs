//! secure-stream: a minimal TLS byte-stream client
//!
//! Connects to a host over TLS, writes newline-terminated requests, and
//! accumulates the newline-delimited response until the peer closes.
//!
//! ```no_run
//! # async fn example() -> secure_stream::Result<()> {
//! use secure_stream::{SecureStreamClient, TrustPolicy};
//!
//! let mut client = SecureStreamClient::default();
//! client.configure_trust(TrustPolicy::Insecure)?;
//! client.try_connect("example.com", 443).await?;
//! client.send_request(b"HELLO").await?;
//! let response = client.read_response().await?;
//! println!("{} bytes", response.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod client;
pub mod connection;
mod error;
pub mod metrics;
pub mod protocol;

pub use client::{ClientConfig, ClientConfigBuilder, Endpoint, SecureStreamClient};
pub use connection::{ConnectionState, RootCertificate, Session, TlsConfig, TrustPolicy};
pub use error::{Error, Result};
