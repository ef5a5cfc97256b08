//! Connection management
//!
//! This module handles:
//! * Trust policy and TLS client configuration
//! * Transport establishment (resolve, TCP connect, TLS handshake)
//! * State machine enforcement
//! * The connected stream handle (`Session`)

mod session;
mod state;
mod tls;
mod transport;

pub use session::Session;
pub use state::ConnectionState;
pub use tls::{parse_server_name, RootCertificate, TlsConfig, TlsConfigBuilder, TrustPolicy};
pub use transport::{connect_tls, negotiated_alpn, peer_certificate_fingerprint, TlsTransport};
