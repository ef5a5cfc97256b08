//! Transport establishment: resolve, TCP connect, TLS handshake

use super::tls::{parse_server_name, TlsConfig};
use crate::client::Endpoint;
use crate::{Error, Result};
use sha2::Digest;
use std::io;
use std::net::SocketAddr;
use tokio::net::{lookup_host, TcpStream};
use tokio_rustls::TlsConnector;

/// An established TLS session over TCP
pub type TlsTransport = tokio_rustls::client::TlsStream<TcpStream>;

/// Connect via TLS-encrypted TCP.
///
/// Each step reports its own error kind: `Resolve` when the host has no
/// usable address, `Connect` when no address accepts the TCP connection,
/// `Handshake` when TLS negotiation or certificate validation fails.
pub async fn connect_tls(
    endpoint: &Endpoint,
    tls_config: &TlsConfig,
    nodelay: bool,
) -> Result<TlsTransport> {
    // Validate the SNI name before touching the network
    let server_name = parse_server_name(endpoint.host())?;

    let addrs: Vec<SocketAddr> = lookup_host((endpoint.host(), endpoint.port()))
        .await
        .map_err(|source| Error::Resolve {
            host: endpoint.host().to_string(),
            source,
        })?
        .collect();
    if addrs.is_empty() {
        return Err(Error::Resolve {
            host: endpoint.host().to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no addresses returned"),
        });
    }
    tracing::debug!(addresses = addrs.len(), "resolved host");

    let tcp_stream = TcpStream::connect(&addrs[..])
        .await
        .map_err(|source| Error::Connect {
            endpoint: endpoint.to_string(),
            source,
        })?;
    tcp_stream
        .set_nodelay(nodelay)
        .map_err(|source| Error::Connect {
            endpoint: endpoint.to_string(),
            source,
        })?;
    tracing::debug!(peer = ?tcp_stream.peer_addr().ok(), "TCP connected, starting TLS handshake");

    let tls_connector = TlsConnector::from(tls_config.client_config());
    let tls_stream = tls_connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|source| Error::Handshake {
            endpoint: endpoint.to_string(),
            source,
        })?;

    Ok(tls_stream)
}

/// SHA-256 of the peer's DER-encoded end-entity certificate.
///
/// Returns `None` if the peer presented no certificate.
pub fn peer_certificate_fingerprint(stream: &TlsTransport) -> Option<Vec<u8>> {
    let (_tcp, conn) = stream.get_ref();
    let certs = conn.peer_certificates()?;
    let server_cert = certs.first()?;
    let hash = sha2::Sha256::digest(server_cert.as_ref());
    Some(hash.to_vec())
}

/// ALPN protocol agreed during the handshake, if any
pub fn negotiated_alpn(stream: &TlsTransport) -> Option<Vec<u8>> {
    let (_tcp, conn) = stream.get_ref();
    conn.alpn_protocol().map(|p| p.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::TrustPolicy;

    #[tokio::test]
    async fn test_tcp_connect_refused() {
        // Grab a free port, then release it so nothing is listening there
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let tls = TlsConfig::new(TrustPolicy::Insecure).unwrap();
        let endpoint = Endpoint::new("127.0.0.1", port).unwrap();
        let err = connect_tls(&endpoint, &tls, true).await.unwrap_err();
        assert!(matches!(err, Error::Connect { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_unresolvable_host() {
        let tls = TlsConfig::new(TrustPolicy::Insecure).unwrap();
        let endpoint = Endpoint::new("nonexistent.invalid", 443).unwrap();
        let err = connect_tls(&endpoint, &tls, true).await.unwrap_err();
        assert!(matches!(err, Error::Resolve { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_handshake_failure_against_plain_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            use tokio::io::AsyncWriteExt;
            if let Ok((mut socket, _)) = listener.accept().await {
                let _ = socket.write_all(b"this is not TLS\n").await;
            }
        });

        let tls = TlsConfig::new(TrustPolicy::Insecure).unwrap();
        let endpoint = Endpoint::new("127.0.0.1", port).unwrap();
        let err = connect_tls(&endpoint, &tls, true).await.unwrap_err();
        assert!(matches!(err, Error::Handshake { .. }), "got {:?}", err);
    }
}
