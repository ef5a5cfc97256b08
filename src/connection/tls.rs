//! TLS trust policy and client configuration.
//!
//! The trust policy is decided once per client: either every server
//! certificate is accepted ([`TrustPolicy::Insecure`]) or the chain must lead
//! to a caller-supplied root ([`TrustPolicy::VerifyWithRootCertificate`]).

use crate::{Error, Result};
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use rustls_pemfile::Item;
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Arc;

/// One or more trust-anchor certificates in DER form.
#[derive(Clone, PartialEq, Eq)]
pub struct RootCertificate {
    certs: Vec<CertificateDer<'static>>,
}

impl RootCertificate {
    /// Parse every certificate from PEM text.
    ///
    /// Non-certificate items (private keys, CRLs) are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the PEM is malformed or holds no certificate.
    pub fn from_pem(pem: &[u8]) -> Result<Self> {
        let mut reader = std::io::Cursor::new(pem);
        let mut certs = Vec::new();

        loop {
            match rustls_pemfile::read_one(&mut reader) {
                Ok(Some(Item::X509Certificate(cert))) => certs.push(cert),
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    return Err(Error::Config(format!(
                        "failed to parse root certificate PEM: {}",
                        e
                    )))
                }
            }
        }

        if certs.is_empty() {
            return Err(Error::Config(
                "no certificate found in root certificate PEM".into(),
            ));
        }

        Ok(Self { certs })
    }

    /// Read and parse a PEM file.
    pub fn from_pem_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| {
            Error::Config(format!(
                "failed to read root certificate file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_pem(&data)
    }

    /// Wrap a single DER-encoded certificate. Validity is checked when the
    /// TLS configuration is built.
    pub fn from_der(der: impl Into<Vec<u8>>) -> Self {
        Self {
            certs: vec![CertificateDer::from(der.into())],
        }
    }

    /// The DER certificates
    pub fn certificates(&self) -> &[CertificateDer<'static>] {
        &self.certs
    }

    /// Number of certificates
    pub fn len(&self) -> usize {
        self.certs.len()
    }

    /// Whether there are no certificates
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}

impl std::fmt::Debug for RootCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RootCertificate")
            .field("certificates", &self.certs.len())
            .finish()
    }
}

/// Rule for deciding whether a server certificate is acceptable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustPolicy {
    /// ⚠️ Accept any server certificate and any hostname.
    ///
    /// The session is encrypted but not authenticated; anyone on the path can
    /// impersonate the server. Handshake signatures are still checked.
    Insecure,
    /// Require a certificate chain that ends at the given root and names the
    /// host that was dialled.
    VerifyWithRootCertificate(RootCertificate),
}

impl TrustPolicy {
    /// Whether certificates are verified under this policy
    pub fn verifies_certificates(&self) -> bool {
        matches!(self, Self::VerifyWithRootCertificate(_))
    }
}

impl std::fmt::Display for TrustPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insecure => write!(f, "insecure"),
            Self::VerifyWithRootCertificate(_) => write!(f, "verify-root"),
        }
    }
}

/// Compiled TLS client configuration for a trust policy.
///
/// # Examples
///
/// ```no_run
/// # fn example() -> secure_stream::Result<()> {
/// use secure_stream::connection::{RootCertificate, TlsConfig, TrustPolicy};
///
/// let root = RootCertificate::from_pem_file("/etc/ssl/my-ca.pem")?;
/// let tls = TlsConfig::builder()
///     .trust_policy(TrustPolicy::VerifyWithRootCertificate(root))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TlsConfig {
    policy: TrustPolicy,
    client_config: Arc<ClientConfig>,
}

impl TlsConfig {
    /// Create a new TLS configuration builder.
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }

    /// Build a configuration straight from a policy.
    pub fn new(policy: TrustPolicy) -> Result<Self> {
        Self::builder().trust_policy(policy).build()
    }

    /// Get the rustls ClientConfig for this TLS configuration.
    pub fn client_config(&self) -> Arc<ClientConfig> {
        self.client_config.clone()
    }

    /// The trust policy this configuration enforces
    pub fn trust_policy(&self) -> &TrustPolicy {
        &self.policy
    }
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("policy", &self.policy)
            .field("alpn_protocols", &self.client_config.alpn_protocols)
            .field("client_config", &"<ClientConfig>")
            .finish()
    }
}

/// Builder for TLS configuration.
#[derive(Debug, Default)]
pub struct TlsConfigBuilder {
    policy: Option<TrustPolicy>,
    alpn_protocols: Vec<Vec<u8>>,
}

impl TlsConfigBuilder {
    /// Set the trust policy (required).
    pub fn trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Shorthand for `trust_policy(TrustPolicy::VerifyWithRootCertificate(root))`.
    pub fn root_certificate(self, root: RootCertificate) -> Self {
        self.trust_policy(TrustPolicy::VerifyWithRootCertificate(root))
    }

    /// ⚠️ **DANGER**: shorthand for `trust_policy(TrustPolicy::Insecure)`.
    ///
    /// **NEVER use in production.** Only for test servers with throwaway
    /// certificates.
    pub fn danger_accept_any_certificate(self) -> Self {
        self.trust_policy(TrustPolicy::Insecure)
    }

    /// Offer these ALPN protocol identifiers during the handshake.
    pub fn alpn_protocols(mut self, protocols: Vec<Vec<u8>>) -> Self {
        self.alpn_protocols = protocols;
        self
    }

    /// Build the TLS configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if no trust policy was set or if none of the
    /// root certificates can be used as a trust anchor.
    pub fn build(self) -> Result<TlsConfig> {
        let policy = self
            .policy
            .ok_or_else(|| Error::Config("no trust policy configured".into()))?;

        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::Config(format!("unsupported TLS protocol versions: {}", e)))?;

        let mut client_config = match &policy {
            TrustPolicy::Insecure => {
                tracing::warn!("TLS certificate verification disabled");
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate::new(
                        provider,
                    )))
                    .with_no_client_auth()
            }
            TrustPolicy::VerifyWithRootCertificate(root) => {
                let mut store = RootCertStore::empty();
                let (added, ignored) =
                    store.add_parsable_certificates(root.certificates().iter().cloned());
                if added == 0 {
                    return Err(Error::Config(
                        "root certificate is not a usable trust anchor".into(),
                    ));
                }
                if ignored > 0 {
                    tracing::warn!(ignored, "skipped unusable root certificates");
                }
                builder.with_root_certificates(store).with_no_client_auth()
            }
        };
        client_config.alpn_protocols = self.alpn_protocols;

        Ok(TlsConfig {
            policy,
            client_config: Arc::new(client_config),
        })
    }
}

/// Server certificate verifier that accepts every certificate.
///
/// Handshake signatures are still verified against the presented key, so the
/// peer must hold the private key of whatever certificate it sends.
#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl AcceptAnyCertificate {
    fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Parse a host into a TLS server name (SNI / certificate name check).
///
/// Accepts DNS names (a trailing dot is dropped) and IPv4/IPv6 literals.
///
/// # Errors
///
/// Returns `Error::InvalidEndpoint` if the host is empty, too long, or contains
/// characters that cannot appear in a DNS name.
pub fn parse_server_name(host: &str) -> Result<ServerName<'static>> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ServerName::IpAddress(ip.into()));
    }

    let hostname = host.trim_end_matches('.');

    if hostname.is_empty() || hostname.len() > 253 {
        return Err(Error::InvalidEndpoint(format!(
            "invalid hostname for TLS: '{}'",
            host
        )));
    }

    if !hostname
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
    {
        return Err(Error::InvalidEndpoint(format!(
            "invalid hostname for TLS: '{}'",
            host
        )));
    }

    ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::InvalidEndpoint(format!("invalid hostname for TLS: '{}'", host)))
}
