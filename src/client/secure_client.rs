//! SecureStreamClient implementation

use super::config::ClientConfig;
use super::endpoint::Endpoint;
use crate::connection::{
    connect_tls, negotiated_alpn, peer_certificate_fingerprint, ConnectionState, Session,
    TlsConfig, TlsTransport, TrustPolicy,
};
use crate::metrics::{counters, histograms};
use crate::{Error, Result};
use bytes::Bytes;
use std::time::Instant;
use tracing::Instrument;

/// Client for one TLS byte stream at a time.
///
/// Configure the trust policy once, then connect, send, and read. Each
/// `read_response` consumes the session; connect again for the next exchange.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> secure_stream::Result<()> {
/// use secure_stream::{RootCertificate, SecureStreamClient, TrustPolicy};
///
/// let root = RootCertificate::from_pem_file("ca.pem")?;
/// let mut client = SecureStreamClient::default();
/// client.configure_trust(TrustPolicy::VerifyWithRootCertificate(root))?;
///
/// if client.connect("internal.example.com", 7000).await {
///     client.send_request(b"STATUS").await?;
///     let response = client.read_response().await?;
///     println!("{}", String::from_utf8_lossy(&response));
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SecureStreamClient {
    config: ClientConfig,
    tls: Option<TlsConfig>,
    state: ConnectionState,
    endpoint: Option<Endpoint>,
    session: Option<Session<TlsTransport>>,
    // Counters of the last finished session
    last_bytes_sent: u64,
    last_bytes_received: u64,
}

impl Default for SecureStreamClient {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl SecureStreamClient {
    /// Create an unconfigured client
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            tls: None,
            state: ConnectionState::Unconfigured,
            endpoint: None,
            session: None,
            last_bytes_sent: 0,
            last_bytes_received: 0,
        }
    }

    /// Create a client and configure its trust policy in one step
    pub fn with_trust(policy: TrustPolicy, config: ClientConfig) -> Result<Self> {
        let mut client = Self::new(config);
        client.configure_trust(policy)?;
        Ok(client)
    }

    /// Set the trust policy used by every later connect.
    ///
    /// Performs no I/O. Allowed exactly once, before the first connect.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` if a policy is already set, `Error::Config` if the
    /// policy's root certificate cannot be used.
    pub fn configure_trust(&mut self, policy: TrustPolicy) -> Result<()> {
        self.ensure_unconfigured()?;
        let tls = TlsConfig::new(policy)?;
        self.configure_tls(tls)
    }

    /// Like [`configure_trust`](Self::configure_trust), for a prebuilt
    /// [`TlsConfig`] (for example one offering ALPN protocols).
    pub fn configure_tls(&mut self, tls: TlsConfig) -> Result<()> {
        self.ensure_unconfigured()?;
        self.state.transition(ConnectionState::Disconnected)?;
        tracing::debug!(policy = %tls.trust_policy(), "trust policy configured");
        self.tls = Some(tls);
        Ok(())
    }

    fn ensure_unconfigured(&self) -> Result<()> {
        if self.state.is_configured() {
            return Err(Error::InvalidState {
                expected: ConnectionState::Unconfigured.to_string(),
                actual: self.state.to_string(),
            });
        }
        Ok(())
    }

    /// Connect to `host:port`, reporting only success or failure.
    ///
    /// Every failure (bad input, DNS, refusal, TLS) yields `false` and leaves
    /// the client not connected. Use [`try_connect`](Self::try_connect) to
    /// learn why.
    pub async fn connect(&mut self, host: &str, port: u16) -> bool {
        self.try_connect(host, port).await.is_ok()
    }

    /// Connect to `host:port`.
    ///
    /// If a session is already open it is closed first; the client then
    /// either holds the new session or none.
    pub async fn try_connect(&mut self, host: &str, port: u16) -> Result<()> {
        let target = format!("{}:{}", host, port);
        self.require_trust(&target)?;
        let endpoint = Endpoint::new(host, port).map_err(|e| {
            report_connect_failure(&target, &e);
            e
        })?;
        self.connect_endpoint(&endpoint).await
    }

    /// Connect to an address string such as `example.com:443` or `tls://[::1]:8443`
    pub async fn connect_str(&mut self, address: &str) -> Result<()> {
        self.require_trust(address)?;
        let endpoint = Endpoint::parse(address).map_err(|e| {
            report_connect_failure(address, &e);
            e
        })?;
        self.connect_endpoint(&endpoint).await
    }

    /// Connect to a parsed endpoint
    pub async fn connect_endpoint(&mut self, endpoint: &Endpoint) -> Result<()> {
        let tls = self.require_trust(&endpoint.to_string())?;

        if self.state == ConnectionState::Connected {
            tracing::debug!(previous = ?self.endpoint, "closing previous session before reconnecting");
            if let Err(e) = self.close().await {
                tracing::debug!(error = %e, "previous session did not shut down cleanly");
            }
        }

        let span = tracing::info_span!("connect", endpoint = %endpoint);
        self.establish(endpoint, &tls).instrument(span).await
    }

    async fn establish(&mut self, endpoint: &Endpoint, tls: &TlsConfig) -> Result<()> {
        counters::connection_attempted();
        let start = Instant::now();

        let attempt = connect_tls(endpoint, tls, self.config.nodelay);
        let result = match self.config.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, attempt)
                .await
                .unwrap_or_else(|_| {
                    Err(Error::ConnectTimeout {
                        endpoint: endpoint.to_string(),
                        timeout,
                    })
                }),
            None => attempt.await,
        };

        let stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                report_connect_failure(&endpoint.to_string(), &e);
                return Err(e);
            }
        };

        histograms::connect_duration(start.elapsed().as_millis() as u64);
        counters::connection_established();
        let fingerprint = peer_certificate_fingerprint(&stream).map(|fp| to_hex(&fp));
        tracing::info!(
            policy = %tls.trust_policy(),
            fingerprint = fingerprint.as_deref(),
            "connected to server"
        );

        let session = Session::with_capacity(stream, self.config.read_buffer_capacity)
            .with_read_timeout(self.config.read_timeout)
            .with_max_response_size(self.config.max_response_size);
        self.state.transition(ConnectionState::Connected)?;
        self.session = Some(session);
        self.endpoint = Some(endpoint.clone());
        Ok(())
    }

    /// The configured TLS settings; a missing policy is reported like any
    /// other failed connect.
    fn require_trust(&self, target: &str) -> Result<TlsConfig> {
        match &self.tls {
            Some(tls) => Ok(tls.clone()),
            None => {
                let err = Error::InvalidState {
                    expected: "trust policy configured".into(),
                    actual: self.state.to_string(),
                };
                report_connect_failure(target, &err);
                Err(err)
            }
        }
    }

    /// Write `payload` followed by one `\n`; returns the bytes written.
    ///
    /// # Errors
    ///
    /// `Error::NotConnected` without an open session. A write failure ends the
    /// session (state becomes `Closed`) and returns `Error::Io`.
    pub async fn send_request(&mut self, payload: &[u8]) -> Result<usize> {
        let session = self.session.as_mut().ok_or(Error::NotConnected)?;
        match session.send_request(payload).await {
            Ok(n) => Ok(n),
            Err(e) => {
                self.end_session("write failed");
                Err(e)
            }
        }
    }

    /// Read until the peer closes; returns line contents concatenated without
    /// delimiters.
    ///
    /// The session ends when this returns, successfully or not.
    ///
    /// # Errors
    ///
    /// `Error::NotConnected` without an open session, `Error::Stream` on a read
    /// failure, `Error::ResponseTooLarge` if the configured cap is exceeded.
    pub async fn read_response(&mut self) -> Result<Bytes> {
        let session = self.session.as_mut().ok_or(Error::NotConnected)?;
        let result = session.read_response().await;
        self.end_session(match &result {
            Ok(_) => "peer closed",
            Err(_) => "read failed",
        });
        result
    }

    /// Close the session (TLS `close_notify`, then socket shutdown).
    ///
    /// The state is `Closed` afterwards even if the shutdown itself fails.
    /// Does nothing when not connected.
    pub async fn close(&mut self) -> Result<()> {
        let Some(mut session) = self.retire_session() else {
            return Ok(());
        };
        self.state.transition(ConnectionState::Closed)?;
        tracing::info!(endpoint = ?self.endpoint, reason = "closed by client", "session closed");
        session.shutdown().await
    }

    fn end_session(&mut self, reason: &'static str) {
        if self.retire_session().is_some() {
            // A live session implies Connected, and Connected -> Closed is always valid
            self.state = ConnectionState::Closed;
            tracing::info!(endpoint = ?self.endpoint, reason, "session closed");
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether a session is open
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected && self.session.is_some()
    }

    /// Endpoint of the current or most recent session
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Configured trust policy, if any
    pub fn trust_policy(&self) -> Option<&TrustPolicy> {
        self.tls.as_ref().map(TlsConfig::trust_policy)
    }

    /// Client configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// SHA-256 of the connected server's certificate
    pub fn peer_certificate_fingerprint(&self) -> Option<Vec<u8>> {
        self.session
            .as_ref()
            .and_then(|s| peer_certificate_fingerprint(s.get_ref()))
    }

    /// ALPN protocol agreed with the connected server
    pub fn negotiated_alpn(&self) -> Option<Vec<u8>> {
        self.session
            .as_ref()
            .and_then(|s| negotiated_alpn(s.get_ref()))
    }

    /// The open session, read-only
    pub fn session(&self) -> Option<&Session<TlsTransport>> {
        self.session.as_ref()
    }

    /// Request bytes written during the current or most recent session
    pub fn bytes_sent(&self) -> u64 {
        self.session
            .as_ref()
            .map_or(self.last_bytes_sent, Session::bytes_sent)
    }

    /// Bytes read from the peer during the current or most recent session
    pub fn bytes_received(&self) -> u64 {
        self.session
            .as_ref()
            .map_or(self.last_bytes_received, Session::bytes_received)
    }

    fn retire_session(&mut self) -> Option<Session<TlsTransport>> {
        let session = self.session.take()?;
        self.last_bytes_sent = session.bytes_sent();
        self.last_bytes_received = session.bytes_received();
        Some(session)
    }
}

fn report_connect_failure(target: &str, error: &Error) {
    counters::connection_failed(error.category());
    tracing::warn!(target_endpoint = %target, error = %error, "connection failed");
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
