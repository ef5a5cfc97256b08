//! Endpoint parsing
//!
//! Supports formats:
//! * host:port
//! * [ipv6-address]:port
//! * tls://host:port (scheme prefix is optional)

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

const SCHEME_PREFIX: &str = "tls://";

/// Host and port of a TLS server
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint, validating host and port.
    ///
    /// A bracketed IPv6 host (`[::1]`) is stored without brackets.
    ///
    /// # Errors
    ///
    /// `Error::InvalidEndpoint` if the host is empty or contains whitespace,
    /// brackets (other than around an IPv6 literal) or slashes,
    /// or if the port is 0.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        let host = match host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            Some(inner) => inner.to_string(),
            None => host,
        };

        if host.is_empty() {
            return Err(Error::InvalidEndpoint("host must not be empty".into()));
        }
        if host
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '[' | ']' | '/'))
        {
            return Err(Error::InvalidEndpoint(format!(
                "host '{}' contains an invalid character",
                host
            )));
        }
        if port == 0 {
            return Err(Error::InvalidEndpoint(
                "port must be in 1..=65535".into(),
            ));
        }

        Ok(Self { host, port })
    }

    /// Parse `host:port`, `[v6]:port`, or either form behind `tls://`
    pub fn parse(s: &str) -> Result<Self> {
        let rest = s.strip_prefix(SCHEME_PREFIX).unwrap_or(s);
        if rest.contains("://") {
            return Err(Error::InvalidEndpoint(format!(
                "unsupported scheme in '{}': only tls:// is accepted",
                s
            )));
        }
        let rest = rest.trim_end_matches('/');

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, after) = bracketed.split_once(']').ok_or_else(|| {
                Error::InvalidEndpoint(format!("unterminated IPv6 address in '{}'", s))
            })?;
            let port = after.strip_prefix(':').ok_or_else(|| {
                Error::InvalidEndpoint(format!("missing port in '{}'", s))
            })?;
            (host, port)
        } else {
            let (host, port) = rest
                .rsplit_once(':')
                .ok_or_else(|| Error::InvalidEndpoint(format!("missing port in '{}'", s)))?;
            if host.contains(':') {
                return Err(Error::InvalidEndpoint(format!(
                    "IPv6 address in '{}' must be written as [addr]:port",
                    s
                )));
            }
            (host, port)
        };

        let port = port
            .parse::<u16>()
            .map_err(|_| Error::InvalidEndpoint(format!("invalid port '{}' in '{}'", port, s)))?;

        Self::new(host, port)
    }

    /// Host name or address literal (IPv6 without brackets)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
