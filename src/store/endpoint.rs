//! Data store connection endpoints.

use std::fmt;

use url::Url;

use crate::store::types::StoreError;

/// A parsed, immutable data store connection string.
///
/// The original text is kept verbatim so the connector sees exactly what was
/// configured. `Display` redacts any password.
#[derive(Clone, PartialEq, Eq)]
pub struct StoreEndpoint {
    raw: String,
    scheme: String,
    host: String,
    port: u16,
    redacted: String,
}

impl StoreEndpoint {
    /// Parse a connection string of the form `scheme://[user[:pass]@]host[:port][/db]`.
    ///
    /// Only single-host connection strings are accepted. The port may be
    /// omitted for schemes with a well-known default.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        let invalid = |reason: String| StoreError::InvalidEndpoint {
            endpoint: raw.to_string(),
            reason,
        };

        let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid("missing host".to_string()))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();

        let port = url
            .port()
            .or_else(|| default_port(url.scheme()))
            .ok_or_else(|| invalid(format!("no port given and no default for '{}'", url.scheme())))?;

        let mut redacted = url.clone();
        if redacted.password().is_some() {
            let _ = redacted.set_password(Some("****"));
        }

        Ok(Self {
            raw: raw.to_string(),
            scheme: url.scheme().to_string(),
            host,
            port,
            redacted: redacted.to_string(),
        })
    }

    /// The connection string exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for StoreEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

impl fmt::Debug for StoreEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreEndpoint")
            .field("endpoint", &self.redacted)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "mongodb" => Some(27017),
        "redis" => Some(6379),
        "postgres" | "postgresql" => Some(5432),
        _ => None,
    }
}
