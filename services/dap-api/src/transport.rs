//! Per-request transport context derived from proxy headers.

use axum::http::{header, HeaderMap};

/// Proxy header carrying the public path prefix of the service.
pub const SERVER_PREFIX_HEADER: &str = "x-server-prefix";

/// Proxy header carrying the public host name.
pub const FORWARDED_HOST_HEADER: &str = "x-forwarded-host";

/// Whether the client reached the service over a secure front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Plain,
    Secure,
}

impl TransportMode {
    pub fn scheme(&self) -> &'static str {
        match self {
            TransportMode::Plain => "http",
            TransportMode::Secure => "https",
        }
    }
}

/// How the current request reached the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub mode: TransportMode,
    pub host: String,
    pub server_prefix: String,
}

impl RequestContext {
    /// Derive the context from request headers. The host is taken from
    /// `X-Forwarded-Host`, falling back to `Host`; it selects `Secure` when
    /// listed in `secure_hostnames`.
    pub fn from_headers(headers: &HeaderMap, secure_hostnames: &[String]) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let host = text(FORWARDED_HOST_HEADER)
            .or_else(|| text(header::HOST.as_str()))
            .unwrap_or_default();
        let mode = if secure_hostnames.iter().any(|h| *h == host) {
            TransportMode::Secure
        } else {
            TransportMode::Plain
        };

        Self {
            mode,
            host,
            server_prefix: text(SERVER_PREFIX_HEADER).unwrap_or_default(),
        }
    }

    /// Public URL of the human-readable description of `object_id`.
    pub fn references_url(&self, object_id: &str) -> String {
        format!(
            "{}://{}{}/info/{}.html",
            self.mode.scheme(),
            self.host,
            self.server_prefix,
            object_id
        )
    }
}
