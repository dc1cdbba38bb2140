use thiserror::Error;

/// Operation invoked before the client reached the state it needs.
///
/// These are raised before any network traffic is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Precondition {
    /// No Enlighten session yet -- call `login` first.
    #[error("no session")]
    NoSession,

    /// No gateway serial number configured.
    #[error("no serial")]
    NoSerial,

    /// No gateway targeted (endpoint + serial + token) yet.
    #[error("no gateway target")]
    NoTarget,
}

/// Top-level error type for the `enphase-api` crate.
///
/// Covers the cloud login, token issuance, and gateway query surfaces,
/// plus the transport failures underneath them. The CLI maps these into
/// user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Enlighten rejected the credentials. Never retried.
    #[error("Authentication failed (HTTP {status}): {message}")]
    Authentication { status: u16, message: String },

    /// Operation invoked out of order.
    #[error("Precondition failed: {0}")]
    Precondition(#[from] Precondition),

    /// The token service refused to issue a gateway token.
    #[error("Failed to acquire access token (HTTP {status}): {message}")]
    TokenAcquisition { status: u16, message: String },

    // ── Gateway ─────────────────────────────────────────────────────
    /// Gateway query failed after the single refresh-and-retry, or with a
    /// status outside the refreshable 4xx band. When the refresh itself
    /// failed, `source` holds the token error.
    #[error("Gateway request for {path} failed (HTTP {status})")]
    Request {
        status: u16,
        path: String,
        #[source]
        source: Option<Box<Error>>,
    },

    /// A query path that would resolve outside the targeted gateway
    /// (absolute URL, scheme-relative `//host`, or a `..` escape).
    #[error("Path does not stay on the gateway: {0}")]
    GatewayPath(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup error (unreadable CA bundle, client build failure).
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

/// First 200 characters of a response body, for error messages.
pub(crate) fn preview(body: &str) -> String {
    body.chars().take(200).collect()
}
