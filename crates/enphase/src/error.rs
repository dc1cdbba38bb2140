//! CLI error types with miette diagnostics.
//!
//! Maps `enphase_api::Error` and `ConfigError` variants into user-facing
//! errors with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use enphase_api::{Error as ApiError, Precondition};
use enphase_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const GATEWAY: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect: {message}")]
    #[diagnostic(
        code(enphase::connection_failed),
        help(
            "Check that the gateway is reachable on your network and that\n\
             the host is correct. Try: enphase production --host <ip> -v"
        )
    )]
    ConnectionFailed { message: String },

    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(enphase::tls_error),
        help("Check the --ca-cert path, or drop --verify-gateway-tls for self-signed gateways.")
    )]
    TlsError { message: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(enphase::timeout),
        help("Increase timeout with --timeout or check gateway responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("Enlighten login failed (HTTP {status})")]
    #[diagnostic(
        code(enphase::auth_failed),
        help(
            "Verify your Enlighten e-mail and password.\n\
             Run: enphase config set-password --profile {profile}"
        )
    )]
    AuthFailed { status: u16, profile: String },

    #[error("Gateway token request was rejected (HTTP {status}): {message}")]
    #[diagnostic(
        code(enphase::token_failed),
        help("Check that the serial number belongs to a gateway on this Enlighten account.")
    )]
    TokenFailed { status: u16, message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(enphase::no_credentials),
        help(
            "Set ENPHASE_USERNAME and ENPHASE_PASSWORD, pass --username/--password,\n\
             or add a profile to the config file (see: enphase config path)."
        )
    )]
    NoCredentials { profile: String },

    #[error("No gateway configured: {missing}")]
    #[diagnostic(
        code(enphase::no_gateway),
        help("Pass --host and --serial, or set them in your profile.")
    )]
    NoGateway { missing: String },

    // ── Gateway ──────────────────────────────────────────────────────

    #[error("Gateway returned HTTP {status} for {path}")]
    #[diagnostic(code(enphase::gateway_error))]
    Gateway {
        status: u16,
        path: String,
        #[source]
        source: Option<Box<ApiError>>,
    },

    #[error("Unexpected gateway response: {message}")]
    #[diagnostic(code(enphase::bad_response))]
    BadResponse { message: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(enphase::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(enphase::config))]
    Config(ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Output serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Output serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Output serialization failed: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::TokenFailed { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::Timeout => exit_code::TIMEOUT,
            Self::Gateway { .. } | Self::BadResponse { .. } => exit_code::GATEWAY,
            Self::Validation { .. } | Self::NoGateway { .. } => exit_code::USAGE,
            Self::Config(_) | Self::Io(_) | Self::Json(_) | Self::Yaml(_) | Self::Toml(_) => {
                exit_code::GENERAL
            }
        }
    }

    /// Convert an API error, naming the profile in auth diagnostics.
    pub fn from_api(err: ApiError, profile: &str) -> Self {
        match err {
            ApiError::Authentication { status, .. } => Self::AuthFailed {
                status,
                profile: profile.into(),
            },
            other => other.into(),
        }
    }
}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Authentication { status, .. } => Self::AuthFailed {
                status,
                profile: "default".into(),
            },
            ApiError::TokenAcquisition { status, message } => Self::TokenFailed { status, message },
            ApiError::Precondition(Precondition::NoSession) => Self::NoCredentials {
                profile: "default".into(),
            },
            ApiError::Precondition(p) => Self::NoGateway {
                missing: p.to_string(),
            },
            ApiError::Request {
                status,
                path,
                source,
            } => Self::Gateway {
                status,
                path,
                source,
            },
            ApiError::Transport(e) if e.is_timeout() => Self::Timeout,
            ApiError::Transport(e) => Self::ConnectionFailed {
                message: e.to_string(),
            },
            ApiError::InvalidUrl(e) => Self::Validation {
                field: "host".into(),
                reason: e.to_string(),
            },
            ApiError::GatewayPath(path) => Self::Validation {
                field: "path".into(),
                reason: format!("{path} does not stay on the gateway"),
            },
            ApiError::Tls(message) => Self::TlsError { message },
            ApiError::Deserialization { message, .. } => Self::BadResponse { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
