//! Shared configuration for the `enphase` CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `enphase_api::ClientConfig`. The CLI layers its
//! flag overrides on top of what this crate produces.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use enphase_api::{ClientConfig, CloudEndpoints, TlsMode, TransportConfig};

/// Keyring service name; entries are keyed `{profile}/password`.
pub const KEYRING_SERVICE: &str = "enphase";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named gateway profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named Enlighten account + gateway profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Gateway host (e.g., "envoy.local" or "192.168.1.50").
    pub host: Option<String>,

    /// Gateway serial number.
    pub serial: Option<String>,

    /// Enlighten account e-mail.
    pub username: Option<String>,

    /// Enlighten password in plaintext. Prefer the keyring.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Path to a CA certificate that signed the gateway's certificate.
    pub ca_cert: Option<PathBuf>,

    /// Accept the gateway's self-signed certificate (default true).
    pub insecure_gateway: Option<bool>,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override the Enlighten login URL.
    pub login_url: Option<String>,

    /// Override the Entrez token URL.
    pub token_url: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "enphase", "enphase").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("enphase");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file, layered over defaults and under
/// `ENPHASE_`-prefixed environment variables (`__` separates levels).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("ENPHASE_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, falling back to defaults (with a warning) when the file
/// or environment cannot be parsed. A missing file is not an error.
pub fn load_config_or_default() -> Config {
    load_config_or_default_from(&config_path())
}

pub fn load_config_or_default_from(path: &Path) -> Config {
    load_config_from(path).unwrap_or_else(|err| {
        warn!(path = %path.display(), error = %err, "ignoring unreadable config, using defaults");
        Config::default()
    })
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
        .and_then(|entry| entry.get_password())
        .ok()
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))?;
    entry.set_password(password)?;
    Ok(())
}

/// Resolve the Enlighten password from the credential chain.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(profile, profile_name, keyring_password)
}

fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    keyring_lookup: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(ref env_name) = profile.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Some(secret) = keyring_lookup(profile_name) {
        return Ok(SecretString::from(secret));
    }

    // 3. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Gateway TLS policy for a profile. A CA path wins; otherwise the
/// gateway's self-signed certificate is accepted unless disabled.
pub fn gateway_tls(profile: &Profile) -> TlsMode {
    if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else if profile.insecure_gateway == Some(false) {
        TlsMode::System
    } else {
        TlsMode::DangerAcceptInvalid
    }
}

/// Build a `ClientConfig` from a profile and an already resolved password.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    password: SecretString,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let username = profile
        .username
        .clone()
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ConfigError::NoCredentials {
            profile: profile_name.into(),
        })?;

    if profile.serial.as_deref().is_some_and(|s| s.trim().is_empty()) {
        return Err(ConfigError::Validation {
            field: "serial".into(),
            reason: "must not be empty".into(),
        });
    }

    let mut cloud = CloudEndpoints::default();
    if let Some(ref url) = profile.login_url {
        cloud.login_url.clone_from(url);
    }
    if let Some(ref url) = profile.token_url {
        cloud.token_url.clone_from(url);
    }

    let transport = TransportConfig {
        gateway_tls: gateway_tls(profile),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
    };

    let mut config = ClientConfig::new(username, password)
        .with_device(profile.host.clone(), profile.serial.clone());
    config.cloud = cloud;
    config.transport = transport;
    Ok(config)
}
