//! CLI-facing configuration: applies `GlobalOpts` overrides on top of
//! the shared `enphase-config` profiles and produces a `ClientConfig`.
//!
//! Precedence for every field: flag > env var > profile > default.

use secrecy::SecretString;

use enphase_api::ClientConfig;
use enphase_config::{Config, Profile};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use enphase_config::{config_path, load_config_or_default};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Output format: flag/env first, then the config default.
pub fn output_format(global: &GlobalOpts, config: &Config) -> OutputFormat {
    global.output.unwrap_or(match config.defaults.output.as_str() {
        "json" => OutputFormat::Json,
        "json-compact" => OutputFormat::JsonCompact,
        "yaml" => OutputFormat::Yaml,
        "plain" => OutputFormat::Plain,
        _ => OutputFormat::Table,
    })
}

/// The named profile merged with flag overrides.
///
/// An unknown profile name is not an error: flags and env vars alone
/// may carry everything needed.
pub fn effective_profile(global: &GlobalOpts, config: &Config, profile_name: &str) -> Profile {
    let mut profile = config.profiles.get(profile_name).cloned().unwrap_or_default();

    if let Some(ref host) = global.host {
        profile.host = Some(host.clone());
    }
    if let Some(ref serial) = global.serial {
        profile.serial = Some(serial.clone());
    }
    if let Some(ref username) = global.username {
        profile.username = Some(username.clone());
    }
    if let Some(ref ca) = global.ca_cert {
        profile.ca_cert = Some(ca.clone());
    }
    if global.verify_gateway_tls {
        profile.insecure_gateway = Some(false);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    profile
}

/// Build the `ClientConfig` for the active profile.
pub fn build_client_config(global: &GlobalOpts, config: &Config) -> Result<ClientConfig, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = effective_profile(global, config, &profile_name);

    if profile.username.is_none() {
        return Err(CliError::NoCredentials {
            profile: profile_name,
        });
    }

    let password = match global.password {
        Some(ref pw) => SecretString::from(pw.clone()),
        None => enphase_config::resolve_password(&profile, &profile_name)?,
    };

    let client_config =
        enphase_config::profile_to_client_config(&profile, &profile_name, password, &config.defaults)?;

    tracing::debug!(
        profile = %profile_name,
        timeout = ?client_config.transport.timeout,
        "client configuration resolved"
    );
    Ok(client_config)
}
