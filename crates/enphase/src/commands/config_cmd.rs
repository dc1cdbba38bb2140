//! Config subcommand handlers. None of these touch the network.

use enphase_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

/// Copy of the config with plaintext passwords masked.
fn redacted(cfg: &Config) -> Config {
    Config {
        default_profile: cfg.default_profile.clone(),
        defaults: enphase_config::Defaults {
            output: cfg.defaults.output.clone(),
            timeout: cfg.defaults.timeout,
        },
        profiles: cfg
            .profiles
            .iter()
            .map(|(name, profile)| {
                let mut profile = profile.clone();
                if profile.password.is_some() {
                    profile.password = Some(REDACTED.into());
                }
                (name.clone(), profile)
            })
            .collect(),
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let masked = redacted(&cfg);
            // Table and plain show the config in its own file format.
            let out = match config::output_format(global, &cfg) {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&masked)?,
                format => output::render_raw(format, &serde_json::to_value(&masked)?)?,
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword => {
            let profile_name = config::active_profile_name(global, &cfg);
            let password = rpassword::prompt_password(format!(
                "Enlighten password for profile '{profile_name}': "
            ))?;
            if password.is_empty() {
                return Err(CliError::Validation {
                    field: "password".into(),
                    reason: "password cannot be empty".into(),
                });
            }
            enphase_config::store_password(&profile_name, &password)?;
            tracing::info!(profile = %profile_name, "password stored in system keyring");
            if !global.quiet {
                eprintln!("Password stored in system keyring for profile '{profile_name}'");
            }
            Ok(())
        }
    }
}
