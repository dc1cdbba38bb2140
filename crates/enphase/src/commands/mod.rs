//! Command dispatch: bridges CLI args -> SessionClient calls -> output formatting.

pub mod config_cmd;
pub mod gateway;
pub mod token;

use enphase_api::{ClientConfig, SessionClient};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// What a gateway-bound command needs besides its own arguments.
pub struct Context<'a> {
    pub client: SessionClient,
    pub global: &'a GlobalOpts,
    pub output: OutputFormat,
}

/// Log in and target the gateway named by `config`.
///
/// Host and serial are checked before any network traffic.
pub async fn connect(config: ClientConfig, profile: &str) -> Result<SessionClient, CliError> {
    let missing: Vec<&str> = [("host", config.host.is_none()), ("serial", config.serial.is_none())]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();
    if !missing.is_empty() {
        return Err(CliError::NoGateway {
            missing: missing.join(", "),
        });
    }

    SessionClient::connect(config)
        .await
        .map_err(|e| CliError::from_api(e, profile))
}

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context<'_>) -> Result<(), CliError> {
    match cmd {
        Command::Meters => gateway::meters(ctx).await,
        Command::Inverters => gateway::inverters(ctx).await,
        Command::Readings => gateway::readings(ctx).await,
        Command::Production => gateway::production(ctx).await,
        Command::InverterProduction => gateway::inverter_production(ctx).await,
        Command::Get(args) => gateway::get(ctx, &args.path).await,
        Command::Token => token::handle(ctx).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
