//! Clap derive structures for the `enphase` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// enphase -- read live telemetry from an Enphase Envoy gateway
#[derive(Debug, Parser)]
#[command(
    name = "enphase",
    version,
    about = "Query Enphase Envoy solar gateways from the command line",
    long_about = "Logs in to Enphase Enlighten, obtains a gateway token for your Envoy,\n\
        and reads meters, inverters, and production data from the local gateway.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "ENPHASE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Envoy gateway host or base URL (overrides profile)
    #[arg(long, env = "ENPHASE_HOST", global = true)]
    pub host: Option<String>,

    /// Envoy gateway serial number (overrides profile)
    #[arg(long, env = "ENPHASE_SERIAL", global = true)]
    pub serial: Option<String>,

    /// Enlighten account e-mail (overrides profile)
    #[arg(long, short = 'u', env = "ENPHASE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Enlighten password
    #[arg(long, env = "ENPHASE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(long, short = 'o', env = "ENPHASE_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// CA certificate that signed the gateway's certificate
    #[arg(long, global = true)]
    pub ca_cert: Option<PathBuf>,

    /// Verify the gateway certificate against the system roots
    #[arg(long, global = true)]
    pub verify_gateway_tls: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ENPHASE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output Enum ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List enabled meters
    #[command(alias = "m")]
    Meters,

    /// List microinverters from the gateway inventory
    #[command(alias = "inv")]
    Inverters,

    /// Show live meter readings (raw gateway JSON)
    Readings,

    /// Show site production totals (raw gateway JSON)
    Production,

    /// Show per-inverter production (raw gateway JSON)
    InverterProduction,

    /// GET an arbitrary gateway path with the session token
    Get(GetArgs),

    /// Fetch a fresh gateway token and print it
    Token,

    /// Manage configuration profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Gateway path, e.g. `ivp/meters/readings`
    pub path: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the resolved configuration (passwords redacted)
    Show,

    /// Store the profile's Enlighten password in the system keyring
    SetPassword,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
