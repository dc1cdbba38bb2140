// Transport configuration for the cloud and gateway HTTP clients.
//
// The Enlighten/Entrez cloud hosts and the LAN gateway get separate
// `reqwest::Client` instances. Only the gateway client ever honours
// `TlsMode::DangerAcceptInvalid`; the cloud client always verifies
// against the system roots.

use std::path::PathBuf;
use std::time::Duration;

use tracing::debug;

use crate::error::Error;

const USER_AGENT: &str = concat!("enphase-api/", env!("CARGO_PKG_VERSION"));

/// TLS verification mode for the gateway connection.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate. Envoy gateways serve a self-signed
    /// certificate on the LAN, so this is the gateway default.
    #[default]
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Certificate policy for the gateway host only.
    pub gateway_tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            gateway_tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Client for the Enlighten login and Entrez token hosts.
    pub fn build_cloud_client(&self) -> Result<reqwest::Client, Error> {
        Self::finish(self.builder())
    }

    /// Client for the Envoy gateway, with `gateway_tls` applied.
    pub fn build_gateway_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = self.builder();

        match &self.gateway_tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                debug!("gateway certificate verification disabled");
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        Self::finish(builder)
    }

    fn builder(&self) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
    }

    fn finish(builder: reqwest::ClientBuilder) -> Result<reqwest::Client, Error> {
        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
