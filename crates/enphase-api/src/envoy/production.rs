// Envoy production endpoints
//
// Both payloads are returned verbatim; their layout differs between
// firmware generations and is left to the caller.

use serde_json::Value;
use tracing::debug;

use crate::client::SessionClient;
use crate::error::Error;
use crate::token::TokenProvider;

const PRODUCTION_PATH: &str = "api/v1/production";
const INVERTER_PRODUCTION_PATH: &str = "api/v1/production/inverters";

impl<P: TokenProvider> SessionClient<P> {
    /// Site-level production totals.
    ///
    /// `GET /api/v1/production`
    pub async fn main_production(&self) -> Result<Value, Error> {
        debug!("fetching production totals");
        self.authenticated_get(PRODUCTION_PATH).await
    }

    /// Per-inverter production.
    ///
    /// `GET /api/v1/production/inverters`
    pub async fn inverter_production(&self) -> Result<Value, Error> {
        debug!("fetching per-inverter production");
        self.authenticated_get(INVERTER_PRODUCTION_PATH).await
    }
}
