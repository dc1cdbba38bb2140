// Envoy meter endpoints
//
// Meter configuration (`ivp/meters`) and live readings (`ivp/meters/readings`).

use serde_json::Value;
use tracing::debug;

use super::{decode, entries};
use super::models::{Meter, RawMeter};
use crate::client::SessionClient;
use crate::error::Error;
use crate::token::TokenProvider;

const METERS_PATH: &str = "ivp/meters";
const METER_READINGS_PATH: &str = "ivp/meters/readings";

/// Keep meters whose `state` is `"enabled"`, in gateway order.
///
/// Only kept entries are decoded.
pub fn shape_meters(raw: &Value) -> Result<Vec<Meter>, Error> {
    entries(raw)?
        .iter()
        .filter(|m| m.get("state").and_then(Value::as_str) == Some("enabled"))
        .map(|m| decode::<RawMeter>(m).map(Meter::from))
        .collect()
}

impl<P: TokenProvider> SessionClient<P> {
    /// List enabled meters.
    ///
    /// `GET /ivp/meters`
    pub async fn list_meters(&self) -> Result<Vec<Meter>, Error> {
        debug!("listing meters");
        let raw = self.authenticated_get(METERS_PATH).await?;
        shape_meters(&raw)
    }

    /// Live meter readings, passed through untouched.
    ///
    /// `GET /ivp/meters/readings`
    pub async fn meter_readings(&self) -> Result<Value, Error> {
        debug!("fetching meter readings");
        self.authenticated_get(METER_READINGS_PATH).await
    }
}
