// Envoy inventory endpoint

use serde_json::Value;
use tracing::debug;

use super::models::{Inverter, RawInventoryDevice};
use super::{decode, entries};
use crate::client::SessionClient;
use crate::error::Error;
use crate::token::TokenProvider;

const INVENTORY_PATH: &str = "inventory.json";
const MICROINVERTER_TYPE: &str = "PCU";

/// Flatten the devices of every `PCU` group, in gateway order.
///
/// Other groups are skipped without being decoded.
pub fn shape_inverters(raw: &Value) -> Result<Vec<Inverter>, Error> {
    entries(raw)?
        .iter()
        .filter(|g| g.get("type").and_then(Value::as_str) == Some(MICROINVERTER_TYPE))
        .flat_map(|g| {
            g.get("devices")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default()
        })
        .map(|d| decode::<RawInventoryDevice>(d).map(Inverter::from))
        .collect()
}

impl<P: TokenProvider> SessionClient<P> {
    /// List microinverters.
    ///
    /// `GET /inventory.json`, keeping only the `PCU` group's devices.
    pub async fn list_inverters(&self) -> Result<Vec<Inverter>, Error> {
        debug!("listing inverters");
        let raw = self.authenticated_get(INVENTORY_PATH).await?;
        shape_inverters(&raw)
    }
}
