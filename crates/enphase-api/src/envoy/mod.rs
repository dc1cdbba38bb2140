// Envoy gateway endpoints
//
// Read-only queries against the local gateway. Each one issues exactly one
// `authenticated_get` and either passes the JSON through or shapes it into
// the stable types in `models`.

pub mod inventory;
pub mod meters;
pub mod models;
pub mod production;

pub use inventory::shape_inverters;
pub use meters::shape_meters;
pub use models::{Inverter, Meter};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, preview};

/// Decode a gateway payload into its raw vendor shape.
fn decode<T: DeserializeOwned>(raw: &Value) -> Result<T, Error> {
    T::deserialize(raw).map_err(|e| {
        let body = raw.to_string();
        Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        }
    })
}

/// The top-level JSON array of a list endpoint.
fn entries(raw: &Value) -> Result<&[Value], Error> {
    raw.as_array().map(Vec::as_slice).ok_or_else(|| {
        let body = raw.to_string();
        Error::Deserialization {
            message: format!("expected a JSON array (body preview: {:?})", preview(&body)),
            body,
        }
    })
}
