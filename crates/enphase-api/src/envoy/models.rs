// Envoy payload types
//
// `Raw*` structs mirror the gateway's JSON loosely (unknown fields ignored).
// `Meter` and `Inverter` are the stable shapes handed to callers.

use serde::{Deserialize, Serialize};

// ── Raw gateway shapes ───────────────────────────────────────────────

/// Enabled entry of `GET /ivp/meters`. Only decoded after filtering on
/// `state`, so disabled entries may be arbitrarily incomplete.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMeter {
    pub eid: u64,
    #[serde(default)]
    pub measurement_type: String,
}

/// Device of a `PCU` group in `GET /inventory.json`. Groups of other
/// device classes (`ACB` batteries, `NSRB` relays, ...) are never decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInventoryDevice {
    #[serde(default)]
    pub part_num: String,
    #[serde(default)]
    pub serial_num: String,
    pub producing: Option<bool>,
    pub communicating: Option<bool>,
    pub phase: Option<String>,
}

// ── Client-facing shapes ─────────────────────────────────────────────

/// An enabled meter: `{eid, type}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meter {
    pub eid: u64,
    /// `production`, `net-consumption`, `total-consumption`, ...
    #[serde(rename = "type")]
    pub measurement_type: String,
}

/// A microinverter from the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inverter {
    pub part_number: String,
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producing: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub communicating: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl From<RawMeter> for Meter {
    fn from(raw: RawMeter) -> Self {
        Self {
            eid: raw.eid,
            measurement_type: raw.measurement_type,
        }
    }
}

impl From<RawInventoryDevice> for Inverter {
    fn from(raw: RawInventoryDevice) -> Self {
        Self {
            part_number: raw.part_num,
            serial_number: raw.serial_num,
            producing: raw.producing,
            communicating: raw.communicating,
            phase: raw.phase,
        }
    }
}
