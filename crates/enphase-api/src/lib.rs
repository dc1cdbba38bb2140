// enphase-api: Async Rust client for Enphase Enlighten login and the local Envoy gateway

pub mod auth;
pub mod client;
pub mod enlighten;
pub mod envoy;
pub mod error;
pub mod state;
pub mod token;
pub mod transport;

pub use auth::{AccessToken, CloudEndpoints, Credentials, DeviceTarget, SessionId};
pub use client::{ClientConfig, SessionClient};
pub use enlighten::EnlightenAuthenticator;
pub use envoy::{Inverter, Meter, shape_inverters, shape_meters};
pub use error::{Error, Precondition};
pub use state::ClientState;
pub use token::{EntrezTokenProvider, TokenProvider, TokenRequest};
pub use transport::{TlsMode, TransportConfig};
