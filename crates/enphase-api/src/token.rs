// Gateway token issuance
//
// The Entrez service turns (username, session, serial) into a bearer token
// for one Envoy. `SessionClient` only talks to it through `TokenProvider`,
// so tests can swap in a counting fake.

use std::future::Future;

use serde::{Serialize, Serializer};
use tracing::debug;

use crate::auth::{AccessToken, SessionId};
use crate::error::{Error, preview};

/// Body of a token request: `{username, session_id, serial_num}`.
#[derive(Debug, Serialize)]
pub struct TokenRequest<'a> {
    pub username: &'a str,
    #[serde(rename = "session_id", serialize_with = "expose_session")]
    pub session: &'a SessionId,
    #[serde(rename = "serial_num")]
    pub serial: &'a str,
}

fn expose_session<S: Serializer>(session: &&SessionId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(session.expose())
}

/// Source of gateway bearer tokens.
pub trait TokenProvider: Send + Sync {
    fn fetch_token(
        &self,
        request: &TokenRequest<'_>,
    ) -> impl Future<Output = Result<AccessToken, Error>> + Send;
}

/// [`TokenProvider`] backed by the Entrez `POST /tokens` endpoint.
#[derive(Debug, Clone)]
pub struct EntrezTokenProvider {
    http: reqwest::Client,
    token_url: String,
}

impl EntrezTokenProvider {
    pub fn new(http: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            http,
            token_url: token_url.into(),
        }
    }
}

impl TokenProvider for EntrezTokenProvider {
    /// The 2xx response body is the token itself, as plain text.
    async fn fetch_token(&self, request: &TokenRequest<'_>) -> Result<AccessToken, Error> {
        debug!(serial = request.serial, "requesting gateway token");

        let resp = self
            .http
            .post(&self.token_url)
            .json(request)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        if !status.is_success() {
            return Err(Error::TokenAcquisition {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let token = body.trim();
        if token.is_empty() {
            return Err(Error::TokenAcquisition {
                status: status.as_u16(),
                message: "token service returned an empty body".into(),
            });
        }

        debug!("gateway token issued");
        Ok(AccessToken::new(token))
    }
}
