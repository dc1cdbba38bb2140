// Enlighten cloud login
//
// Exchanges the account e-mail/password for a session identifier.
// The form field names are fixed by the Enlighten web login.

use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::debug;

use crate::auth::{Credentials, SessionId};
use crate::error::{Error, preview};

#[derive(Deserialize)]
struct LoginResponse {
    session_id: Option<String>,
}

/// Performs the Enlighten credential exchange.
#[derive(Debug, Clone)]
pub struct EnlightenAuthenticator {
    http: reqwest::Client,
    login_url: String,
}

impl EnlightenAuthenticator {
    pub fn new(http: reqwest::Client, login_url: impl Into<String>) -> Self {
        Self {
            http,
            login_url: login_url.into(),
        }
    }

    /// Log in and return the Enlighten session identifier.
    ///
    /// `POST {login_url}` with form fields `user[email]` / `user[password]`.
    /// Any non-2xx response is an [`Error::Authentication`] and is never retried.
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionId, Error> {
        debug!("logging in at {}", self.login_url);

        let form = [
            ("user[email]", credentials.username()),
            ("user[password]", credentials.password().expose_secret()),
        ];

        let resp = self
            .http
            .post(&self.login_url)
            .form(&form[..])
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                status: status.as_u16(),
                message: preview(&body),
            });
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let parsed: LoginResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            })?;

        match parsed.session_id {
            Some(id) if !id.is_empty() => {
                debug!("login successful");
                Ok(SessionId::new(id))
            }
            _ => Err(Error::Authentication {
                status: status.as_u16(),
                message: "login response did not include a session_id".into(),
            }),
        }
    }
}
