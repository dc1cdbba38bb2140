// Session client
//
// Owns the Enlighten login, gateway targeting, and the authenticated GET
// executor with its single refresh-and-retry. Per-endpoint query methods
// live in `envoy/` as inherent methods on the same type.

use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use crate::auth::{AccessToken, CloudEndpoints, Credentials, DeviceTarget, SessionId};
use crate::enlighten::EnlightenAuthenticator;
use crate::error::{Error, Precondition, preview};
use crate::state::ClientState;
use crate::token::{EntrezTokenProvider, TokenProvider, TokenRequest};
use crate::transport::TransportConfig;

/// Everything needed to build and connect a [`SessionClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub credentials: Credentials,
    /// Gateway host; targeting happens at connect time only when both this
    /// and `serial` are set.
    pub host: Option<String>,
    pub serial: Option<String>,
    pub cloud: CloudEndpoints,
    pub transport: TransportConfig,
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            credentials: Credentials::new(username, password),
            host: None,
            serial: None,
            cloud: CloudEndpoints::default(),
            transport: TransportConfig::default(),
        }
    }

    pub fn with_device(mut self, host: Option<String>, serial: Option<String>) -> Self {
        self.host = host;
        self.serial = serial;
        self
    }
}

/// Client for one Enlighten account and (at most) one Envoy gateway.
///
/// All methods take `&self`. State lives in an explicit [`ClientState`]
/// record that is replaced wholesale on every transition, and token
/// refreshes are single-flight: concurrent callers that hit an expired
/// token wait for one refresh instead of each issuing their own.
pub struct SessionClient<P = EntrezTokenProvider> {
    credentials: Credentials,
    authenticator: EnlightenAuthenticator,
    tokens: P,
    gateway: reqwest::Client,
    state: RwLock<ClientState>,
    refresh: Mutex<()>,
}

impl SessionClient<EntrezTokenProvider> {
    /// Build an unauthenticated client. No network traffic.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let cloud = config.transport.build_cloud_client()?;
        let tokens = EntrezTokenProvider::new(cloud.clone(), config.cloud.token_url.clone());
        Self::assemble(config, cloud, tokens)
    }

    /// Log in, and target the gateway when both host and serial are given.
    pub async fn connect(config: ClientConfig) -> Result<Self, Error> {
        let device = (config.host.clone(), config.serial.clone());
        let client = Self::new(config)?;
        client.login().await?;

        match device {
            (Some(host), Some(serial)) => {
                client.set_target(host, serial).await?;
            }
            (None, None) => {}
            _ => warn!("gateway host and serial must both be set; skipping targeting"),
        }
        Ok(client)
    }
}

impl<P: TokenProvider> SessionClient<P> {
    /// Build an unauthenticated client around a custom token provider.
    pub fn with_provider(config: ClientConfig, tokens: P) -> Result<Self, Error> {
        let cloud = config.transport.build_cloud_client()?;
        Self::assemble(config, cloud, tokens)
    }

    /// `cloud` is shared with the token provider when it talks to Entrez.
    fn assemble(config: ClientConfig, cloud: reqwest::Client, tokens: P) -> Result<Self, Error> {
        let gateway = config.transport.build_gateway_client()?;
        Ok(Self {
            authenticator: EnlightenAuthenticator::new(cloud, config.cloud.login_url),
            credentials: config.credentials,
            tokens,
            gateway,
            state: RwLock::new(ClientState::Unauthenticated),
            refresh: Mutex::new(()),
        })
    }

    /// Snapshot of the current lifecycle state.
    pub async fn state(&self) -> ClientState {
        self.state.read().await.clone()
    }

    pub fn token_provider(&self) -> &P {
        &self.tokens
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Log in to Enlighten and store the session.
    pub async fn login(&self) -> Result<SessionId, Error> {
        let session = self.authenticator.login(&self.credentials).await?;
        let mut state = self.state.write().await;
        *state = state.with_session(session.clone());
        info!(user = self.credentials.username(), "Enlighten session established");
        Ok(session)
    }

    /// Point the client at a gateway and fetch a token for it.
    ///
    /// Re-targeting an already targeted client is allowed; target and token
    /// are swapped together once the new token has been issued.
    pub async fn set_target(
        &self,
        host: impl Into<String>,
        serial: impl Into<String>,
    ) -> Result<AccessToken, Error> {
        let session = self
            .state
            .read()
            .await
            .session()
            .filter(|s| !s.is_empty())
            .cloned()
            .ok_or(Precondition::NoSession)?;
        let target = DeviceTarget::new(host, serial)?;

        let _guard = self.refresh.lock().await;
        let token = self.issue(&session, &target).await?;

        let mut state = self.state.write().await;
        *state = state.with_target(target.clone(), token.clone())?;
        info!(host = target.host(), serial = target.serial(), "gateway targeted");
        Ok(token)
    }

    /// Fetch a fresh token for the current target and store it.
    ///
    /// Fails with [`Precondition::NoSession`] before login and
    /// [`Precondition::NoSerial`] before targeting, without touching the
    /// network.
    pub async fn fetch_token(&self) -> Result<AccessToken, Error> {
        let _guard = self.refresh.lock().await;
        self.refresh_locked().await
    }

    /// Caller must hold `self.refresh`.
    async fn refresh_locked(&self) -> Result<AccessToken, Error> {
        let (session, target) = self.state.read().await.token_inputs()?;
        let token = self.issue(&session, &target).await?;

        let mut state = self.state.write().await;
        *state = state.with_token(token.clone())?;
        debug!(serial = target.serial(), "gateway token replaced");
        Ok(token)
    }

    /// Refresh unless someone else already replaced the token we used.
    async fn refresh_after(&self, seen_generation: u64) -> Result<AccessToken, Error> {
        let _guard = self.refresh.lock().await;
        {
            let state = self.state.read().await;
            if let Ok(current) = state.gateway() {
                if current.generation != seen_generation {
                    debug!("token already refreshed by another request");
                    return Ok(current.token);
                }
            }
        }
        self.refresh_locked().await
    }

    async fn issue(&self, session: &SessionId, target: &DeviceTarget) -> Result<AccessToken, Error> {
        let request = TokenRequest {
            username: self.credentials.username(),
            session,
            serial: target.serial(),
        };
        self.tokens.fetch_token(&request).await
    }

    // ── Request execution ────────────────────────────────────────────

    /// `GET {gateway}/{path}` with the current bearer token.
    ///
    /// A 4xx response triggers exactly one token refresh and one retry of
    /// the same request. Anything else that is not 2xx, or a second
    /// failure, becomes [`Error::Request`]. The 2xx body is returned as
    /// parsed JSON, unmodified.
    pub async fn authenticated_get(&self, path: &str) -> Result<Value, Error> {
        let snapshot = self.state.read().await.gateway()?;
        let url = snapshot.target.url_for(path)?;

        let resp = self.send_get(&url, &snapshot.token).await?;
        let status = resp.status();
        if status.is_success() {
            return parse_json(resp).await;
        }
        if !status.is_client_error() {
            return Err(request_error(status, path, None));
        }

        warn!(status = status.as_u16(), path, "gateway rejected request, refreshing token");
        let token = self
            .refresh_after(snapshot.generation)
            .await
            .map_err(|e| request_error(status, path, Some(e)))?;

        let resp = self.send_get(&url, &token).await?;
        let status = resp.status();
        if status.is_success() {
            return parse_json(resp).await;
        }
        Err(request_error(status, path, None))
    }

    async fn send_get(&self, url: &Url, token: &AccessToken) -> Result<reqwest::Response, Error> {
        debug!("GET {}", url);
        self.gateway
            .get(url.clone())
            .bearer_auth(token.expose())
            .send()
            .await
            .map_err(Error::Transport)
    }
}

fn request_error(status: reqwest::StatusCode, path: &str, source: Option<Error>) -> Error {
    Error::Request {
        status: status.as_u16(),
        path: path.to_owned(),
        source: source.map(Box::new),
    }
}

async fn parse_json(resp: reqwest::Response) -> Result<Value, Error> {
    let body = resp.text().await.map_err(Error::Transport)?;
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}
