use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::error::{Error, Precondition};

/// Enlighten cloud login endpoint.
pub const ENLIGHTEN_LOGIN_URL: &str = "https://enlighten.enphaseenergy.com/login/login.json";

/// Entrez gateway-token issuance endpoint.
pub const ENTREZ_TOKEN_URL: &str = "https://entrez.enphaseenergy.com/tokens";

/// Enlighten account credentials. Fixed for the client's lifetime.
#[derive(Debug, Clone)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: SecretString) -> Self {
        Self {
            username: username.into(),
            password,
        }
    }

    /// The account e-mail address.
    pub fn username(&self) -> &str {
        &self.username
    }

    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }
}

/// Opaque session identifier issued by the Enlighten login.
///
/// The client never learns its expiry; a stale session only shows up as a
/// token-issuance failure later on.
#[derive(Debug, Clone)]
pub struct SessionId(SecretString);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

/// Bearer token scoped to one (username, session, serial) triple.
#[derive(Debug, Clone)]
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretString::from(value.into()))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.expose().is_empty()
    }
}

/// The gateway device that queries are sent to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceTarget {
    host: String,
    serial: String,
}

impl DeviceTarget {
    /// `host` is either a bare host (`envoy.local`, `192.168.1.50:443`),
    /// addressed over HTTPS, or a base URL with an explicit scheme.
    ///
    /// An empty serial is rejected up front: the token service cannot
    /// scope a token without one.
    pub fn new(host: impl Into<String>, serial: impl Into<String>) -> Result<Self, Error> {
        let serial = serial.into();
        if serial.trim().is_empty() {
            return Err(Precondition::NoSerial.into());
        }
        let target = Self {
            host: host.into(),
            serial,
        };
        // Validate eagerly so a bad host fails at targeting time.
        target.base_url()?;
        Ok(target)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Gateway root URL, always ending in `/`.
    pub fn base_url(&self) -> Result<Url, Error> {
        let host = self.host.trim().trim_end_matches('/');
        let raw = if host.contains("://") {
            format!("{host}/")
        } else {
            format!("https://{host}/")
        };
        Ok(Url::parse(&raw)?)
    }

    /// Full URL for a gateway path such as `ivp/meters`.
    ///
    /// The result always shares the gateway's scheme, host and port and
    /// stays under its base path. Anything else is [`Error::GatewayPath`].
    pub fn url_for(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url()?;
        let outside = || Error::GatewayPath(path.to_owned());

        let relative = path.trim_start_matches('/');
        if path.starts_with("//") || Url::parse(relative).is_ok() {
            return Err(outside());
        }
        let route = relative.split(['?', '#']).next().unwrap_or_default();
        if route.split('/').any(is_dot_dot) {
            return Err(outside());
        }

        let url = base.join(relative)?;
        if url.origin() != base.origin() || !url.path().starts_with(base.path()) {
            return Err(outside());
        }
        Ok(url)
    }
}

fn is_dot_dot(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        ".." | ".%2e" | "%2e." | "%2e%2e"
    )
}

/// Cloud endpoints used for login and token issuance.
///
/// Defaults to the production Enphase hosts; tests and proxies override them.
#[derive(Debug, Clone)]
pub struct CloudEndpoints {
    pub login_url: String,
    pub token_url: String,
}

impl Default for CloudEndpoints {
    fn default() -> Self {
        Self {
            login_url: ENLIGHTEN_LOGIN_URL.into(),
            token_url: ENTREZ_TOKEN_URL.into(),
        }
    }
}
