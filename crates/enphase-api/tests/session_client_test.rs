#![allow(clippy::unwrap_used)]
// Integration tests for `SessionClient` using wiremock.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use enphase_api::{
    AccessToken, ClientConfig, ClientState, CloudEndpoints, Error, Precondition, SessionClient,
    TokenProvider, TokenRequest,
};

const USERNAME: &str = "owner@example.com";
const SERIAL: &str = "122012345678";

// ── Helpers ─────────────────────────────────────────────────────────

/// Token provider that hands out `token-1`, `token-2`, ... and counts calls.
#[derive(Default)]
struct CountingProvider {
    calls: AtomicUsize,
}

impl CountingProvider {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenProvider for CountingProvider {
    async fn fetch_token(&self, _request: &TokenRequest<'_>) -> Result<AccessToken, Error> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(AccessToken::new(format!("token-{n}")))
    }
}

fn config(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(USERNAME, "s3cret".to_string().into());
    config.cloud = CloudEndpoints {
        login_url: format!("{}/login/login.json", server.uri()),
        token_url: format!("{}/tokens", server.uri()),
    };
    config
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login/login.json"))
        .and(body_string_contains("user%5Bemail%5D=owner%40example.com"))
        .and(body_string_contains("user%5Bpassword%5D=s3cret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "success", "session_id": "sess-123" })),
        )
        .mount(server)
        .await;
}

/// Logged-in client targeted at the mock server, using `CountingProvider`.
async fn targeted() -> (MockServer, SessionClient<CountingProvider>) {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let client =
        SessionClient::with_provider(config(&server), CountingProvider::default()).unwrap();
    client.login().await.unwrap();
    client.set_target(server.uri(), SERIAL).await.unwrap();
    (server, client)
}

fn meters_body() -> serde_json::Value {
    json!([
        { "eid": 1, "state": "enabled", "measurementType": "production" },
        { "eid": 2, "state": "disabled", "measurementType": "net" },
    ])
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let client = SessionClient::new(config(&server)).unwrap();
    let session = client.login().await.unwrap();

    assert_eq!(session.expose(), "sess-123");
    assert!(matches!(client.state().await, ClientState::Authenticated { .. }));
}

#[tokio::test]
async fn test_login_failure_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/login.json"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid credentials"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(config(&server)).unwrap();
    let result = client.login().await;

    match result {
        Err(Error::Authentication { status, ref message }) => {
            assert_eq!(status, 401);
            assert!(message.contains("Invalid credentials"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(matches!(client.state().await, ClientState::Unauthenticated));
}

#[tokio::test]
async fn test_login_without_session_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login/login.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .mount(&server)
        .await;

    let client = SessionClient::new(config(&server)).unwrap();
    let result = client.login().await;

    assert!(
        matches!(result, Err(Error::Authentication { status: 200, .. })),
        "expected Authentication error, got: {result:?}"
    );
}

// ── Precondition tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_token_before_login() {
    let server = MockServer::start().await;
    let client = SessionClient::new(config(&server)).unwrap();

    let result = client.fetch_token().await;

    assert!(
        matches!(result, Err(Error::Precondition(Precondition::NoSession))),
        "expected NoSession, got: {result:?}"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_token_without_serial() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let client = SessionClient::new(config(&server)).unwrap();
    client.login().await.unwrap();

    let result = client.fetch_token().await;

    assert!(
        matches!(result, Err(Error::Precondition(Precondition::NoSerial))),
        "expected NoSerial, got: {result:?}"
    );
    // Only the login went out.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_set_target_before_login() {
    let server = MockServer::start().await;
    let client = SessionClient::new(config(&server)).unwrap();

    let result = client.set_target("envoy.local", SERIAL).await;

    assert!(matches!(
        result,
        Err(Error::Precondition(Precondition::NoSession))
    ));
}

#[tokio::test]
async fn test_query_before_targeting() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    let client = SessionClient::new(config(&server)).unwrap();
    client.login().await.unwrap();

    let result = client.list_meters().await;

    assert!(matches!(
        result,
        Err(Error::Precondition(Precondition::NoTarget))
    ));
}

// ── Token issuance tests ────────────────────────────────────────────

#[tokio::test]
async fn test_token_request_body_and_plain_text_response() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/tokens"))
        .and(body_json(json!({
            "username": USERNAME,
            "session_id": "sess-123",
            "serial_num": SERIAL,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("eyJhbGciOiJFUzI1NiJ9.gw\n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(config(&server)).unwrap();
    client.login().await.unwrap();
    let token = client.set_target(server.uri(), SERIAL).await.unwrap();

    assert_eq!(token.expose(), "eyJhbGciOiJFUzI1NiJ9.gw");
    assert!(client.state().await.is_targeted());
}

#[tokio::test]
async fn test_token_rejection_leaves_client_authenticated() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/tokens"))
        .respond_with(ResponseTemplate::new(403).set_body_string("not your envoy"))
        .mount(&server)
        .await;

    let client = SessionClient::new(config(&server)).unwrap();
    client.login().await.unwrap();
    let result = client.set_target(server.uri(), SERIAL).await;

    assert!(
        matches!(result, Err(Error::TokenAcquisition { status: 403, .. })),
        "expected TokenAcquisition, got: {result:?}"
    );
    assert!(matches!(client.state().await, ClientState::Authenticated { .. }));
}

// ── Retry policy tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_refreshes_once_on_401_and_returns_second_body() {
    let (server, client) = targeted().await;

    Mock::given(method("GET"))
        .and(path("/ivp/meters/readings"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ivp/meters/readings"))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "eid": 1, "activePower": 512.3 }])))
        .expect(1)
        .mount(&server)
        .await;

    let body = client.meter_readings().await.unwrap();

    assert_eq!(body, json!([{ "eid": 1, "activePower": 512.3 }]));
    // One token at targeting time, exactly one refresh.
    assert_eq!(client.token_provider().calls(), 2);
    assert_eq!(client.state().await.token().unwrap().expose(), "token-2");
}

#[tokio::test]
async fn test_no_second_retry_after_repeated_401() {
    let (server, client) = targeted().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/production"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let result = client.main_production().await;

    match result {
        Err(Error::Request { status, ref path, ref source }) => {
            assert_eq!(status, 401);
            assert_eq!(path, "api/v1/production");
            assert!(source.is_none());
        }
        other => panic!("expected Request error, got: {other:?}"),
    }
    assert_eq!(client.token_provider().calls(), 2);
}

#[tokio::test]
async fn test_server_error_does_not_refresh() {
    let (server, client) = targeted().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/production/inverters"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let result = client.inverter_production().await;

    assert!(
        matches!(result, Err(Error::Request { status: 503, .. })),
        "expected Request(503), got: {result:?}"
    );
    assert_eq!(client.token_provider().calls(), 1);
}

#[tokio::test]
async fn test_refresh_failure_folds_into_request_error() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_string("first-token"))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/tokens"))
        .respond_with(ResponseTemplate::new(502).set_body_string("entrez down"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ivp/meters"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = SessionClient::new(config(&server)).unwrap();
    client.login().await.unwrap();
    client.set_target(server.uri(), SERIAL).await.unwrap();

    let result = client.list_meters().await;

    match result {
        Err(Error::Request { status: 401, source: Some(ref inner), .. }) => {
            assert!(matches!(**inner, Error::TokenAcquisition { status: 502, .. }));
        }
        other => panic!("expected Request error with token source, got: {other:?}"),
    }
    // The failed refresh did not disturb the stored token.
    assert_eq!(client.state().await.token().unwrap().expose(), "first-token");
}

#[tokio::test]
async fn test_concurrent_401s_share_one_refresh() {
    let (server, client) = targeted().await;

    Mock::given(method("GET"))
        .and(path("/ivp/meters"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ivp/meters"))
        .and(header("authorization", "Bearer token-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meters_body()))
        .mount(&server)
        .await;

    let (a, b) = tokio::join!(client.list_meters(), client.list_meters());

    assert_eq!(a.unwrap().len(), 1);
    assert_eq!(b.unwrap().len(), 1);
    assert_eq!(client.token_provider().calls(), 2);
}

#[tokio::test]
async fn test_refresh_band_is_exactly_4xx() {
    // (status, refresh expected)
    let cases = [
        (204, false),
        (304, false),
        (400, true),
        (403, true),
        (499, true),
        (500, false),
    ];

    for (status, refreshes) in cases {
        let (server, client) = targeted().await;
        let sends = if refreshes { 2 } else { 1 };

        Mock::given(method("GET"))
            .and(path("/api/v1/production"))
            .respond_with(ResponseTemplate::new(status))
            .expect(sends)
            .mount(&server)
            .await;

        let result = client.main_production().await;

        assert!(result.is_err(), "HTTP {status} should fail, got: {result:?}");
        assert_eq!(
            client.token_provider().calls(),
            if refreshes { 2 } else { 1 },
            "token requests after HTTP {status}"
        );
    }
}

// ── Gateway scoping tests ───────────────────────────────────────────

#[tokio::test]
async fn test_token_never_sent_off_gateway() {
    let (server, client) = targeted().await;
    let other = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "leaked": true })))
        .expect(0)
        .mount(&other)
        .await;
    Mock::given(method("GET"))
        .and(path("/etc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let absolute = format!("{}/steal", other.uri());
    let scheme_relative = absolute.trim_start_matches("http:").to_owned();
    for path in [absolute.as_str(), scheme_relative.as_str(), "ivp/../../etc"] {
        let result = client.authenticated_get(path).await;
        assert!(
            matches!(result, Err(Error::GatewayPath(ref p)) if p == path),
            "{path} should be rejected, got: {result:?}"
        );
    }
    assert_eq!(client.token_provider().calls(), 1);
}

// ── Shaped endpoint tests ───────────────────────────────────────────

#[tokio::test]
async fn test_list_meters() {
    let (server, client) = targeted().await;

    Mock::given(method("GET"))
        .and(path("/ivp/meters"))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(meters_body()))
        .mount(&server)
        .await;

    let meters = client.list_meters().await.unwrap();

    assert_eq!(meters.len(), 1);
    assert_eq!(meters[0].eid, 1);
    assert_eq!(meters[0].measurement_type, "production");
}

#[tokio::test]
async fn test_list_inverters() {
    let (server, client) = targeted().await;

    let inventory = json!([
        { "type": "PCU", "devices": [
            { "part_num": "A", "serial_num": "S1", "producing": true,
              "communicating": true, "phase": "A" }
        ]},
        { "type": "NSRB", "devices": [{ "part_num": "B", "serial_num": "S2" }] },
    ]);

    Mock::given(method("GET"))
        .and(path("/inventory.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&inventory))
        .mount(&server)
        .await;

    let inverters = client.list_inverters().await.unwrap();

    assert_eq!(
        serde_json::to_value(&inverters).unwrap(),
        json!([{
            "partNumber": "A",
            "serialNumber": "S1",
            "producing": true,
            "communicating": true,
            "phase": "A"
        }])
    );
}

#[tokio::test]
async fn test_meter_readings_are_not_cached() {
    let (server, client) = targeted().await;

    let readings = json!([{ "eid": 704643328, "timestamp": 1700000000, "activePower": -1200.5 }]);

    Mock::given(method("GET"))
        .and(path("/ivp/meters/readings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&readings))
        .expect(2)
        .mount(&server)
        .await;

    let first = client.meter_readings().await.unwrap();
    let second = client.meter_readings().await.unwrap();

    assert_eq!(first, readings);
    assert_eq!(second, readings);
    assert_eq!(client.token_provider().calls(), 1);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (server, client) = targeted().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/production"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let result = client.authenticated_get("/api/v1/production").await;

    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Targeting and end-to-end ────────────────────────────────────────

#[tokio::test]
async fn test_retarget_replaces_target_and_token() {
    let (_server, client) = targeted().await;

    client.set_target("envoy-2.local", "999999999999").await.unwrap();

    let state = client.state().await;
    assert_eq!(state.target().unwrap().serial(), "999999999999");
    assert_eq!(state.token().unwrap().expose(), "token-2");
}

#[tokio::test]
async fn test_connect_end_to_end() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    Mock::given(method("POST"))
        .and(path("/tokens"))
        .respond_with(ResponseTemplate::new(200).set_body_string("gateway-token"))
        .expect(1)
        .mount(&server)
        .await;

    let production = json!({
        "wattHoursToday": 21040,
        "wattHoursSevenDays": 151320,
        "wattHoursLifetime": 3012270,
        "wattsNow": 1840
    });

    Mock::given(method("GET"))
        .and(path("/api/v1/production"))
        .and(header("authorization", "Bearer gateway-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&production))
        .expect(1)
        .mount(&server)
        .await;

    let config = config(&server).with_device(Some(server.uri()), Some(SERIAL.into()));
    let client = SessionClient::connect(config).await.unwrap();

    assert!(!client.state().await.token().unwrap().is_empty());
    assert_eq!(client.main_production().await.unwrap(), production);
}

#[tokio::test]
async fn test_connect_with_only_host_skips_targeting() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let config = config(&server).with_device(Some(server.uri()), None);
    let client = SessionClient::connect(config).await.unwrap();

    assert!(matches!(client.state().await, ClientState::Authenticated { .. }));
}
