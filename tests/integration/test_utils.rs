//! Shared fixtures for the integration tests.

use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ostatic::{
    create_backend_router, create_token_router, BackendAuthorizer, BackendConfig, Claims,
    RouterConfig, StaticFiles, TokenCodec, TokenIssuer,
};

pub const TEST_SECRET: &str = "test-secret-key-for-token-signing";

/// Credential the mock backend accepts.
pub const GOOD_CREDENTIAL: &str = "Bearer good-credential";

pub const HELLO_BODY: &[u8] = b"hello world";

/// Served directory with a few files.
///
/// ```text
/// hello.txt
/// nested/data.json
/// ```
pub fn served_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), HELLO_BODY).unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();
    std::fs::write(dir.path().join("nested").join("data.json"), b"{\"ok\":true}").unwrap();
    dir
}

pub fn codec() -> TokenCodec {
    TokenCodec::new(TEST_SECRET, jsonwebtoken::Algorithm::HS256).unwrap()
}

/// Token valid for two minutes.
pub fn valid_token() -> String {
    codec()
        .encode(&Claims::expiring_in("tester", Duration::from_secs(120)))
        .unwrap()
}

pub fn router_config() -> RouterConfig {
    RouterConfig::new("/static").with_tracing(false)
}

/// Token-mode router without an issuer.
pub fn token_router(root: &Path) -> Router {
    create_token_router(StaticFiles::new(root), codec(), None, router_config())
}

/// Token-mode router whose issuer asks `backend`.
pub fn issuing_router(root: &Path, backend: BackendAuthorizer, lifetime: Duration) -> Router {
    let issuer = TokenIssuer::new(backend, codec())
        .with_lifetime(lifetime)
        .with_subject("tester");
    create_token_router(StaticFiles::new(root), codec(), Some(issuer), router_config())
}

/// Backend-mode router.
pub fn backend_router(root: &Path, backend: BackendAuthorizer) -> Router {
    create_backend_router(StaticFiles::new(root), backend, router_config())
}

/// Mock backend answering 200 to [`GOOD_CREDENTIAL`] on `/auth`.
///
/// Anything else gets wiremock's default 404.
pub async fn mock_backend() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth"))
        .and(header("authorization", GOOD_CREDENTIAL))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

pub fn backend_config(server: &MockServer) -> BackendConfig {
    BackendConfig::parse(&format!("{}/auth", server.uri()))
        .unwrap()
        .with_timeout(Duration::from_secs(2))
}

pub fn authorizer(config: BackendConfig) -> BackendAuthorizer {
    BackendAuthorizer::new(config).unwrap()
}

pub fn get(uri: impl AsRef<str>) -> Request<Body> {
    Request::builder()
        .uri(uri.as_ref())
        .body(Body::empty())
        .unwrap()
}

pub fn get_with_header(uri: impl AsRef<str>, name: &str, value: &str) -> Request<Body> {
    Request::builder()
        .uri(uri.as_ref())
        .header(name, value)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
