//! CORS integration tests.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use tower::ServiceExt;

use ostatic::{create_token_router, StaticFiles};

use super::test_utils::{codec, get, get_with_header, router_config, served_dir, token_router, valid_token};

const ORIGIN: &str = "https://app.example.com";

fn cors_router(root: &std::path::Path) -> axum::Router {
    create_token_router(
        StaticFiles::new(root),
        codec(),
        None,
        router_config().with_cors_allow_origin(ORIGIN),
    )
}

#[tokio::test]
async fn test_configured_origin_is_allowed() {
    let dir = served_dir();
    let router = cors_router(dir.path());

    let response = router
        .oneshot(get_with_header(
            format!("/static/hello.txt?token={}", valid_token()),
            "origin",
            ORIGIN,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], ORIGIN);
    assert_eq!(headers["access-control-allow-credentials"], "true");
}

#[tokio::test]
async fn test_other_origin_gets_no_grant() {
    let dir = served_dir();
    let router = cors_router(dir.path());

    let response = router
        .oneshot(get_with_header("/health", "origin", "https://evil.example.com"))
        .await
        .unwrap();

    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_preflight_mirrors_request() {
    let dir = served_dir();
    let router = cors_router(dir.path());

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/static/hello.txt")
        .header("origin", ORIGIN)
        .header("access-control-request-method", "GET")
        .header("access-control-request-headers", "authorization,x-custom")
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();

    // Preflights are answered by the CORS layer, before the auth gate
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["access-control-allow-origin"], ORIGIN);
    assert_eq!(headers["access-control-allow-methods"], "GET");
    assert_eq!(
        headers["access-control-allow-headers"],
        "authorization,x-custom"
    );
    assert_eq!(headers["access-control-allow-credentials"], "true");
}

#[tokio::test]
async fn test_no_cors_headers_when_unconfigured() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let response = router
        .oneshot(get_with_header("/health", "origin", ORIGIN))
        .await
        .unwrap();

    assert!(!response
        .headers()
        .contains_key("access-control-allow-origin"));

    let dir = served_dir();
    let response = token_router(dir.path()).oneshot(get("/health")).await.unwrap();
    assert!(!response
        .headers()
        .contains_key("access-control-allow-credentials"));
}
