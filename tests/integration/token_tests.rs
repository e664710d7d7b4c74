//! Signed token integration tests.
//!
//! Tests verify:
//! - Valid tokens grant access
//! - Expired, forged and subject-less tokens are rejected
//! - `GET /token` issues usable tokens only for backend-approved callers
//! - Issued tokens stop working after their lifetime

use std::time::Duration;

use axum::http::{Method, Request, StatusCode};
use axum::body::Body;
use jsonwebtoken::{get_current_timestamp, Algorithm};
use tower::ServiceExt;

use ostatic::{Claims, TokenCodec};

use super::test_utils::{
    authorizer, backend_config, body_bytes, body_json, codec, get, get_with_header,
    issuing_router, mock_backend, served_dir, token_router, valid_token, GOOD_CREDENTIAL,
    HELLO_BODY,
};

// =============================================================================
// Static Access With Tokens
// =============================================================================

#[tokio::test]
async fn test_valid_token_serves_file() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let response = router
        .oneshot(get(format!("/static/hello.txt?token={}", valid_token())))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, HELLO_BODY);
}

#[tokio::test]
async fn test_missing_token_rejected() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let response = router.oneshot(get("/static/hello.txt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let error = body_json(response).await;
    assert_eq!(error["error"], "unauthorized");
    assert_eq!(error["message"], "Unauthorized");
}

#[tokio::test]
async fn test_empty_token_rejected() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let response = router.oneshot(get("/static/hello.txt?token=")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let token = codec()
        .encode(&Claims::new("tester", get_current_timestamp() - 1))
        .unwrap();

    let response = router
        .oneshot(get(format!("/static/hello.txt?token={}", token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_secret_rejected() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let forged = TokenCodec::new("some-other-secret", Algorithm::HS256)
        .unwrap()
        .encode(&Claims::expiring_in("tester", Duration::from_secs(120)))
        .unwrap();

    let response = router
        .oneshot(get(format!("/static/hello.txt?token={}", forged)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_without_subject_rejected() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let token = codec()
        .encode(&Claims {
            sub: None,
            exp: get_current_timestamp() + 120,
        })
        .unwrap();

    let response = router
        .oneshot(get(format!("/static/hello.txt?token={}", token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_in_header_is_not_enough() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let response = router
        .oneshot(get_with_header(
            "/static/hello.txt",
            "authorization",
            &format!("Bearer {}", valid_token()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unauthorized_even_for_missing_file() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let response = router.oneshot(get("/static/missing.txt")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_head_request_with_token() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let request = Request::builder()
        .method(Method::HEAD)
        .uri(format!("/static/hello.txt?token={}", valid_token()))
        .body(Body::empty())
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-length"], "11");
    assert!(body_bytes(response).await.is_empty());
}

// =============================================================================
// Token Issuance
// =============================================================================

#[tokio::test]
async fn test_token_endpoint_absent_without_issuer() {
    let dir = served_dir();
    let router = token_router(dir.path());

    let response = router.oneshot(get("/token")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_issue_token_and_use_it() {
    let dir = served_dir();
    let server = mock_backend().await;
    let router = issuing_router(
        dir.path(),
        authorizer(backend_config(&server)),
        Duration::from_secs(120),
    );

    let response = router
        .clone()
        .oneshot(get_with_header("/token", "authorization", GOOD_CREDENTIAL))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    let token = body["access_token"].as_str().unwrap().to_string();

    let claims = codec().decode(&token).unwrap();
    assert_eq!(claims.sub.as_deref(), Some("tester"));

    let response = router
        .oneshot(get(format!("/static/hello.txt?token={}", token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, HELLO_BODY);
}

#[tokio::test]
async fn test_issue_token_requires_header() {
    let dir = served_dir();
    let server = mock_backend().await;
    let router = issuing_router(
        dir.path(),
        authorizer(backend_config(&server)),
        Duration::from_secs(120),
    );

    let response = router.oneshot(get("/token")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // The backend is never consulted without a credential
    let received = server.received_requests().await.unwrap();
    assert!(received.is_empty());
}

#[tokio::test]
async fn test_issue_token_backend_rejects() {
    let dir = served_dir();
    let server = mock_backend().await;
    let router = issuing_router(
        dir.path(),
        authorizer(backend_config(&server)),
        Duration::from_secs(120),
    );

    let response = router
        .oneshot(get_with_header("/token", "authorization", "Bearer wrong"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let error = body_json(response).await;
    assert_eq!(error["error"], "unauthorized");
    assert!(error.get("access_token").is_none());
}

#[tokio::test]
async fn test_issued_token_expires() {
    let dir = served_dir();
    let server = mock_backend().await;
    let router = issuing_router(
        dir.path(),
        authorizer(backend_config(&server)),
        Duration::from_secs(1),
    );

    let response = router
        .clone()
        .oneshot(get_with_header("/token", "authorization", GOOD_CREDENTIAL))
        .await
        .unwrap();
    let token = body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/static/hello.txt?token={}", token);

    let response = router.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // exp has second precision; wait until it is strictly in the past
    tokio::time::sleep(Duration::from_millis(2100)).await;

    let response = router.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
