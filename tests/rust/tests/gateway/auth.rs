//! Bearer authentication on `/mcp`

use super::{post_jsonrpc, session_id_of, INITIALIZE_BODY};
use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use tests::{bearer_token, caller_payload, http_client, TestGateway};
use vacation_core::SigningSecret;
use vacation_gateway::GatewayConfig;

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_authorization_is_401() {
    let gateway = TestGateway::start(GatewayConfig::default()).await;

    let url = gateway.mcp_url();
    let response = post_jsonrpc(&http_client(None), &url, None, INITIALIZE_BODY).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("www-authenticate"));
    assert_eq!(
        response.text().await.unwrap(),
        "Unauthorized: missing token or invalid format"
    );
    assert!(gateway.sessions.is_empty());

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_scheme_is_401() {
    let gateway = TestGateway::start(GatewayConfig::default()).await;

    let response = reqwest::Client::new()
        .post(gateway.mcp_url())
        .header("authorization", "Basic dXNlcjpwYXNz")
        .header("content-type", "application/json")
        .body(INITIALIZE_BODY)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.text().await.unwrap(),
        "Unauthorized: missing token or invalid format"
    );

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_undecodable_token_is_401_with_reason() {
    let gateway = TestGateway::start(GatewayConfig::default()).await;

    let response = post_jsonrpc(
        &http_client(Some("definitely-not-a-jwt")),
        &gateway.mcp_url(),
        None,
        INITIALIZE_BODY,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = response.text().await.unwrap();
    assert!(body.starts_with("Unauthorized: "), "body: {}", body);
    assert_ne!(body, "Unauthorized: missing token or invalid format");

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_valid_token_initializes_session() {
    let gateway = TestGateway::start(GatewayConfig::default()).await;
    let token = bearer_token(&caller_payload("vault-1", "user-1", "http://unused"));

    let response =
        post_jsonrpc(&http_client(Some(&token)), &gateway.mcp_url(), None, INITIALIZE_BODY).await;
    assert_eq!(response.status(), StatusCode::OK);

    let session_id = session_id_of(&response).expect("session id header");
    assert!(gateway.sessions.contains(&session_id));

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_signature_verification_when_secret_configured() {
    let gateway = TestGateway::start(GatewayConfig {
        signing_secret: Some(SigningSecret::new("server-only-secret")),
        ..GatewayConfig::default()
    })
    .await;

    // Fixture tokens are signed with a different secret
    let foreign = bearer_token(&caller_payload("vault-1", "user-1", "http://unused"));
    let response =
        post_jsonrpc(&http_client(Some(&foreign)), &gateway.mcp_url(), None, INITIALIZE_BODY).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let genuine = vacation_core::issue_token(
        &caller_payload("vault-1", "user-1", "http://unused"),
        &SigningSecret::new("server-only-secret"),
    )
    .unwrap();
    let response =
        post_jsonrpc(&http_client(Some(&genuine)), &gateway.mcp_url(), None, INITIALIZE_BODY).await;
    assert_eq!(response.status(), StatusCode::OK);

    gateway.stop().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_test_endpoint_needs_no_token() {
    let gateway = TestGateway::start(GatewayConfig::default()).await;

    let response =
        post_jsonrpc(&http_client(None), &gateway.mcp_test_url(), None, INITIALIZE_BODY).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(session_id_of(&response).is_some());

    gateway.stop().await;
}
