use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use printshelf_web::{AppConfig, AppState, MockUpstream, SessionContext, create_router};
use serde_json::json;
use std::sync::Arc;
use tower::util::ServiceExt;

fn mint(payload: serde_json::Value) -> String {
    let key = EncodingKey::from_secret(b"issuer-secret");
    encode(&Header::default(), &payload, &key).unwrap()
}

fn app() -> axum::Router {
    create_router(AppState::new(
        AppConfig::default(),
        Arc::new(MockUpstream::new()),
    ))
}

async fn get_session(cookie: Option<String>) -> (StatusCode, String) {
    let mut request = Request::builder().uri("/session");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    let response = app()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body_bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn test_no_cookie_is_anonymous() {
    let (status, body) = get_session(None).await;

    assert_eq!(status, StatusCode::OK);
    let context: SessionContext = serde_json::from_str(&body).unwrap();
    assert!(!context.is_authenticated());
    assert_eq!(body, r#"{"user":null}"#);
}

#[tokio::test]
async fn test_private_key_is_stripped_from_session() {
    let token = mint(json!({
        "sub": "user-1",
        "email": "maker@example.com",
        "username": "maker",
        "display_name": "The Maker",
        "profile_id": "profile-1",
        "server_id": "srv",
        "private_key": "c2VjcmV0",
        "iat": 1_700_000_000,
        "exp": 1_700_003_600,
    }));

    let (status, body) = get_session(Some(format!("authorization_key={token}"))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("private_key"));
    assert!(!body.contains("c2VjcmV0"));

    let context: SessionContext = serde_json::from_str(&body).unwrap();
    let user = context.user.unwrap();
    assert_eq!(user.subject, "user-1");
    assert_eq!(user.expires_at, 1_700_003_600);
}

#[tokio::test]
async fn test_undecodable_cookie_degrades_to_anonymous() {
    let (status, body) = get_session(Some("authorization_key=%%%.garbage.".to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"user":null}"#);
}

#[tokio::test]
async fn test_session_exposes_incomplete_claims() {
    // The session context mirrors what the token says; completeness is the gate's concern.
    let token = mint(json!({ "sub": "user-2", "username": "nomail" }));

    let (_, body) = get_session(Some(format!("authorization_key={token}"))).await;

    let context: SessionContext = serde_json::from_str(&body).unwrap();
    let user = context.user.unwrap();
    assert_eq!(user.subject, "user-2");
    assert!(!user.is_complete());
}

#[tokio::test]
async fn test_signed_mode_ignores_unsigned_session() {
    let mut config = AppConfig::default();
    config.jwt_secret = Some("the-real-secret".to_string());
    let app = create_router(AppState::new(config, Arc::new(MockUpstream::new())));

    let token = mint(json!({ "sub": "user-3", "exp": 4_102_444_800_i64 }));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/session")
                .header(header::COOKIE, format!("authorization_key={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body_bytes[..], br#"{"user":null}"#);
}
