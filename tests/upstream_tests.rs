use axum::http::StatusCode;
use printshelf_web::{
    AppConfig, HttpUpstream,
    loaders::ResourceLoader,
    upstream::{FetchError, Upstream, UpstreamRequest},
};
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn client_for(base_url: String) -> HttpUpstream {
    let config = AppConfig {
        upstream_url: base_url,
        upstream_timeout_secs: Some(5),
        ..AppConfig::default()
    };
    HttpUpstream::new(&config).unwrap()
}

#[tokio::test]
async fn test_forwards_query_and_session_cookie() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/model/list"))
        .and(query_param("page", "2"))
        .and(header("cookie", "authorization_key=tok.en.sig"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let upstream = client_for(mock_server.uri());
    let response = upstream
        .send(
            UpstreamRequest::get("/api/v1/model/list")
                .query("page", 2)
                .session(Some("tok.en.sig".to_string())),
        )
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "[]");
}

#[tokio::test]
async fn test_error_body_is_returned_verbatim() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/model"))
        .respond_with(ResponseTemplate::new(403).set_body_string("model is private"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let upstream = client_for(format!("{}/", mock_server.uri()));
    let result = ResourceLoader::new(&upstream)
        .load::<serde_json::Value>(UpstreamRequest::get("/api/v1/model").query("id", "m1"))
        .await;

    match result {
        Err(FetchError::Status { status, body }) => {
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert_eq!(body, "model is private");
        }
        other => panic!("expected a status failure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_upstream_is_a_transport_error() {
    // Nothing listens on port 9 in the test environment.
    let upstream = client_for("http://127.0.0.1:9".to_string());

    let result = upstream.send(UpstreamRequest::get("/api/v1/model")).await;

    assert!(matches!(result, Err(FetchError::Transport(_))));
}
