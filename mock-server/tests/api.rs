use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, EchoedRequest};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_reports_method_path_and_query() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/v1/items?page=2")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echoed: EchoedRequest = body_json(resp).await;
    assert_eq!(echoed.method, "GET");
    assert_eq!(echoed.path, "/v1/items");
    assert_eq!(echoed.query.as_deref(), Some("page=2"));
    assert!(echoed.body.is_empty());
}

#[tokio::test]
async fn echo_reports_body_and_headers() {
    let resp = app()
        .oneshot(json_request("POST", "/v1/items", r#"{"name":"x"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echoed: EchoedRequest = body_json(resp).await;
    assert_eq!(echoed.method, "POST");
    assert_eq!(echoed.body, r#"{"name":"x"}"#);
    assert_eq!(echoed.headers["content-type"], "application/json");
}

#[tokio::test]
async fn echo_accepts_any_method() {
    for method in ["PUT", "DELETE", "PATCH"] {
        let resp = app()
            .oneshot(json_request(method, "/anything", ""))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let echoed: EchoedRequest = body_json(resp).await;
        assert_eq!(echoed.method, method);
    }
}

// --- status ---

#[tokio::test]
async fn status_route_returns_requested_code() {
    let resp = app()
        .oneshot(json_request("POST", "/status/404", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn status_route_no_content_has_empty_body() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/status/204")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn status_route_rejects_out_of_range_code() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/status/42")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_route_rejects_non_numeric_code() {
    let resp = app()
        .oneshot(
            Request::builder()
                .uri("/status/teapot")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- redirect ---

#[tokio::test]
async fn redirect_route_sets_location() {
    let resp = app()
        .oneshot(json_request("POST", "/redirect/307", "{}"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers()[http::header::LOCATION], "/redirected");
}

#[tokio::test]
async fn redirect_route_rejects_non_redirect_code() {
    let resp = app()
        .oneshot(json_request("GET", "/redirect/200", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_route_has_no_location() {
    let resp = app()
        .oneshot(json_request("GET", "/status/302", ""))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert!(resp.headers().get(http::header::LOCATION).is_none());
}
