use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use etude_core::prelude::*;
use tower::ServiceExt;

fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register(Resolver::new("ping", |_ctx: RequestContext| async {
            Ok::<_, ResolverError>("pong")
        }))
        .unwrap();
    registry
        .register(require_identity("admin").wrap(Resolver::new(
            "audit",
            |ctx: RequestContext| async move { Ok::<_, ResolverError>(ctx.into_body()) },
        )))
        .unwrap();
    registry
}

fn production() -> Config {
    Config {
        environment: "production".to_string(),
        ..Config::default()
    }
}

async fn send(app: &App, request: Request<Body>) -> (StatusCode, String) {
    let res = app.router().oneshot(request).await.unwrap();
    let status = res.status();
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_router_serves_resolvers() {
    let app = App::with_registry(production(), registry());
    let (status, body) = send(&app, post("/api/ping", "{}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#""pong""#);
}

#[tokio::test]
async fn test_router_gate_uses_authorization_header() {
    let app = App::with_registry(production(), registry());

    let (status, body) = send(&app, post("/api/audit", r#"{"a":1}"#)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Unauthenticated");

    let mut request = post("/api/audit", r#"{"a":1}"#);
    request
        .headers_mut()
        .insert(header::AUTHORIZATION, "admin".parse().unwrap());
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"a":1}"#);
}

#[tokio::test]
async fn test_nothing_outside_the_prefix() {
    let app = App::with_registry(production(), registry());
    let (status, _) = send(&app, post("/ping", "{}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, post("/api/", "{}")).await;
    assert_ne!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_dev_mode_sets_request_id() {
    let app = App::with_registry(Config::default(), registry());
    let res = app.router().oneshot(post("/api/ping", "{}")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_error_bodies_are_plain_text() {
    let app = App::with_registry(production(), registry());
    let res = app.router().oneshot(post("/api/missing", "{}")).await.unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; charset=utf-8"
    );
}

#[tokio::test]
async fn test_dev_mode_keeps_incoming_request_id() {
    let app = App::with_registry(Config::default(), registry());
    let mut request = post("/api/ping", "{}");
    request
        .headers_mut()
        .insert("x-request-id", "trace-42".parse().unwrap());

    let res = app.router().oneshot(request).await.unwrap();
    assert_eq!(res.headers().get("x-request-id").unwrap(), "trace-42");
}
