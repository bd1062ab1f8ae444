//! Landing page router.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use lightning_vj::server::build_router;

#[tokio::test]
async fn root_serves_landing_page() {
    let response = build_router()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap();
    assert!(content_type.starts_with("text/html"));
}

#[tokio::test]
async fn other_paths_are_not_found() {
    for path in ["/index.html", "/api/status", "/favicon.ico"] {
        let response = build_router()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", path);
    }
}
