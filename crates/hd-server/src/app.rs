//! Router construction.
//!
//! Builds the asset server router with its middleware.

use std::path::Path;

use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::middleware::headers;
use crate::static_files;

/// Create the asset server router for `serve_dir`.
pub(crate) fn create_router(serve_dir: &Path) -> Router {
    static_files::static_router(serve_dir).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(headers::no_store_layer())
            .layer(headers::content_type_options_layer()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_responses_carry_headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let response = create_router(dir.path())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }

    #[tokio::test]
    async fn test_not_found_carries_headers() {
        let dir = tempfile::tempdir().unwrap();

        let response = create_router(dir.path())
            .oneshot(Request::builder().uri("/nope.js").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CACHE_CONTROL], "no-store");
    }
}
