//! Static file serving.
//!
//! Serves the project directory as-is: the HTML page, bundler output, and
//! anything else under the root.

use std::path::Path;

use axum::Router;
use tower_http::services::ServeDir;

/// Create router serving files under `serve_dir`.
///
/// Directory requests resolve to their `index.html`; paths that would leave
/// the directory are not found.
pub(crate) fn static_router(serve_dir: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(serve_dir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn get(dir: &Path, uri: &str) -> Response {
        static_router(dir)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn content_type(response: &Response) -> &str {
        response.headers()[header::CONTENT_TYPE].to_str().unwrap()
    }

    #[tokio::test]
    async fn test_root_serves_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();

        let response = get(dir.path(), "/").await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(content_type(&response).starts_with("text/html"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"<html></html>");
    }

    #[tokio::test]
    async fn test_mime_types_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let dist = dir.path().join("dist");
        std::fs::create_dir_all(&dist).unwrap();
        std::fs::write(dist.join("main.js"), "export {};").unwrap();
        std::fs::write(dist.join("styles.css"), "body {}").unwrap();

        let js = get(dir.path(), "/dist/main.js").await;
        let css = get(dir.path(), "/dist/styles.css").await;

        assert_eq!(js.status(), StatusCode::OK);
        assert!(content_type(&js).contains("javascript"));
        assert!(content_type(&css).starts_with("text/css"));
    }

    #[tokio::test]
    async fn test_percent_encoded_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("my file.css"), "body {}").unwrap();

        let response = get(dir.path(), "/my%20file.css").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"body {}");
    }

    #[tokio::test]
    async fn test_directory_serves_its_index() {
        let dir = tempfile::tempdir().unwrap();
        let demo = dir.path().join("demo");
        std::fs::create_dir_all(&demo).unwrap();
        std::fs::write(demo.join("index.html"), "<p>demo</p>").unwrap();

        let with_slash = get(dir.path(), "/demo/").await;
        assert_eq!(with_slash.status(), StatusCode::OK);

        // Without the slash the browser is sent to the directory URL so
        // relative links inside the page resolve.
        let without_slash = get(dir.path(), "/demo").await;
        assert!(without_slash.status().is_redirection());
        assert_eq!(without_slash.headers()[header::LOCATION], "/demo/");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let response = get(dir.path(), "/dist/missing.js").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_traversal_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("site");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(dir.path().join("secret.txt"), "hidden").unwrap();

        let plain = get(&root, "/../secret.txt").await;
        let encoded = get(&root, "/%2e%2e/secret.txt").await;

        assert_eq!(plain.status(), StatusCode::NOT_FOUND);
        assert_eq!(encoded.status(), StatusCode::NOT_FOUND);
    }
}
