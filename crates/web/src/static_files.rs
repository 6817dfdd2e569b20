//! Static file serving for the built catalog bundle

use std::path::{Path, PathBuf};

use axum::{http::StatusCode, routing::get, Router};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use storysweep_common::{Error, Result};

/// Path the rule engine script is served under
pub const ENGINE_SCRIPT_PATH: &str = "/axe.min.js";

/// Static file handler for a built Storybook directory
#[derive(Debug, Clone)]
pub struct StaticFiles {
    catalog_dir: PathBuf,
    engine_script: Option<PathBuf>,
}

impl StaticFiles {
    /// Validate the catalog directory. It must contain the explorer's `index.html`.
    pub fn new(catalog_dir: impl Into<PathBuf>) -> Result<Self> {
        let catalog_dir = catalog_dir.into();
        if !catalog_dir.join("index.html").is_file() {
            return Err(Error::InvalidConfig(format!(
                "{} does not look like a built catalog (no index.html)",
                catalog_dir.display()
            )));
        }

        Ok(Self {
            catalog_dir,
            engine_script: None,
        })
    }

    /// Serve the rule engine from a file outside the catalog.
    pub fn with_engine_script(mut self, path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.is_file() {
            return Err(Error::InvalidConfig(format!(
                "engine script {} not found",
                path.display()
            )));
        }
        self.engine_script = Some(path);
        Ok(self)
    }

    pub fn catalog_dir(&self) -> &Path {
        &self.catalog_dir
    }

    /// Build the router: `/health`, the engine script and the catalog itself.
    pub fn router(&self) -> Router {
        let mut router = Router::new().route("/health", get(|| async { (StatusCode::OK, "ok") }));

        if let Some(script) = &self.engine_script {
            router = router.route_service(ENGINE_SCRIPT_PATH, ServeFile::new(script));
        }

        router
            .fallback_service(
                ServeDir::new(&self.catalog_dir).append_index_html_on_directories(true),
            )
            .layer(TraceLayer::new_for_http())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn catalog() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<html>explorer</html>").unwrap();
        std::fs::write(dir.path().join("iframe.html"), "<html>story</html>").unwrap();
        dir
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, String) {
        let resp = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).to_string())
    }

    #[test]
    fn test_rejects_directory_without_index() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(StaticFiles::new(dir.path()), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_missing_engine_script() {
        let dir = catalog();
        let files = StaticFiles::new(dir.path()).unwrap();
        assert!(files.with_engine_script(dir.path().join("nope.js")).is_err());
    }

    #[tokio::test]
    async fn test_serves_catalog_and_health() {
        let dir = catalog();
        let router = StaticFiles::new(dir.path()).unwrap().router();

        let (status, body) = get_body(router.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<html>explorer</html>");

        let (status, body) = get_body(router.clone(), "/iframe.html").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "<html>story</html>");

        let (status, body) = get_body(router.clone(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");

        let (status, _) = get_body(router, "/missing.js").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_serves_external_engine_script() {
        let dir = catalog();
        let engine = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(engine.path(), "window.axe = {};").unwrap();

        let router = StaticFiles::new(dir.path())
            .unwrap()
            .with_engine_script(engine.path())
            .unwrap()
            .router();

        let (status, body) = get_body(router, ENGINE_SCRIPT_PATH).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "window.axe = {};");
    }
}
