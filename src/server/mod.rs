//! HTTP surface of the ping service
//!
//! `/ping` and `/api/ping` answer with the configured region id,
//! `/api/endpoints` serves the cached endpoint directory as JSON, and
//! everything else falls through to static files under the static root.

use crate::{
    directory::{CacheStatus, DirectoryCache, DirectorySource, RemoteDirectory, StaticDirectory},
    error::{AppError, Result},
    logging::Logger,
    models::ServerConfig,
};
use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower_http::services::ServeDir;

const HSTS_VALUE: &str = "max-age=3600; includeSubdomains; preload";
const FIRST_REQUEST_HEADER: &str = "x-first-request";

/// Shared state handed to every handler
pub struct ServerState {
    region: String,
    cache: Arc<DirectoryCache>,
    first_request: AtomicBool,
    logger: Arc<Logger>,
}

impl ServerState {
    pub fn new(region: impl Into<String>, cache: Arc<DirectoryCache>, logger: Arc<Logger>) -> Self {
        Self {
            region: region.into(),
            cache,
            first_request: AtomicBool::new(true),
            logger,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn cache(&self) -> &DirectoryCache {
        &self.cache
    }
}

/// Build the service router
pub fn router(state: Arc<ServerState>, static_root: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/ping", get(ping))
        .route("/api/endpoints", get(endpoints))
        .fallback_service(ServeDir::new(static_root.as_ref()))
        .with_state(state)
}

/// Wire up the directory source, cache and router from `config`, then
/// serve until the listener fails
pub async fn serve(config: ServerConfig) -> Result<()> {
    let logger = Arc::new(Logger::for_server(&config));
    logger.add_context_field("region", &config.region).await;

    let source: Arc<dyn DirectorySource> = match &config.endpoints_url {
        Some(url) => Arc::new(RemoteDirectory::new(url, config.refresh_timeout)?),
        None => Arc::new(StaticDirectory::builtin()),
    };
    let cache = Arc::new(DirectoryCache::new(
        source,
        config.cache_ttl,
        config.refresh_timeout,
        logger.clone(),
    ));

    // A failed warm-up is not fatal, the first request retries
    if let Err(error) = cache.refresh().await {
        logger.warn("Initial directory fetch failed")
            .error_info(&error)
            .log()
            .await;
    }

    let state = Arc::new(ServerState::new(config.region.clone(), cache, logger.clone()));
    let app = router(state, &config.static_root);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|e| AppError::io(format!("Failed to bind {}: {}", address, e)))?;

    logger.info("Listening")
        .field("address", address.to_string())
        .field("static_root", config.static_root.display().to_string())
        .log()
        .await;

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::io(format!("Server error: {}", e)))
}

async fn ping(State(state): State<Arc<ServerState>>) -> Response {
    let first = state.first_request.swap(false, Ordering::AcqRel);

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{}\n", state.region()),
    )
        .into_response();

    set_common_headers(response.headers_mut());
    if first {
        response.headers_mut().insert(
            HeaderName::from_static(FIRST_REQUEST_HEADER),
            HeaderValue::from_static("true"),
        );
    }
    response
}

async fn endpoints(State(state): State<Arc<ServerState>>) -> Response {
    let mut response = match state.cache.get().await {
        Ok(directory) => match serde_json::to_vec(&*directory) {
            Ok(body) => {
                if state.cache.status() == CacheStatus::ExpiredFallback {
                    state.logger.debug("Serving stale endpoint directory")
                        .field("regions", directory.len())
                        .log()
                        .await;
                }
                (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], body).into_response()
            }
            Err(e) => internal_error(&state, &AppError::from(e)).await,
        },
        Err(error) => internal_error(&state, &error).await,
    };

    set_common_headers(response.headers_mut());
    response
}

async fn internal_error(state: &ServerState, error: &AppError) -> Response {
    state.logger.error("Failed to serve endpoint directory")
        .error_info(error)
        .log()
        .await;
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{}\n", error),
    )
        .into_response()
}

fn set_common_headers(headers: &mut HeaderMap) {
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(header::STRICT_TRANSPORT_SECURITY, HeaderValue::from_static(HSTS_VALUE));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use crate::models::{EndpointDescriptor, EndpointDirectory};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::time::Duration;
    use tower::ServiceExt;

    /// Succeeds while `healthy` is set
    struct SwitchableSource {
        healthy: AtomicBool,
    }

    #[async_trait]
    impl DirectorySource for SwitchableSource {
        async fn fetch(&self) -> Result<EndpointDirectory> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(EndpointDirectory::from_iter([
                    EndpointDescriptor::new("us-east1", "https://us-east1.example", "South Carolina"),
                ]))
            } else {
                Err(AppError::directory_fetch("source is down"))
            }
        }

        fn describe(&self) -> String {
            "switchable".to_string()
        }
    }

    fn state_with(source: Arc<dyn DirectorySource>) -> Arc<ServerState> {
        let logger = Arc::new(Logger::with_level("server-test", LogLevel::Fatal));
        let cache = Arc::new(DirectoryCache::new(
            source,
            Duration::from_secs(300),
            Duration::from_secs(1),
            logger.clone(),
        ));
        Arc::new(ServerState::new("us-east1", cache, logger))
    }

    fn builtin_state() -> Arc<ServerState> {
        state_with(Arc::new(StaticDirectory::builtin()))
    }

    async fn get_path(app: &Router, path: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_common_headers(response: &Response) {
        let headers = response.headers();
        assert_eq!(headers[header::CACHE_CONTROL], "no-store");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(headers[header::STRICT_TRANSPORT_SECURITY], HSTS_VALUE);
    }

    #[tokio::test]
    async fn test_ping_returns_region() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(builtin_state(), dir.path());

        for path in ["/ping", "/api/ping"] {
            let response = get_path(&app, path).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_common_headers(&response);
            assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
            assert_eq!(body_string(response).await, "us-east1\n");
        }
    }

    #[tokio::test]
    async fn test_first_request_header_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(builtin_state(), dir.path());

        let first = get_path(&app, "/ping").await;
        assert_eq!(first.headers()[FIRST_REQUEST_HEADER], "true");

        let second = get_path(&app, "/api/ping").await;
        assert!(second.headers().get(FIRST_REQUEST_HEADER).is_none());
        let third = get_path(&app, "/ping").await;
        assert!(third.headers().get(FIRST_REQUEST_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_endpoints_serves_directory_json() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(builtin_state(), dir.path());

        let response = get_path(&app, "/api/endpoints").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_common_headers(&response);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");

        let decoded: EndpointDirectory = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(decoded.len(), crate::directory::builtin().len());
        assert!(decoded.contains("global"));
    }

    #[tokio::test]
    async fn test_endpoints_serves_stale_when_source_fails() {
        let source = Arc::new(SwitchableSource { healthy: AtomicBool::new(true) });
        let state = state_with(source.clone());
        let dir = tempfile::tempdir().unwrap();
        let app = router(state.clone(), dir.path());

        assert_eq!(get_path(&app, "/api/endpoints").await.status(), StatusCode::OK);

        source.healthy.store(false, Ordering::SeqCst);
        state.cache().expire();

        let response = get_path(&app, "/api/endpoints").await;
        assert_eq!(response.status(), StatusCode::OK);
        let decoded: EndpointDirectory = serde_json::from_str(&body_string(response).await).unwrap();
        assert!(decoded.contains("us-east1"));
        assert_eq!(state.cache().status(), CacheStatus::ExpiredFallback);
    }

    #[tokio::test]
    async fn test_endpoints_cold_failure_is_500() {
        let source = Arc::new(SwitchableSource { healthy: AtomicBool::new(false) });
        let dir = tempfile::tempdir().unwrap();
        let app = router(state_with(source), dir.path());

        let response = get_path(&app, "/api/endpoints").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_common_headers(&response);
    }

    #[tokio::test]
    async fn test_static_files_fallback() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>regions</h1>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        let app = router(builtin_state(), dir.path());

        let index = get_path(&app, "/").await;
        assert_eq!(index.status(), StatusCode::OK);
        assert_eq!(body_string(index).await, "<h1>regions</h1>");

        let script = get_path(&app, "/app.js").await;
        assert_eq!(script.status(), StatusCode::OK);

        let missing = get_path(&app, "/nope.html").await;
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    }
}
