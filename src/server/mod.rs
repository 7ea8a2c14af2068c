//! HTTP surface for the lookup service
//!
//! Thin by design: two lookup endpoints plus a base resource map. Handlers
//! delegate to the memoized pipeline; errors are classified through
//! [`LookupErrorKind`] and mapped to transport status by one exhaustive
//! table. Internal detail is logged, never leaked in response bodies.

use crate::cache::SingleFlight;
use crate::config::schema::Config;
use crate::error::{LookupErrorKind, SrpmError, SrpmResult};
use crate::pipeline::{CachedSrpm, Pipeline, UpstreamSource};
use axum::{
    extract::{Path as UrlPath, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

/// Shared state threaded through request handling
///
/// The caches are constructed once at process start; no ambient globals.
pub struct AppState {
    pipeline: Pipeline,
    sources: SingleFlight<UpstreamSource>,
    srpms: SingleFlight<CachedSrpm>,
}

impl AppState {
    /// Build the service state with process-local caches
    pub fn new(config: &Config) -> Self {
        Self {
            pipeline: Pipeline::new(config),
            sources: SingleFlight::in_memory(),
            srpms: SingleFlight::in_memory(),
        }
    }
}

/// Construct the service router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(base))
        .route("/sources/{*remote_url}", get(get_source))
        .route("/srpms/{*remote_url}", get(get_srpm))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until ctrl-c
pub async fn serve(config: &Config) -> SrpmResult<()> {
    if let Some(dir) = &config.general.work_dir {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| SrpmError::io(format!("creating work dir {}", dir.display()), e))?;
    }

    let state = Arc::new(AppState::new(config));
    let app = router(state);

    let listener = TcpListener::bind(&config.server.bind)
        .await
        .map_err(|e| SrpmError::Bind {
            addr: config.server.bind.clone(),
            source: e,
        })?;

    info!("Listening on {}", config.server.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| SrpmError::Serve { source: e })
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("Failed to install ctrl-c handler; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn base() -> Json<serde_json::Value> {
    Json(json!({
        "sources": "/sources/<remote_url>",
        "srpms": "/srpms/<remote_url>",
    }))
}

async fn get_source(
    State(state): State<Arc<AppState>>,
    UrlPath(remote_url): UrlPath<String>,
) -> Result<Json<UpstreamSource>, ApiError> {
    let pipeline = state.pipeline.clone();
    let url = remote_url.clone();
    let value = state
        .sources
        .get_or_compute(&remote_url, || async move {
            pipeline.lookup_source(&url).await
        })
        .await?;
    Ok(Json(value))
}

async fn get_srpm(
    State(state): State<Arc<AppState>>,
    UrlPath(remote_url): UrlPath<String>,
) -> Result<Json<CachedSrpm>, ApiError> {
    let pipeline = state.pipeline.clone();
    let url = remote_url.clone();
    let value = state
        .srpms
        .get_or_compute(&remote_url, || async move { pipeline.lookup_srpm(&url).await })
        .await?;
    Ok(Json(value))
}

/// Response wrapper applying the kind-to-status table
struct ApiError(SrpmError);

impl From<SrpmError> for ApiError {
    fn from(err: SrpmError) -> Self {
        Self(err)
    }
}

fn status_for(kind: LookupErrorKind) -> StatusCode {
    match kind {
        LookupErrorKind::RemoteLookupFailure => StatusCode::NOT_FOUND,
        LookupErrorKind::InvalidPackage => StatusCode::BAD_REQUEST,
        LookupErrorKind::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let summary = match kind {
            LookupErrorKind::RemoteLookupFailure => "Unable to access given remote URL",
            LookupErrorKind::InvalidPackage => "Unable to parse referenced SRPM",
            LookupErrorKind::InternalFailure => "Internal error during lookup",
        };

        match kind {
            LookupErrorKind::InternalFailure => error!("Lookup failed: {}", self.0),
            _ => info!("Lookup rejected: {}", self.0),
        }

        let mut details = json!({ "error": summary });
        if let Some(url) = self.0.remote_url() {
            details["remote_url"] = json!(url);
        }

        (status_for(kind), Json(details)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn app() -> Router {
        router(Arc::new(AppState::new(&Config::default())))
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn status_table_is_exhaustive() {
        assert_eq!(
            status_for(LookupErrorKind::RemoteLookupFailure),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(LookupErrorKind::InvalidPackage),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(LookupErrorKind::InternalFailure),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn base_lists_endpoints() {
        let (status, body) = get_json(&app(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sources"], "/sources/<remote_url>");
        assert_eq!(body["srpms"], "/srpms/<remote_url>");
    }

    #[tokio::test]
    async fn unreachable_remote_is_404_envelope() {
        let base = spawn_stub(Router::new()).await;
        let remote = format!("{}/missing.tar.gz", base);

        let (status, body) = get_json(&app(), &format!("/sources/{}", remote)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Unable to access given remote URL");
        assert_eq!(body["remote_url"], remote);
    }

    #[tokio::test]
    async fn unprocessable_srpm_is_400_envelope() {
        // Fetch succeeds, then the (unconfigured) rpm tool fails to start
        let base = spawn_stub(Router::new().route(
            "/pkgs/foo.src.rpm",
            get(|| async { "srpm bytes" }),
        ))
        .await;
        let remote = format!("{}/pkgs/foo.src.rpm", base);

        let mut config = Config::default();
        config.tools.rpm = "/nonexistent/rpm".to_string();
        let app = router(Arc::new(AppState::new(&config)));

        let (status, body) = get_json(&app, &format!("/srpms/{}", remote)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unable to parse referenced SRPM");
        assert_eq!(body["remote_url"], remote);
    }

    #[tokio::test]
    async fn repeated_source_lookup_hits_cache() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let stub = Router::new().route(
            "/files/data.tar.gz",
            get(move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    "contents"
                }
            }),
        );
        let base = spawn_stub(stub).await;
        let remote = format!("{}/files/data.tar.gz", base);

        let app = app();
        let uri = format!("/sources/{}", remote);

        let (status, first) = get_json(&app, &uri).await;
        assert_eq!(status, StatusCode::OK);
        let (status, second) = get_json(&app, &uri).await;
        assert_eq!(status, StatusCode::OK);

        assert_eq!(first, second);
        assert_eq!(first["url"], remote);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
