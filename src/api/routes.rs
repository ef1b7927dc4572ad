//! HTTP server setup and shared state.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    middleware,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::docs;
use super::tasks as tasks_api;
use crate::config::Config;
use crate::observe::metrics::CONTENT_TYPE as METRICS_CONTENT_TYPE;
use crate::observe::{
    inject_faults, observe_requests, FaultInjector, LogObserver, MetricsObserver, ObserverChain,
    RequestObserver, TaskMetrics,
};
use crate::store::{Database, SqliteTaskStore, TaskStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Task persistence
    pub store: Arc<dyn TaskStore>,
    /// Prometheus registry for this instance
    pub metrics: Arc<TaskMetrics>,
    /// Observers notified around every request
    pub observers: ObserverChain,
    /// Present only when fault injection is enabled
    pub faults: Option<Arc<FaultInjector>>,
    /// Parsed API description
    pub openapi: Arc<serde_json::Value>,
}

impl AppState {
    /// Build the state around a store, with logging and metrics observers.
    ///
    /// Fault injection follows `config.faults`.
    pub fn new(config: Config, store: Arc<dyn TaskStore>) -> anyhow::Result<Self> {
        let openapi = docs::load_openapi(config.openapi_path.as_deref())?;
        let metrics = Arc::new(TaskMetrics::new());

        let observers: Vec<Arc<dyn RequestObserver>> = vec![
            Arc::new(LogObserver),
            Arc::new(MetricsObserver::new(Arc::clone(&store), Arc::clone(&metrics))),
        ];

        let faults = FaultInjector::from_config(&config.faults).map(Arc::new);

        Ok(Self {
            config,
            store,
            metrics,
            observers: ObserverChain::new(observers),
            faults,
            openapi: Arc::new(openapi),
        })
    }

    /// Replace the fault injector.
    pub fn with_faults(mut self, injector: FaultInjector) -> Self {
        self.faults = Some(Arc::new(injector));
        self
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/openapi.yaml", get(docs::openapi_document))
        .route("/openapi.json", get(docs::openapi_json_disabled))
        .route("/docs", get(docs::swagger_ui))
        .nest("/tasks", tasks_api::routes());

    // Faults sit inside the observers so injected delays and errors are
    // logged and counted like real ones.
    if let Some(injector) = &state.faults {
        app = app.layer(middleware::from_fn_with_state(
            Arc::clone(injector),
            inject_faults,
        ));
    }

    app.layer(middleware::from_fn_with_state(
        state.observers.clone(),
        observe_requests,
    ))
    .layer(CorsLayer::permissive())
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database_path)?;
    tracing::info!(path = %db.path().display(), "Task store ready");
    let store: Arc<dyn TaskStore> = Arc::new(SqliteTaskStore::new(db));

    let state = AppState::new(config, store)?;
    if let Some(faults) = &state.faults {
        tracing::warn!(
            max_delay_ms = faults.max_delay_ms(),
            list_failure_rate = faults.list_failure_rate(),
            "Fault injection enabled"
        );
    }

    let addr = state.config.bind_addr();
    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Health check endpoint.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Prometheus exposition endpoint.
async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn app() -> Router {
        let store = Arc::new(SqliteTaskStore::new(Database::in_memory().unwrap()));
        router(Arc::new(AppState::new(Config::default(), store).unwrap()))
    }

    async fn get_body(uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app().oneshot(req).await.unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        (status, content_type, body.to_vec())
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let (status, _, body) = get_body("/health").await;
        assert_eq!(status, StatusCode::OK);

        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["status"], "ok");
        assert_eq!(parsed["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn metrics_endpoint_is_prometheus_text() {
        let (status, content_type, body) = get_body("/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some(METRICS_CONTENT_TYPE));

        let text = String::from_utf8(body).unwrap();
        assert!(text.contains("total_task"));
        assert!(text.contains("task_statuses_active"));
        assert!(text.contains("task_statuses_completed"));
    }

    #[tokio::test]
    async fn openapi_yaml_served_as_json() {
        let (status, _, body) = get_body("/openapi.yaml").await;
        assert_eq!(status, StatusCode::OK);

        let doc: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(doc["info"]["title"], "Task Manager API");
    }

    #[tokio::test]
    async fn openapi_json_is_disabled() {
        let (status, _, body) = get_body("/openapi.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed["detail"], "JSON OpenAPI specification is not available");
    }

    #[tokio::test]
    async fn docs_page_points_at_document() {
        let (status, content_type, body) = get_body("/docs").await;
        assert_eq!(status, StatusCode::OK);
        assert!(content_type.unwrap().starts_with("text/html"));
        assert!(String::from_utf8(body).unwrap().contains("/openapi.yaml"));
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let (status, _, _) = get_body("/nonexistent").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn fault_injection_follows_config() {
        let store: Arc<dyn TaskStore> =
            Arc::new(SqliteTaskStore::new(Database::in_memory().unwrap()));

        let state = AppState::new(Config::default(), Arc::clone(&store)).unwrap();
        assert!(state.faults.is_none());
        assert_eq!(state.observers.len(), 2);
        assert_eq!(state.config.bind_addr(), "127.0.0.1:8000");

        let mut config = Config::default();
        config.faults.enabled = true;
        let state = AppState::new(config, store).unwrap();
        assert!(state.faults.is_some());
    }
}
