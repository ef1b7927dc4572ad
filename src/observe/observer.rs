//! Request observers.
//!
//! Logging and metrics are not called from the handlers. Instead a single
//! middleware ([`observe_requests`]) notifies every registered
//! [`RequestObserver`] before and after each request.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::{MatchedPath, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::Response,
};

use super::metrics::TaskMetrics;
use crate::store::TaskStore;

/// What an observer learns about a request.
#[derive(Debug, Clone)]
pub struct RequestInfo {
    pub method: Method,
    /// Concrete request path, e.g. `/tasks/5`
    pub path: String,
    /// Matched route template, e.g. `/tasks/:id`. Falls back to the path
    /// for unmatched requests.
    pub route: String,
}

/// Cross-cutting hook invoked around every request.
#[async_trait]
pub trait RequestObserver: Send + Sync {
    async fn on_request(&self, _request: &RequestInfo) {}

    async fn on_response(&self, _request: &RequestInfo, _status: StatusCode, _elapsed: Duration) {}
}

/// Ordered set of observers shared by the middleware.
#[derive(Clone, Default)]
pub struct ObserverChain {
    observers: Arc<Vec<Arc<dyn RequestObserver>>>,
}

impl ObserverChain {
    pub fn new(observers: Vec<Arc<dyn RequestObserver>>) -> Self {
        Self {
            observers: Arc::new(observers),
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub async fn on_request(&self, request: &RequestInfo) {
        for observer in self.observers.iter() {
            observer.on_request(request).await;
        }
    }

    pub async fn on_response(&self, request: &RequestInfo, status: StatusCode, elapsed: Duration) {
        for observer in self.observers.iter() {
            observer.on_response(request, status, elapsed).await;
        }
    }
}

/// Middleware notifying the observer chain around the inner service.
pub async fn observe_requests(
    State(observers): State<ObserverChain>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let info = RequestInfo {
        method: request.method().clone(),
        route: request
            .extensions()
            .get::<MatchedPath>()
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| path.clone()),
        path,
    };

    observers.on_request(&info).await;
    let started = Instant::now();
    let response = next.run(request).await;
    observers
        .on_response(&info, response.status(), started.elapsed())
        .await;

    response
}

// ─────────────────────────────────────────────────────────────────────────────
// Observers
// ─────────────────────────────────────────────────────────────────────────────

/// Logs every request through `tracing`.
#[derive(Debug, Default)]
pub struct LogObserver;

#[async_trait]
impl RequestObserver for LogObserver {
    async fn on_request(&self, request: &RequestInfo) {
        tracing::info!("{} {} request received", request.method, request.path);
    }

    async fn on_response(&self, request: &RequestInfo, status: StatusCode, elapsed: Duration) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if status.is_server_error() {
            tracing::warn!(
                status = status.as_u16(),
                elapsed_ms,
                "{} {} failed",
                request.method,
                request.path
            );
        } else {
            tracing::debug!(
                status = status.as_u16(),
                elapsed_ms,
                "{} {} completed",
                request.method,
                request.path
            );
        }
    }
}

/// Refreshes the task gauges before each request and records request
/// counters and latencies after it.
pub struct MetricsObserver {
    store: Arc<dyn TaskStore>,
    metrics: Arc<TaskMetrics>,
}

impl MetricsObserver {
    pub fn new(store: Arc<dyn TaskStore>, metrics: Arc<TaskMetrics>) -> Self {
        Self { store, metrics }
    }
}

#[async_trait]
impl RequestObserver for MetricsObserver {
    async fn on_request(&self, _request: &RequestInfo) {
        match self.store.counts().await {
            Ok(counts) => self.metrics.set_task_counts(counts),
            Err(e) => tracing::warn!("Failed to refresh task metrics: {}", e),
        }
    }

    async fn on_response(&self, request: &RequestInfo, status: StatusCode, elapsed: Duration) {
        self.metrics
            .record_request(request.method.as_str(), &request.route, status.as_u16(), elapsed);
    }
}
