//! Fault injection for demonstrations.
//!
//! Adds a random delay to every request and fails a share of task list
//! requests with a synthetic server error. Only installed when
//! `FAULT_INJECTION` is enabled; never active by default.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};
use rand::Rng;

use crate::api::error::ApiError;
use crate::config::FaultConfig;

/// Route whose requests may be failed on purpose.
pub const FAILING_ROUTE: &str = "/tasks";

#[derive(Debug, Clone)]
pub struct FaultInjector {
    max_delay: Duration,
    list_failure_rate: f64,
}

impl FaultInjector {
    pub fn new(max_delay: Duration, list_failure_rate: f64) -> Self {
        let list_failure_rate = if list_failure_rate.is_nan() {
            0.0
        } else {
            list_failure_rate.clamp(0.0, 1.0)
        };
        Self {
            max_delay,
            list_failure_rate,
        }
    }

    /// Build an injector if the configuration enables one.
    pub fn from_config(config: &FaultConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(config.max_delay, config.list_failure_rate))
    }

    /// Upper delay bound in whole milliseconds, saturating at `u64::MAX`.
    pub fn max_delay_ms(&self) -> u64 {
        u64::try_from(self.max_delay.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn list_failure_rate(&self) -> f64 {
        self.list_failure_rate
    }

    /// A uniformly random delay in `[0, max_delay]`.
    pub fn delay(&self) -> Duration {
        let max = self.max_delay_ms();
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=max))
    }

    /// Decide whether this request should fail.
    pub fn should_fail(&self, method: &Method, path: &str) -> bool {
        if *method != Method::GET || path.trim_end_matches('/') != FAILING_ROUTE {
            return false;
        }
        rand::thread_rng().gen_bool(self.list_failure_rate)
    }
}

/// Middleware applying the injector to every request.
pub async fn inject_faults(
    State(injector): State<Arc<FaultInjector>>,
    request: Request,
    next: Next,
) -> Response {
    let delay = injector.delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    if injector.should_fail(request.method(), request.uri().path()) {
        tracing::warn!(
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "Injected failure for {} {}",
            request.method(),
            request.uri().path()
        );
        return ApiError::Injected.into_response();
    }

    next.run(request).await
}
