//! Prometheus metrics for the `/metrics` endpoint.
//!
//! Each `TaskMetrics` owns its own recorder instead of installing a global
//! one, so every application instance (and every test) has an isolated
//! registry.

use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};

use crate::task::TaskCounts;

/// Number of tasks in the store (gauge).
pub const TOTAL_TASKS: &str = "total_task";
/// Tasks whose status is not the completed value (gauge).
pub const ACTIVE_TASKS: &str = "task_statuses_active";
/// Tasks whose status is the completed value (gauge).
pub const COMPLETED_TASKS: &str = "task_statuses_completed";
/// HTTP requests served (counter, labels: method, handler, status).
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
/// HTTP request duration seconds (histogram, labels: method, handler).
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";

/// Content type of the Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4";

pub struct TaskMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl TaskMetrics {
    pub fn new() -> Self {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            describe_gauge!(TOTAL_TASKS, "Number of total tasks");
            describe_gauge!(ACTIVE_TASKS, "Number of active tasks");
            describe_gauge!(COMPLETED_TASKS, "Number of completed tasks");
            describe_counter!(HTTP_REQUESTS_TOTAL, "Total number of HTTP requests");
            describe_histogram!(
                HTTP_REQUEST_DURATION_SECONDS,
                metrics::Unit::Seconds,
                "HTTP request duration"
            );
        });

        Self { recorder, handle }
    }

    /// Replace the task gauges with a fresh snapshot.
    pub fn set_task_counts(&self, counts: TaskCounts) {
        metrics::with_local_recorder(&self.recorder, || {
            gauge!(TOTAL_TASKS).set(counts.total as f64);
            gauge!(ACTIVE_TASKS).set(counts.active as f64);
            gauge!(COMPLETED_TASKS).set(counts.completed as f64);
        });
    }

    pub fn record_request(&self, method: &str, handler: &str, status: u16, elapsed: Duration) {
        let method = method.to_string();
        let handler = handler.to_string();
        metrics::with_local_recorder(&self.recorder, || {
            counter!(
                HTTP_REQUESTS_TOTAL,
                "method" => method.clone(),
                "handler" => handler.clone(),
                "status" => status.to_string()
            )
            .increment(1);
            histogram!(
                HTTP_REQUEST_DURATION_SECONDS,
                "method" => method,
                "handler" => handler
            )
            .record(elapsed.as_secs_f64());
        });
    }

    /// Render the Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl Default for TaskMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the value of an unlabelled sample in rendered output.
#[cfg(test)]
pub(crate) fn sample_value(rendered: &str, name: &str) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (metric, value) = line.rsplit_once(' ')?;
            (metric == name).then(|| value.parse().ok()).flatten()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_gauges_render() {
        let metrics = TaskMetrics::new();
        metrics.set_task_counts(TaskCounts::new(5, 2));

        let output = metrics.render();
        assert_eq!(sample_value(&output, TOTAL_TASKS), Some(5.0));
        assert_eq!(sample_value(&output, ACTIVE_TASKS), Some(3.0));
        assert_eq!(sample_value(&output, COMPLETED_TASKS), Some(2.0));
        assert!(output.contains("Number of total tasks"));
    }

    #[test]
    fn gauges_are_replaced_not_accumulated() {
        let metrics = TaskMetrics::new();
        metrics.set_task_counts(TaskCounts::new(5, 2));
        metrics.set_task_counts(TaskCounts::new(1, 1));

        let output = metrics.render();
        assert_eq!(sample_value(&output, TOTAL_TASKS), Some(1.0));
        assert_eq!(sample_value(&output, ACTIVE_TASKS), Some(0.0));
    }

    #[test]
    fn request_counter_labels() {
        let metrics = TaskMetrics::new();
        metrics.record_request("GET", "/tasks", 200, Duration::from_millis(3));
        metrics.record_request("GET", "/tasks", 200, Duration::from_millis(5));

        let output = metrics.render();
        let line = output
            .lines()
            .find(|l| l.starts_with(HTTP_REQUESTS_TOTAL) && l.contains("handler=\"/tasks\""))
            .expect("request counter line");
        assert!(line.contains("method=\"GET\""));
        assert!(line.contains("status=\"200\""));
        assert!(line.ends_with(" 2"));
    }

    #[test]
    fn instances_are_isolated() {
        let a = TaskMetrics::new();
        let b = TaskMetrics::new();
        a.set_task_counts(TaskCounts::new(7, 0));

        assert_eq!(sample_value(&a.render(), TOTAL_TASKS), Some(7.0));
        assert_eq!(sample_value(&b.render(), TOTAL_TASKS), None);
    }

    #[test]
    fn metric_names_are_snake_case() {
        let names = [
            TOTAL_TASKS,
            ACTIVE_TASKS,
            COMPLETED_TASKS,
            HTTP_REQUESTS_TOTAL,
            HTTP_REQUEST_DURATION_SECONDS,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
