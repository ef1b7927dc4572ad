//! Observation - request logging, metrics and fault injection.
//!
//! Everything here runs as axum middleware around the task handlers; the
//! handlers themselves only talk to the store.

pub mod fault;
pub mod metrics;
pub mod observer;

pub use self::fault::{inject_faults, FaultInjector};
pub use self::metrics::TaskMetrics;
pub use self::observer::{
    observe_requests, LogObserver, MetricsObserver, ObserverChain, RequestInfo, RequestObserver,
};
