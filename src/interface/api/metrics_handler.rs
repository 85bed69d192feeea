//! Prometheus metrics handler

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use metrics::describe_counter;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder and describe the event counters
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_metrics();
    Ok(handle)
}

fn describe_metrics() {
    describe_counter!(
        "car_events_published_total",
        "Car events confirmed by the broker, by event type"
    );
    describe_counter!(
        "car_events_failed_total",
        "Car events that could not be delivered, by event type and reason"
    );
    describe_counter!(
        "car_events_unroutable_total",
        "Car events returned by the broker as unroutable"
    );
    describe_counter!(
        "broker_topology_repairs_total",
        "Exchange redeclarations after a kind mismatch"
    );
}

/// HTTP metrics handler
pub async fn metrics_handler(State(prometheus_handle): State<PrometheusHandle>) -> Response {
    (StatusCode::OK, prometheus_handle.render()).into_response()
}
