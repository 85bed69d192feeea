//! API router

use super::car_handler::{create_car, delete_car, get_car, list_cars, update_car};
use super::dealer_handler::{
    create_dealer, delete_dealer, get_dealer, list_dealers, update_dealer,
};
use super::metrics_handler::metrics_handler;
use super::state::AppState;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Build the API router
pub fn build_router(state: AppState, prometheus_handle: PrometheusHandle) -> Router {
    let health_routes = Router::new().route("/health", get(health_check));

    let dealer_routes = Router::new()
        .route("/dealers", get(list_dealers).post(create_dealer))
        .route(
            "/dealers/:id",
            get(get_dealer).put(update_dealer).delete(delete_dealer),
        );

    let car_routes = Router::new()
        .route("/cars", get(list_cars).post(create_car))
        .route("/cars/:id", get(get_car).put(update_car).delete(delete_car));

    // Metrics route (separate state)
    let metrics_routes = Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(prometheus_handle);

    Router::new()
        .merge(health_routes)
        .merge(dealer_routes)
        .merge(car_routes)
        .with_state(state)
        .merge(metrics_routes)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}
