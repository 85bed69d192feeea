//! REST API

pub mod car_handler;
pub mod dealer_handler;
pub mod dto;
pub mod error;
pub mod metrics_handler;
pub mod router;
pub mod state;

pub use metrics_handler::init_metrics;
pub use router::build_router;
pub use state::AppState;
