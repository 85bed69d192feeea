//! Car API handlers

use super::dto::{CarRequest, CarResponse, IdResponse};
use super::error::{error_response, not_found, MISSING_FIELDS};
use super::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

/// List all cars
pub async fn list_cars(State(state): State<AppState>) -> Response {
    match state.cars.list().await {
        Ok(cars) => {
            let body: Vec<CarResponse> = cars.into_iter().map(Into::into).collect();
            Json(body).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Get car by ID
pub async fn get_car(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    match state.cars.get(id).await {
        Ok(Some(car)) => Json(CarResponse::from(car)).into_response(),
        Ok(None) => not_found("Car"),
        Err(e) => e.into_response(),
    }
}

/// Create a new car
pub async fn create_car(
    State(state): State<AppState>,
    payload: Result<Json<CarRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!("API: Rejected car body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS);
        }
    };

    match state.cars.create(req.into()).await {
        Ok(car) => {
            info!(car_id = car.id, "API: Created car {} {}", car.firm, car.model);
            (StatusCode::CREATED, Json(IdResponse { id: car.id })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Replace a car's attributes
pub async fn update_car(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<CarRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            // A missing target wins over a bad body.
            return match state.cars.get(id).await {
                Ok(None) => not_found("Car"),
                Ok(Some(_)) => {
                    warn!("API: Rejected car body: {}", rejection.body_text());
                    error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS)
                }
                Err(e) => e.into_response(),
            };
        }
    };

    match state.cars.update(id, req.into()).await {
        Ok(Some(car)) => {
            info!(car_id = car.id, "API: Updated car");
            Json(IdResponse { id: car.id }).into_response()
        }
        Ok(None) => not_found("Car"),
        Err(e) => e.into_response(),
    }
}

/// Delete a car
pub async fn delete_car(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    match state.cars.delete(id).await {
        Ok(true) => {
            info!(car_id = id, "API: Deleted car");
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => not_found("Car"),
        Err(e) => e.into_response(),
    }
}
