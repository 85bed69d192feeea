//! Dealer API handlers

use super::dto::{DealerRequest, DealerResponse, IdResponse};
use super::error::{error_response, not_found, MISSING_FIELDS};
use super::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};

pub async fn list_dealers(State(state): State<AppState>) -> Response {
    match state.dealers.list().await {
        Ok(dealers) => {
            let body: Vec<DealerResponse> = dealers.into_iter().map(Into::into).collect();
            Json(body).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn get_dealer(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    match state.dealers.get(id).await {
        Ok(Some(dealer)) => Json(DealerResponse::from(dealer)).into_response(),
        Ok(None) => not_found("Dealer"),
        Err(e) => e.into_response(),
    }
}

pub async fn create_dealer(
    State(state): State<AppState>,
    payload: Result<Json<DealerRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            warn!("API: Rejected dealer body: {}", rejection.body_text());
            return error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS);
        }
    };

    match state.dealers.create(req.into()).await {
        Ok(dealer) => {
            info!("API: Created dealer {} (ID: {})", dealer.name, dealer.id);
            (StatusCode::CREATED, Json(IdResponse { id: dealer.id })).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn update_dealer(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<DealerRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            // A missing target wins over a bad body.
            return match state.dealers.get(id).await {
                Ok(None) => not_found("Dealer"),
                Ok(Some(_)) => {
                    warn!("API: Rejected dealer body: {}", rejection.body_text());
                    error_response(StatusCode::BAD_REQUEST, MISSING_FIELDS)
                }
                Err(e) => e.into_response(),
            };
        }
    };

    match state.dealers.update(id, req.into()).await {
        Ok(Some(dealer)) => Json(IdResponse { id: dealer.id }).into_response(),
        Ok(None) => not_found("Dealer"),
        Err(e) => e.into_response(),
    }
}

/// Delete a dealer; its cars go with it and no car events are emitted
pub async fn delete_dealer(State(state): State<AppState>, Path(id): Path<i32>) -> Response {
    match state.dealers.delete(id).await {
        Ok(true) => {
            info!("API: Deleted dealer ID: {}", id);
            StatusCode::NO_CONTENT.into_response()
        }
        Ok(false) => not_found("Dealer"),
        Err(e) => e.into_response(),
    }
}
