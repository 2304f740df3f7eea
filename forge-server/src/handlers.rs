use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::api::{self, parse_body, ApiError, MessageRequest, StartRequest};
use crate::state::AppState;

pub async fn start_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let result = match parse_body::<StartRequest>(&body) {
        Ok(request) => api::start_session(&state.engine, request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn message_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let result = match parse_body::<MessageRequest>(&body) {
        Ok(request) => api::send_message(&state.engine, request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn not_found_handler() -> ApiError {
    ApiError::not_found()
}
