mod routes;

pub use routes::create_router;

use crate::app::{Reader, Refresher};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use topstories_core::{ErrorKind, HnApi, TopStoriesError};

/// Shared application state
pub struct AppState<H: HnApi + 'static> {
    pub reader: Arc<Reader<H>>,
    pub refresher: Arc<Refresher<H>>,
    pub start_time: std::time::Instant,
}

impl<H: HnApi + 'static> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            refresher: self.refresher.clone(),
            start_time: self.start_time,
        }
    }
}

/// Body of every failed response
#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Custom error type for HTTP handlers
#[derive(Debug)]
pub struct AppError(TopStoriesError);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::BadInput => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self.0.kind() {
            ErrorKind::Internal => {
                tracing::error!(error = %self.0, "request failed");
                "internal server error".to_string()
            }
            _ => {
                tracing::warn!(error = %self.0, status = status.as_u16(), "request rejected");
                self.0.to_string()
            }
        };
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<TopStoriesError> for AppError {
    fn from(err: TopStoriesError) -> Self {
        Self(err)
    }
}

pub type AppResult<T> = Result<T, AppError>;
