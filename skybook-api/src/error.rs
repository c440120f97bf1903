use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use skybook_booking::BookingError;
use skybook_catalog::{CatalogError, SeatError};

#[derive(Debug)]
pub enum AppError {
    AuthenticationError(String),
    AuthorizationError(String),
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl AppError {
    pub fn from_booking(err: BookingError) -> Self {
        match err {
            BookingError::FlightNotFound(_)
            | BookingError::BookingNotFound(_)
            | BookingError::PnrNotFound(_) => AppError::NotFoundError(err.to_string()),
            BookingError::SeatUnavailable(_) => AppError::ConflictError(err.to_string()),
            BookingError::UnknownSeat(_)
            | BookingError::FlightDeparted
            | BookingError::InvalidState(_)
            | BookingError::AlreadyCancelled
            | BookingError::Validation(_) => AppError::ValidationError(err.to_string()),
            BookingError::Forbidden => AppError::AuthorizationError(err.to_string()),
            BookingError::PnrExhausted(_) => AppError::InternalServerError(err.to_string()),
        }
    }

    pub fn from_catalog(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => AppError::NotFoundError(err.to_string()),
            CatalogError::InvalidFlight(_) | CatalogError::InvalidDemandFactor(_) => {
                AppError::ValidationError(err.to_string())
            }
        }
    }

    pub fn from_seats(err: SeatError) -> Self {
        match err {
            SeatError::FlightNotFound(_) => AppError::NotFoundError(err.to_string()),
            SeatError::UnknownSeat { .. } => AppError::ValidationError(err.to_string()),
            SeatError::AlreadyHeld { .. } => AppError::ConflictError(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::AuthorizationError(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Anyhow(err)
    }
}
