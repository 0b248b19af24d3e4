use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::store::StoreError;

/// Everything here is recoverable at the caller layer; nothing should
/// crash the process. Store failures collapse into `Internal` and are
/// logged before the generic message goes out.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed input")]
    MalformedInput,

    #[error("Email or WhatsApp already registered")]
    DuplicateContact,

    #[error("No active raffle")]
    NoActiveRaffle,

    #[error("Participant not found")]
    ParticipantNotFound,

    #[error("Invalid or expired code")]
    InvalidOrExpired,

    #[error("Could not deliver the verification code, try again")]
    DeliveryFailed,

    #[error("Wait before requesting another code")]
    ResendThrottled,

    #[error("No validated participants to draw from")]
    EmptyPool,

    #[error("Raffle already drawn")]
    AlreadyDrawn,

    #[error("Internal error: {0}")]
    Internal(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(Box::new(err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedInput => StatusCode::BAD_REQUEST,
            AppError::DuplicateContact => StatusCode::CONFLICT,
            AppError::NoActiveRaffle => StatusCode::NOT_FOUND,
            AppError::ParticipantNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidOrExpired => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DeliveryFailed => StatusCode::BAD_GATEWAY,
            AppError::ResendThrottled => StatusCode::TOO_MANY_REQUESTS,
            AppError::EmptyPool => StatusCode::CONFLICT,
            AppError::AlreadyDrawn => StatusCode::CONFLICT,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let AppError::Internal(err) = &self {
            tracing::error!("Internal error: {err}");
            return (status, "Internal error".to_string()).into_response();
        }

        (status, self.to_string()).into_response()
    }
}
