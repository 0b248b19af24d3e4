use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    models::NewParticipant,
    state::AppState,
    utils::{validate_email, validate_telegram, validate_whatsapp},
};

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub telegram: String,
    pub whatsapp: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub participant_id: Uuid,
    pub ticket_number: String,
    pub code_delivered: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPayload {
    pub participant_id: Uuid,
    pub code: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub ticket_number: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendPayload {
    pub participant_id: Uuid,
}

pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, AppError> {
    // Input shape is this layer's job; the service assumes clean
    // handles.
    if payload.name.trim().is_empty()
        || !validate_email(&payload.email)
        || !validate_whatsapp(&payload.whatsapp)
        || !validate_telegram(&payload.telegram)
    {
        return Err(AppError::MalformedInput);
    }

    let registered = state
        .service
        .register(NewParticipant {
            name: payload.name,
            email: payload.email,
            telegram: payload.telegram,
            whatsapp: payload.whatsapp,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            participant_id: registered.participant_id,
            ticket_number: registered.ticket_number,
            code_delivered: registered.code_delivered,
        }),
    ))
}

pub async fn verify_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyPayload>,
) -> Result<impl IntoResponse, AppError> {
    if payload.code.len() != 6 || !payload.code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::MalformedInput);
    }

    let ticket_number = state
        .service
        .verify_code(payload.participant_id, &payload.code)?;

    Ok(Json(VerifyResponse { ticket_number }))
}

pub async fn resend_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResendPayload>,
) -> Result<impl IntoResponse, AppError> {
    state.service.resend_code(payload.participant_id).await?;

    Ok(StatusCode::OK)
}

pub async fn draw_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let result = state.service.draw_winner().await?;

    Ok(Json(result))
}

pub async fn participants_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service.participants()?))
}

pub async fn current_raffle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    match state.service.current_raffle()? {
        Some(current) => Ok(Json(current).into_response()),
        None => Ok(StatusCode::NOT_FOUND.into_response()),
    }
}

pub async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service.stats()?))
}

pub async fn historical_raffles_handler(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.service.historical_raffles()?))
}
