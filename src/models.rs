//! Core records and the view types served to the frontend.
//!
//! `Participant`, `VerificationCode`, and `Raffle` mirror the rows the
//! external store keeps. The view structs at the bottom are the JSON
//! shapes the dashboard consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub telegram: String,
    pub whatsapp: String,
    pub ticket_number: String,
    pub raffle_id: Uuid,
    pub is_validated: bool,
    pub validated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// One-time code bound to a WhatsApp handle. At most one live
/// (unused, unexpired) code exists per handle at any instant; the
/// `CodeManager` enforces that, not the store.
#[derive(Debug, Clone)]
pub struct VerificationCode {
    pub id: Uuid,
    pub code: String,
    pub whatsapp: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Raffle {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub prize: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub winner_id: Option<Uuid>,
    pub drawn_at: Option<DateTime<Utc>>,
    pub seed: Option<String>,
}

/// Registration input, already shape-validated by the caller layer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewParticipant {
    pub name: String,
    pub email: String,
    pub telegram: String,
    pub whatsapp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleStats {
    pub total_participants: usize,
    pub validated_participants: usize,
    pub time_remaining: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentRaffle {
    #[serde(flatten)]
    pub raffle: Raffle,
    pub participants: Vec<Participant>,
}

/// Closed raffle plus its audit artifact: `(winner, drawn_at, seed)` is
/// enough for a third party to recompute the draw over the recorded
/// entrant order and check the published winner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalRaffle {
    #[serde(flatten)]
    pub raffle: Raffle,
    pub total_participants: usize,
    pub winner: Option<Participant>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawResult {
    pub winner: Participant,
    pub seed: String,
    pub drawn_at: DateTime<Utc>,
}
