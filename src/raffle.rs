//! # Raffle service
//!
//! Orchestrates the whole flow: registration, code verification,
//! resends, the draw, and the read-side queries the dashboard needs.
//! Store, notifier, and clock are injected so the logic runs the same
//! against the in-memory store as it would against a real database.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    codes::CodeManager,
    draw::select_winner,
    error::AppError,
    models::{
        CurrentRaffle, DrawResult, HistoricalRaffle, NewParticipant, Participant, RaffleStats,
    },
    notifier::{winner_message, Notifier},
    store::Store,
    utils::{format_time_remaining, generate_raffle_seed, generate_ticket_number},
};

pub struct Registered {
    pub participant_id: Uuid,
    pub ticket_number: String,
    /// False when the notifier could not deliver the code; the entry
    /// and its code survive, so a resend can recover.
    pub code_delivered: bool,
}

pub struct RaffleService<S, N, C> {
    store: Arc<S>,
    notifier: N,
    clock: C,
    codes: CodeManager<S, N, C>,
    resend_cooldown: Duration,
}

impl<S, N, C> RaffleService<S, N, C>
where
    S: Store,
    N: Notifier + Clone,
    C: Clock + Clone,
{
    pub fn new(
        store: Arc<S>,
        notifier: N,
        clock: C,
        code_ttl_minutes: i64,
        resend_cooldown_secs: i64,
    ) -> Self {
        let codes = CodeManager::new(
            store.clone(),
            notifier.clone(),
            clock.clone(),
            code_ttl_minutes,
        );

        Self {
            store,
            notifier,
            clock,
            codes,
            resend_cooldown: Duration::seconds(resend_cooldown_secs),
        }
    }

    /// Creates an entry in the active raffle and issues the first
    /// verification code. Both email and WhatsApp must be unused.
    pub async fn register(&self, data: NewParticipant) -> Result<Registered, AppError> {
        if self
            .store
            .find_participant_by_contact(&data.email, &data.whatsapp)?
            .is_some()
        {
            return Err(AppError::DuplicateContact);
        }

        let raffle = self
            .store
            .find_active_raffle()?
            .ok_or(AppError::NoActiveRaffle)?;

        let participant = Participant {
            id: Uuid::new_v4(),
            name: data.name,
            email: data.email,
            telegram: data.telegram,
            whatsapp: data.whatsapp,
            ticket_number: generate_ticket_number(),
            raffle_id: raffle.id,
            is_validated: false,
            validated_at: None,
            created_at: self.clock.now(),
        };
        self.store.insert_participant(participant.clone())?;

        info!("Registered participant {}", participant.ticket_number);

        // A failed delivery is reported, not fatal: the registration
        // stands and the code stays live for a later resend.
        let code_delivered = match self.codes.issue(&participant.whatsapp).await {
            Ok(_) => true,
            Err(AppError::DeliveryFailed) => {
                warn!("Verification code delivery failed at registration");
                false
            }
            Err(err) => return Err(err),
        };

        Ok(Registered {
            participant_id: participant.id,
            ticket_number: participant.ticket_number,
            code_delivered,
        })
    }

    /// Confirms the code and returns the ticket number of the now
    /// validated entry.
    pub fn verify_code(&self, participant_id: Uuid, code: &str) -> Result<String, AppError> {
        let participant = self
            .store
            .find_participant(participant_id)?
            .ok_or(AppError::ParticipantNotFound)?;

        self.codes.validate(&participant, code)?;

        Ok(participant.ticket_number)
    }

    /// Invalidates any previous code and sends a fresh one. Throttled:
    /// a request inside the cool-down window since the last issuance
    /// for this contact is rejected. The throttle lives here, in the
    /// caller-facing layer, not in the `CodeManager`.
    pub async fn resend_code(&self, participant_id: Uuid) -> Result<(), AppError> {
        let participant = self
            .store
            .find_participant(participant_id)?
            .ok_or(AppError::ParticipantNotFound)?;

        if let Some(last) = self.store.last_issued_at(&participant.whatsapp)? {
            if self.clock.now() - last < self.resend_cooldown {
                return Err(AppError::ResendThrottled);
            }
        }

        self.codes.reissue(&participant.whatsapp).await?;

        Ok(())
    }

    /// Draws the winner and closes the raffle in one atomic store
    /// update, so a raffle can never be drawn twice. The seed is
    /// generated before touching the entrant list and recorded with
    /// the result for third-party recomputation.
    pub async fn draw_winner(&self) -> Result<DrawResult, AppError> {
        let Some(raffle) = self.store.find_active_raffle()? else {
            if self.store.historical_raffles()?.is_empty() {
                return Err(AppError::NoActiveRaffle);
            }
            return Err(AppError::AlreadyDrawn);
        };

        let entrants = self.store.validated_participants(raffle.id)?;
        let seed = generate_raffle_seed();
        let winner = select_winner(&entrants, &seed)?.clone();
        let drawn_at = self.clock.now();

        if !self
            .store
            .close_raffle(raffle.id, winner.id, drawn_at, &seed)?
        {
            return Err(AppError::AlreadyDrawn);
        }

        info!("Raffle drawn, winner ticket {}", winner.ticket_number);

        // The draw is already committed; a failed congratulation is
        // only worth a log line.
        if !self
            .notifier
            .send(&winner.whatsapp, &winner_message(&winner.name, &raffle.prize))
            .await
        {
            warn!("Winner notification failed");
        }

        Ok(DrawResult {
            winner,
            seed,
            drawn_at,
        })
    }

    pub fn stats(&self) -> Result<RaffleStats, AppError> {
        let Some(raffle) = self.store.find_active_raffle()? else {
            return Ok(RaffleStats {
                total_participants: 0,
                validated_participants: 0,
                time_remaining: None,
                is_active: false,
            });
        };

        let participants = self.store.participants_for(raffle.id)?;
        let validated = participants.iter().filter(|p| p.is_validated).count();

        Ok(RaffleStats {
            total_participants: participants.len(),
            validated_participants: validated,
            time_remaining: raffle
                .end_date
                .map(|end| format_time_remaining(end, self.clock.now())),
            is_active: true,
        })
    }

    pub fn current_raffle(&self) -> Result<Option<CurrentRaffle>, AppError> {
        let Some(raffle) = self.store.find_active_raffle()? else {
            return Ok(None);
        };

        let participants = self.store.validated_participants(raffle.id)?;

        Ok(Some(CurrentRaffle {
            raffle,
            participants,
        }))
    }

    /// Closed raffles with their audit record, newest draw first.
    pub fn historical_raffles(&self) -> Result<Vec<HistoricalRaffle>, AppError> {
        let mut history = Vec::new();

        for raffle in self.store.historical_raffles()? {
            let winner = match raffle.winner_id {
                Some(id) => self.store.find_participant(id)?,
                None => None,
            };
            let total = self.store.validated_participants(raffle.id)?.len();

            history.push(HistoricalRaffle {
                raffle,
                total_participants: total,
                winner,
            });
        }

        Ok(history)
    }

    /// All entries of the active raffle, newest registration first.
    pub fn participants(&self) -> Result<Vec<Participant>, AppError> {
        let Some(raffle) = self.store.find_active_raffle()? else {
            return Ok(Vec::new());
        };

        Ok(self.store.participants_for(raffle.id)?)
    }
}
