//! # Store
//!
//! The persistence seam. The core only needs a handful of query
//! shapes: find by contact, find unused codes by contact, update by
//! id, find the active raffle. Anything that can answer those can
//! back the service; `MemoryStore` is the in-process implementation
//! used by the server and the tests.
//!
//! Concurrency sits here, not in the service: registrations for the
//! same contact serialize on the write lock, and `close_raffle` flips
//! active→closed and records the winner under one lock acquisition so
//! at most one draw ever succeeds per raffle.

use std::{
    collections::HashMap,
    sync::RwLock,
};

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Participant, Raffle, VerificationCode};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,
}

pub trait Store: Send + Sync {
    fn insert_raffle(&self, raffle: Raffle) -> Result<(), StoreError>;
    fn find_active_raffle(&self) -> Result<Option<Raffle>, StoreError>;

    /// Records the winner and closes the raffle in one atomic step.
    /// Returns `false` when the raffle was no longer active, in which
    /// case nothing is written.
    fn close_raffle(
        &self,
        id: Uuid,
        winner_id: Uuid,
        drawn_at: DateTime<Utc>,
        seed: &str,
    ) -> Result<bool, StoreError>;

    /// Closed raffles, most recently drawn first.
    fn historical_raffles(&self) -> Result<Vec<Raffle>, StoreError>;

    fn insert_participant(&self, participant: Participant) -> Result<(), StoreError>;
    fn find_participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError>;
    fn find_participant_by_contact(
        &self,
        email: &str,
        whatsapp: &str,
    ) -> Result<Option<Participant>, StoreError>;

    /// All participants of a raffle, newest registration first.
    fn participants_for(&self, raffle_id: Uuid) -> Result<Vec<Participant>, StoreError>;

    /// Validated participants only, ordered by validation time
    /// ascending. This ordering is part of the published draw record:
    /// recomputing a draw requires the same entrant order.
    fn validated_participants(&self, raffle_id: Uuid) -> Result<Vec<Participant>, StoreError>;

    fn insert_code(&self, code: VerificationCode) -> Result<(), StoreError>;
    fn find_unused_codes(&self, whatsapp: &str) -> Result<Vec<VerificationCode>, StoreError>;
    fn last_issued_at(&self, whatsapp: &str) -> Result<Option<DateTime<Utc>>, StoreError>;

    /// Marks every unused code for the contact as used.
    fn invalidate_codes(&self, whatsapp: &str) -> Result<(), StoreError>;

    /// Marks the code used and the participant validated in one atomic
    /// step, so a code is never burned without the entrant flipping to
    /// validated.
    fn consume_code(
        &self,
        code_id: Uuid,
        participant_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

#[derive(Default)]
struct Inner {
    raffles: HashMap<Uuid, Raffle>,
    participants: HashMap<Uuid, Participant>,
    codes: Vec<VerificationCode>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl Store for MemoryStore {
    fn insert_raffle(&self, raffle: Raffle) -> Result<(), StoreError> {
        self.write()?.raffles.insert(raffle.id, raffle);

        Ok(())
    }

    fn find_active_raffle(&self) -> Result<Option<Raffle>, StoreError> {
        Ok(self
            .read()?
            .raffles
            .values()
            .find(|r| r.is_active)
            .cloned())
    }

    fn close_raffle(
        &self,
        id: Uuid,
        winner_id: Uuid,
        drawn_at: DateTime<Utc>,
        seed: &str,
    ) -> Result<bool, StoreError> {
        let mut inner = self.write()?;

        let Some(raffle) = inner.raffles.get_mut(&id) else {
            return Ok(false);
        };

        if !raffle.is_active {
            return Ok(false);
        }

        raffle.is_active = false;
        raffle.winner_id = Some(winner_id);
        raffle.drawn_at = Some(drawn_at);
        raffle.seed = Some(seed.to_string());

        Ok(true)
    }

    fn historical_raffles(&self) -> Result<Vec<Raffle>, StoreError> {
        let mut raffles: Vec<Raffle> = self
            .read()?
            .raffles
            .values()
            .filter(|r| !r.is_active)
            .cloned()
            .collect();

        raffles.sort_by(|a, b| b.drawn_at.cmp(&a.drawn_at));

        Ok(raffles)
    }

    fn insert_participant(&self, participant: Participant) -> Result<(), StoreError> {
        self.write()?
            .participants
            .insert(participant.id, participant);

        Ok(())
    }

    fn find_participant(&self, id: Uuid) -> Result<Option<Participant>, StoreError> {
        Ok(self.read()?.participants.get(&id).cloned())
    }

    fn find_participant_by_contact(
        &self,
        email: &str,
        whatsapp: &str,
    ) -> Result<Option<Participant>, StoreError> {
        Ok(self
            .read()?
            .participants
            .values()
            .find(|p| p.email == email || p.whatsapp == whatsapp)
            .cloned())
    }

    fn participants_for(&self, raffle_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let mut participants: Vec<Participant> = self
            .read()?
            .participants
            .values()
            .filter(|p| p.raffle_id == raffle_id)
            .cloned()
            .collect();

        participants.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(participants)
    }

    fn validated_participants(&self, raffle_id: Uuid) -> Result<Vec<Participant>, StoreError> {
        let mut participants: Vec<Participant> = self
            .read()?
            .participants
            .values()
            .filter(|p| p.raffle_id == raffle_id && p.is_validated)
            .cloned()
            .collect();

        participants.sort_by(|a, b| a.validated_at.cmp(&b.validated_at));

        Ok(participants)
    }

    fn insert_code(&self, code: VerificationCode) -> Result<(), StoreError> {
        self.write()?.codes.push(code);

        Ok(())
    }

    fn find_unused_codes(&self, whatsapp: &str) -> Result<Vec<VerificationCode>, StoreError> {
        Ok(self
            .read()?
            .codes
            .iter()
            .filter(|c| c.whatsapp == whatsapp && !c.is_used)
            .cloned()
            .collect())
    }

    fn last_issued_at(&self, whatsapp: &str) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self
            .read()?
            .codes
            .iter()
            .filter(|c| c.whatsapp == whatsapp)
            .map(|c| c.issued_at)
            .max())
    }

    fn invalidate_codes(&self, whatsapp: &str) -> Result<(), StoreError> {
        for code in self
            .write()?
            .codes
            .iter_mut()
            .filter(|c| c.whatsapp == whatsapp)
        {
            code.is_used = true;
        }

        Ok(())
    }

    fn consume_code(
        &self,
        code_id: Uuid,
        participant_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut inner = self.write()?;

        if let Some(code) = inner.codes.iter_mut().find(|c| c.id == code_id) {
            code.is_used = true;
        }

        if let Some(participant) = inner.participants.get_mut(&participant_id) {
            participant.is_validated = true;
            participant.validated_at = Some(at);
        }

        Ok(())
    }
}
