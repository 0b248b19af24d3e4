//! # Verification codes
//!
//! Issues, validates, and reissues the one-time codes that confirm a
//! registration really owns its WhatsApp handle. The manager owns the
//! code lifecycle end to end; the store only persists what it is told.
//!
//! Invariant: at most one live (unused, unexpired) code per contact.
//! `reissue` burns every unused code before minting a new one, so
//! repeated reissues are always safe.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::AppError,
    models::{Participant, VerificationCode},
    notifier::{verification_message, Notifier},
    store::Store,
    utils::generate_verification_code,
};

pub struct CodeManager<S, N, C> {
    store: Arc<S>,
    notifier: N,
    clock: C,
    ttl: chrono::Duration,
}

impl<S: Store, N: Notifier, C: Clock> CodeManager<S, N, C> {
    pub fn new(store: Arc<S>, notifier: N, clock: C, ttl_minutes: i64) -> Self {
        Self {
            store,
            notifier,
            clock,
            ttl: chrono::Duration::minutes(ttl_minutes),
        }
    }

    /// Mints a fresh 6-digit code for the contact and hands it to the
    /// notifier. On delivery failure the code stays issued and unused,
    /// so the caller can retry with `reissue`.
    pub async fn issue(&self, whatsapp: &str) -> Result<VerificationCode, AppError> {
        let now = self.clock.now();

        let code = VerificationCode {
            id: Uuid::new_v4(),
            code: generate_verification_code(),
            whatsapp: whatsapp.to_string(),
            issued_at: now,
            expires_at: now + self.ttl,
            is_used: false,
        };

        self.store.insert_code(code.clone())?;

        info!("Issued verification code for contact");

        if !self
            .notifier
            .send(whatsapp, &verification_message(&code.code))
            .await
        {
            return Err(AppError::DeliveryFailed);
        }

        Ok(code)
    }

    /// Succeeds only for an unused code bound to this participant's
    /// contact with `now` strictly before expiry; the boundary instant
    /// counts as expired. Consuming the code and validating the
    /// participant happen as one store operation.
    pub fn validate(&self, participant: &Participant, submitted: &str) -> Result<(), AppError> {
        let now = self.clock.now();

        let live = self
            .store
            .find_unused_codes(&participant.whatsapp)?
            .into_iter()
            .find(|c| c.code == submitted && now < c.expires_at)
            .ok_or(AppError::InvalidOrExpired)?;

        self.store.consume_code(live.id, participant.id, now)?;

        info!("Participant validated");

        Ok(())
    }

    /// Burns all unused codes for the contact, then issues a new one.
    pub async fn reissue(&self, whatsapp: &str) -> Result<VerificationCode, AppError> {
        self.store.invalidate_codes(whatsapp)?;

        self.issue(whatsapp).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::*;
    use crate::{
        clock::test::ManualClock,
        models::Participant,
        notifier::test::StubNotifier,
        store::MemoryStore,
    };

    const CONTACT: &str = "5511912345678";

    fn setup() -> (
        CodeManager<MemoryStore, StubNotifier, ManualClock>,
        Arc<MemoryStore>,
        StubNotifier,
        ManualClock,
        Participant,
    ) {
        let store = Arc::new(MemoryStore::new());
        let notifier = StubNotifier::default();
        let clock = ManualClock::at(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());

        let participant = Participant {
            id: Uuid::new_v4(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            telegram: "@ana_entrant".to_string(),
            whatsapp: CONTACT.to_string(),
            ticket_number: "T-ABC123".to_string(),
            raffle_id: Uuid::new_v4(),
            is_validated: false,
            validated_at: None,
            created_at: clock.now(),
        };
        store.insert_participant(participant.clone()).unwrap();

        let manager = CodeManager::new(store.clone(), notifier.clone(), clock.clone(), 10);

        (manager, store, notifier, clock, participant)
    }

    #[tokio::test]
    async fn test_issue_then_validate_once() {
        let (manager, store, notifier, _clock, participant) = setup();

        let code = manager.issue(CONTACT).await.unwrap();
        assert_eq!(code.code.len(), 6);
        assert_eq!(notifier.sent_count(), 1);

        let (to, message) = notifier.last_message().unwrap();
        assert_eq!(to, CONTACT);
        assert!(message.contains(&code.code));

        manager.validate(&participant, &code.code).unwrap();

        let stored = store.find_participant(participant.id).unwrap().unwrap();
        assert!(stored.is_validated);
        assert!(stored.validated_at.is_some());

        // Reuse must fail: the code was marked used on consumption.
        let reuse = manager.validate(&participant, &code.code);
        assert!(matches!(reuse, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_validate_wrong_code() {
        let (manager, _store, _notifier, _clock, participant) = setup();

        let code = manager.issue(CONTACT).await.unwrap();
        let wrong = if code.code == "000000" { "000001" } else { "000000" };

        let result = manager.validate(&participant, wrong);
        assert!(matches!(result, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_validate_code_bound_to_other_contact() {
        let (manager, store, _notifier, clock, participant) = setup();

        let other = Participant {
            whatsapp: "5511999999999".to_string(),
            email: "other@example.com".to_string(),
            id: Uuid::new_v4(),
            created_at: clock.now(),
            ..participant.clone()
        };
        store.insert_participant(other.clone()).unwrap();

        let code = manager.issue(CONTACT).await.unwrap();

        let result = manager.validate(&other, &code.code);
        assert!(matches!(result, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_expiry_is_strict() {
        let (manager, _store, _notifier, clock, participant) = setup();

        let code = manager.issue(CONTACT).await.unwrap();

        // Exactly at the boundary counts as expired.
        clock.set(code.expires_at);
        let at_boundary = manager.validate(&participant, &code.code);
        assert!(matches!(at_boundary, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_expired_code_rejected() {
        let (manager, _store, _notifier, clock, participant) = setup();

        let code = manager.issue(CONTACT).await.unwrap();

        clock.advance(Duration::minutes(11));
        let result = manager.validate(&participant, &code.code);
        assert!(matches!(result, Err(AppError::InvalidOrExpired)));
    }

    #[tokio::test]
    async fn test_just_before_expiry_accepted() {
        let (manager, _store, _notifier, clock, participant) = setup();

        let code = manager.issue(CONTACT).await.unwrap();

        clock.set(code.expires_at - Duration::seconds(1));
        manager.validate(&participant, &code.code).unwrap();
    }

    #[tokio::test]
    async fn test_reissue_invalidates_previous_codes() {
        let (manager, store, _notifier, _clock, participant) = setup();

        let first = manager.issue(CONTACT).await.unwrap();
        let second = manager.reissue(CONTACT).await.unwrap();

        // The original fails even though its natural expiry is ahead.
        let stale = manager.validate(&participant, &first.code);
        assert!(matches!(stale, Err(AppError::InvalidOrExpired)));

        manager.validate(&participant, &second.code).unwrap();

        assert!(store.find_unused_codes(CONTACT).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_reissue_leaves_one_live_code() {
        let (manager, store, _notifier, _clock, _participant) = setup();

        manager.issue(CONTACT).await.unwrap();
        for _ in 0..4 {
            manager.reissue(CONTACT).await.unwrap();
        }

        assert_eq!(store.find_unused_codes(CONTACT).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_code_live() {
        let (manager, store, notifier, _clock, participant) = setup();

        notifier.set_failing(true);
        let result = manager.issue(CONTACT).await;
        assert!(matches!(result, Err(AppError::DeliveryFailed)));

        // The code was persisted unused, so a reissue gets through and
        // the stranded code still validates until then.
        let stranded = store.find_unused_codes(CONTACT).unwrap();
        assert_eq!(stranded.len(), 1);

        manager.validate(&participant, &stranded[0].code).unwrap();
    }
}
