use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
    clock::SystemClock,
    config::Config,
    models::Raffle,
    notifier::WhatsAppNotifier,
    raffle::RaffleService,
    store::{MemoryStore, Store},
};

pub type AppService = RaffleService<MemoryStore, WhatsAppNotifier, SystemClock>;

pub struct AppState {
    pub config: Config,
    pub service: AppService,
}

impl AppState {
    pub fn new() -> Arc<Self> {
        let config = Config::load();

        let store = Arc::new(MemoryStore::new());
        seed_raffle(&store, &config);

        let notifier = WhatsAppNotifier::new(&config);
        let service = RaffleService::new(
            store,
            notifier,
            SystemClock,
            config.code_ttl_minutes,
            config.resend_cooldown_secs,
        );

        Arc::new(Self { config, service })
    }
}

/// Raffle metadata administration is out of scope here, so the single
/// active raffle is opened at startup from configuration.
fn seed_raffle(store: &MemoryStore, config: &Config) {
    let now = Utc::now();

    store
        .insert_raffle(Raffle {
            id: Uuid::new_v4(),
            title: config.raffle_title.clone(),
            description: config.raffle_description.clone(),
            prize: config.raffle_prize.clone(),
            start_date: now,
            end_date: Some(now + Duration::hours(config.raffle_duration_hours)),
            is_active: true,
            winner_id: None,
            drawn_at: None,
            seed: None,
        })
        .expect("Fresh store cannot be poisoned");

    info!("Opened raffle \"{}\"", config.raffle_title);
}
