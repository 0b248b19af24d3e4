use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use tracing::{info, warn};

pub struct Config {
    pub port: u16,
    pub whatsapp_api_url: String,
    pub whatsapp_access_token: String,
    pub code_ttl_minutes: i64,
    pub resend_cooldown_secs: i64,
    pub raffle_title: String,
    pub raffle_description: String,
    pub raffle_prize: String,
    pub raffle_duration_hours: i64,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("RUST_PORT", "8080"),
            whatsapp_api_url: try_load(
                "WHATSAPP_API_URL",
                "https://graph.facebook.com/v17.0/me/messages",
            ),
            whatsapp_access_token: read_secret("WHATSAPP_ACCESS_TOKEN"),
            code_ttl_minutes: try_load("CODE_TTL_MINUTES", "10"),
            resend_cooldown_secs: try_load("RESEND_COOLDOWN_SECS", "60"),
            raffle_title: try_load("RAFFLE_TITLE", "Raffle"),
            raffle_description: try_load("RAFFLE_DESCRIPTION", ""),
            raffle_prize: try_load("RAFFLE_PRIZE", "Prize"),
            raffle_duration_hours: try_load("RAFFLE_DURATION_HOURS", "168"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn read_secret(secret_name: &str) -> String {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            warn!("Failed to read {secret_name} from file: {e}");
        })
        .expect("Secrets misconfigured!")
}
