//! # Notifier
//!
//! Outbound messaging seam. The production implementation posts to the
//! WhatsApp Cloud API; tests swap in a stub. Delivery failure is a
//! recoverable condition reported back as `false`, never a panic.

use std::{future::Future, time::Duration};

use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use crate::{config::Config, utils::normalize_whatsapp};

pub trait Notifier: Send + Sync {
    /// Returns whether the message was delivered.
    fn send(&self, to: &str, message: &str) -> impl Future<Output = bool> + Send;
}

#[derive(Clone)]
pub struct WhatsAppNotifier {
    client: Client,
    api_url: String,
    access_token: String,
}

impl WhatsAppNotifier {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_url: config.whatsapp_api_url.clone(),
            access_token: config.whatsapp_access_token.clone(),
        }
    }
}

impl Notifier for WhatsAppNotifier {
    async fn send(&self, to: &str, message: &str) -> bool {
        let payload = json!({
            "messaging_product": "whatsapp",
            "to": normalize_whatsapp(to),
            "type": "text",
            "text": { "body": message }
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(res) if res.status().is_success() => {
                debug!("WhatsApp message delivered");
                true
            }
            Ok(res) => {
                warn!("WhatsApp API rejected message: {}", res.status());
                false
            }
            Err(err) => {
                warn!("WhatsApp send failed: {err}");
                false
            }
        }
    }
}

pub fn verification_message(code: &str) -> String {
    format!(
        "Your verification code: {code}\n\nDo not share this code with anyone.\n\nValid for 10 minutes."
    )
}

pub fn winner_message(name: &str, prize: &str) -> String {
    format!(
        "Congratulations {name}!\n\nYou are the raffle WINNER!\n\nPrize: {prize}\n\nWe will contact you shortly."
    )
}

#[cfg(test)]
pub mod test {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    };

    use super::Notifier;

    /// Records outgoing messages; flips to failing when asked.
    #[derive(Clone, Default)]
    pub struct StubNotifier {
        pub sent: Arc<Mutex<Vec<(String, String)>>>,
        fail: Arc<AtomicBool>,
    }

    impl StubNotifier {
        pub fn set_failing(&self, failing: bool) {
            self.fail.store(failing, Ordering::SeqCst);
        }

        pub fn sent_count(&self) -> usize {
            self.sent.lock().unwrap().len()
        }

        pub fn last_message(&self) -> Option<(String, String)> {
            self.sent.lock().unwrap().last().cloned()
        }
    }

    impl Notifier for StubNotifier {
        async fn send(&self, to: &str, message: &str) -> bool {
            if self.fail.load(Ordering::SeqCst) {
                return false;
            }

            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), message.to_string()));

            true
        }
    }
}
