use chrono::{DateTime, Duration, Utc};
use rand::{thread_rng, Rng};
use regex::Regex;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();

    String::from_utf8(digits).unwrap()
}

fn random_base36(len: usize) -> String {
    let mut rng = thread_rng();

    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Ticket identifiers combine a base-36 millisecond timestamp with a
/// random suffix. Low collision odds only; the store's uniqueness
/// constraint on the ticket column is the real guarantee.
pub fn generate_ticket_number() -> String {
    let timestamp = to_base36(Utc::now().timestamp_millis() as u64);

    format!("{}-{}", timestamp, random_base36(6)).to_uppercase()
}

/// Always exactly 6 digits, zero-padded.
pub fn generate_verification_code() -> String {
    format!("{:06}", thread_rng().gen_range(0..1_000_000))
}

/// Draw seed published alongside the winner. 26 random base-36 chars,
/// generated before the draw so it cannot be ground against the
/// entrant list.
pub fn generate_raffle_seed() -> String {
    format!("{}{}", random_base36(13), random_base36(13))
}

pub fn normalize_whatsapp(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

pub fn validate_email(email: &str) -> bool {
    let re = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();

    re.is_match(email)
}

pub fn validate_whatsapp(phone: &str) -> bool {
    let digits = normalize_whatsapp(phone).len();

    (10..=15).contains(&digits)
}

pub fn validate_telegram(handle: &str) -> bool {
    let re = Regex::new(r"^@[a-zA-Z0-9_]{5,32}$").unwrap();

    re.is_match(handle)
}

pub fn format_time_remaining(end_date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = end_date - now;

    if diff <= Duration::zero() {
        return "Ended".to_string();
    }

    let days = diff.num_days();
    let hours = diff.num_hours() % 24;
    let minutes = diff.num_minutes() % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
