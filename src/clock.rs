//! Injected wall clock.
//!
//! Code expiry and the resend cool-down compare stored timestamps
//! against the current time at call time, no timers involved. Taking
//! the clock as a trait lets tests drive expiry without sleeping.

use chrono::{DateTime, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
