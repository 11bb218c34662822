//! Monotonic message clock
//!
//! `created_at` is the only ordering key inside a conversation, so two
//! appends in the same process must never share a timestamp or go backwards
//! when the wall clock does. Resolution is one microsecond, which is also
//! what Postgres `TIMESTAMPTZ` stores.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

#[derive(Debug, Default)]
pub struct MonotonicClock {
    last_micros: AtomicI64,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall-clock now, bumped past the previous reading if needed
    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let (Ok(previous) | Err(previous)) =
            self.last_micros
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                    Some(wall.max(last + 1))
                });
        let issued = wall.max(previous + 1);
        DateTime::from_timestamp_micros(issued).unwrap_or_else(Utc::now)
    }
}
