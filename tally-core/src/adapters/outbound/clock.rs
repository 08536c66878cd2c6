use std::sync::{Arc, Mutex, PoisonError};

use time::{Duration, OffsetDateTime, UtcOffset};

use crate::domain::ports::outbound::Clock;

/// Wall-clock time in the local offset, falling back to UTC when the offset
/// cannot be determined.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        let now = OffsetDateTime::now_utc();
        match UtcOffset::current_local_offset() {
            Ok(local_offset) => now.to_offset(local_offset),
            Err(_) => now,
        }
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl ManualClock {
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, now: OffsetDateTime) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn manual_clock_advances_and_shares_state() {
        let clock = ManualClock::new(datetime!(2024-03-01 09:00:00 UTC));
        let handle = clock.clone();
        handle.advance(Duration::minutes(30));
        assert_eq!(clock.now(), datetime!(2024-03-01 09:30:00 UTC));

        clock.set(datetime!(2024-03-02 00:00:00 UTC));
        assert_eq!(handle.now(), datetime!(2024-03-02 00:00:00 UTC));
    }
}
