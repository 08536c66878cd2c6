use crate::domain::{models::TimerSession, TimeTrackingError};

/// Fixed key under which the timer session is stored.
pub const TIMER_SESSION_KEY: &str = "tally_timer_session";

/// Outbound port for the durable client-side slot holding the timer session.
///
/// The slot is the single source of truth across restarts. Writes are
/// last-writer-wins; implementations do no cross-process locking.
pub trait SessionSlot: Send + Sync {
    /// Read the stored session, `None` when the slot is empty.
    fn load(&self) -> Result<Option<TimerSession>, TimeTrackingError>;

    fn save(&self, session: &TimerSession) -> Result<(), TimeTrackingError>;

    /// Empty the slot. Clearing an empty slot is not an error.
    fn clear(&self) -> Result<(), TimeTrackingError>;
}

impl<S: SessionSlot + ?Sized> SessionSlot for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<TimerSession>, TimeTrackingError> {
        (**self).load()
    }

    fn save(&self, session: &TimerSession) -> Result<(), TimeTrackingError> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<(), TimeTrackingError> {
        (**self).clear()
    }
}
