use crate::domain::{
    models::{
        hours_from_millis, NewTimeEntry, ProjectId, TaskId, TeamMemberId, TimerDisplayState,
        TimerSession, TimerState,
    },
    ports::outbound::{Clock, SessionSlot},
    TimeTrackingError,
};

/// Owns the single in-progress timer session.
///
/// Every mutation is written to the durable slot before it is applied in
/// memory, so a failed write leaves the manager unchanged.
pub struct TimerSessionManager<S, C> {
    slot: S,
    clock: C,
    session: Option<TimerSession>,
}

impl<S: SessionSlot, C: Clock> TimerSessionManager<S, C> {
    /// An idle manager. Does not read the slot; see [`Self::restore`].
    pub fn new(slot: S, clock: C) -> Self {
        Self {
            slot,
            clock,
            session: None,
        }
    }

    /// A manager resuming whatever session the slot holds.
    ///
    /// A stored session that is no longer running is cleared from the slot
    /// and the manager starts idle.
    pub fn restore(slot: S, clock: C) -> Result<Self, TimeTrackingError> {
        let session = match slot.load()? {
            Some(session) if !session.running => {
                tracing::warn!(
                    project_id = %session.project_id,
                    "clearing stopped timer session left in slot"
                );
                slot.clear()?;
                None
            }
            other => other,
        };
        if let Some(session) = &session {
            tracing::debug!(
                project_id = %session.project_id,
                state = %session.state(),
                "restored timer session"
            );
        }
        Ok(Self {
            slot,
            clock,
            session,
        })
    }

    pub fn session(&self) -> Option<&TimerSession> {
        self.session.as_ref()
    }

    pub fn state(&self) -> TimerState {
        self.session
            .as_ref()
            .map_or(TimerState::Idle, TimerSession::state)
    }

    pub fn start(
        &mut self,
        project_id: impl Into<ProjectId>,
        task_id: Option<TaskId>,
        description: Option<&str>,
    ) -> Result<&TimerSession, TimeTrackingError> {
        let project_id = project_id.into();
        if project_id.is_blank() {
            return Err(TimeTrackingError::validation("project id is required"));
        }
        self.ensure_state("start", |state| state == TimerState::Idle)?;

        let session = TimerSession::new(project_id, self.clock.now())
            .with_task(task_id)
            .with_description(description.unwrap_or_default());
        tracing::debug!(project_id = %session.project_id, "timer started");
        self.commit(session)
    }

    pub fn pause(&mut self) -> Result<&TimerSession, TimeTrackingError> {
        let session = self
            .current("pause", TimerState::Running)?
            .paused_at(self.clock.now());
        tracing::debug!(
            accumulated_active_ms = session.accumulated_active_ms,
            "timer paused"
        );
        self.commit(session)
    }

    pub fn resume(&mut self) -> Result<&TimerSession, TimeTrackingError> {
        let mut session = self.current("resume", TimerState::Paused)?;
        session.resume_anchor = self.clock.now();
        session.paused = false;
        tracing::debug!("timer resumed");
        self.commit(session)
    }

    /// Finish the session and turn its active time into a draft entry.
    ///
    /// On [`TimeTrackingError::ZeroDuration`] the session is kept so the
    /// caller can resume or discard it.
    pub fn stop(
        &mut self,
        team_member_id: &TeamMemberId,
    ) -> Result<NewTimeEntry, TimeTrackingError> {
        let session = match &self.session {
            Some(session) => session,
            None => {
                return Err(TimeTrackingError::InvalidState {
                    operation: "stop",
                    state: TimerState::Idle,
                })
            }
        };
        if session.project_id.is_blank() {
            return Err(TimeTrackingError::IncompleteSession("project id"));
        }
        if team_member_id.is_blank() {
            return Err(TimeTrackingError::IncompleteSession("team member id"));
        }

        let now = self.clock.now();
        let hours = hours_from_millis(session.active_millis_at(now));
        if hours <= 0.0 {
            return Err(TimeTrackingError::ZeroDuration);
        }

        let draft = NewTimeEntry {
            project_id: session.project_id.clone(),
            task_id: session.task_id.clone(),
            team_member_id: team_member_id.clone(),
            date: session.actual_start_time.date(),
            start_time: Some(session.actual_start_time),
            end_time: Some(now),
            hours,
            description: session.description.clone(),
            billable: true,
            client_billed: false,
            contractor_paid: false,
        };

        self.slot.clear()?;
        self.session = None;
        tracing::debug!(project_id = %draft.project_id, hours, "timer stopped");
        Ok(draft)
    }

    /// Drop the session without producing an entry.
    pub fn discard(&mut self) -> Result<Option<TimerSession>, TimeTrackingError> {
        self.slot.clear()?;
        let discarded = self.session.take();
        if discarded.is_some() {
            tracing::debug!("timer discarded");
        }
        Ok(discarded)
    }

    pub fn display_state(&self) -> TimerDisplayState {
        match &self.session {
            Some(session) => TimerDisplayState {
                running: session.running,
                paused: session.paused,
                elapsed_seconds: session.active_millis_at(self.clock.now()) / 1000,
            },
            None => TimerDisplayState::default(),
        }
    }

    fn ensure_state(
        &self,
        operation: &'static str,
        allowed: impl Fn(TimerState) -> bool,
    ) -> Result<(), TimeTrackingError> {
        let state = self.state();
        if allowed(state) {
            Ok(())
        } else {
            Err(TimeTrackingError::InvalidState { operation, state })
        }
    }

    fn current(
        &self,
        operation: &'static str,
        required: TimerState,
    ) -> Result<TimerSession, TimeTrackingError> {
        self.ensure_state(operation, |state| state == required)?;
        self.session
            .clone()
            .ok_or(TimeTrackingError::InvalidState {
                operation,
                state: TimerState::Idle,
            })
    }

    fn commit(&mut self, session: TimerSession) -> Result<&TimerSession, TimeTrackingError> {
        self.slot.save(&session)?;
        Ok(&*self.session.insert(session))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::adapters::outbound::{ManualClock, MemorySessionSlot};
    use time::macros::{date, datetime};
    use time::Duration;

    fn manager() -> (
        TimerSessionManager<Arc<MemorySessionSlot>, ManualClock>,
        Arc<MemorySessionSlot>,
        ManualClock,
    ) {
        let slot = Arc::new(MemorySessionSlot::new());
        let clock = ManualClock::new(datetime!(2024-03-01 09:00:00 UTC));
        (
            TimerSessionManager::new(slot.clone(), clock.clone()),
            slot,
            clock,
        )
    }

    fn member() -> TeamMemberId {
        TeamMemberId::new("tm-1")
    }

    #[test]
    fn paused_interval_is_excluded_from_hours() {
        let (mut timer, slot, clock) = manager();
        timer
            .start("p-1", Some(TaskId::new("t-1")), Some("review"))
            .expect("start");

        clock.set(datetime!(2024-03-01 09:30:00 UTC));
        timer.pause().expect("pause");
        clock.set(datetime!(2024-03-01 10:00:00 UTC));
        timer.resume().expect("resume");
        clock.set(datetime!(2024-03-01 10:15:00 UTC));

        let draft = timer.stop(&member()).expect("stop");

        assert_eq!(draft.hours, 0.75);
        assert_eq!(draft.date, date!(2024 - 03 - 01));
        assert_eq!(draft.start_time, Some(datetime!(2024-03-01 09:00:00 UTC)));
        assert_eq!(draft.end_time, Some(datetime!(2024-03-01 10:15:00 UTC)));
        assert_eq!(draft.task_id, Some(TaskId::new("t-1")));
        assert_eq!(draft.description, "review");
        assert!(draft.billable);
        assert!(!draft.client_billed && !draft.contractor_paid);
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(slot.raw().is_none());
    }

    #[test]
    fn pause_resume_cycles_conserve_active_time() {
        let (mut timer, _slot, clock) = manager();
        timer.start("p-1", None, None).expect("start");

        let mut expected_active = Duration::ZERO;
        for cycle in 1..=6 {
            let active = Duration::minutes(7 * cycle);
            clock.advance(active);
            expected_active += active;
            timer.pause().expect("pause");
            clock.advance(Duration::minutes(13));
            timer.resume().expect("resume");
        }
        clock.advance(Duration::minutes(3));
        expected_active += Duration::minutes(3);

        let display = timer.display_state();
        assert_eq!(display.elapsed_seconds, expected_active.whole_seconds());
        assert_eq!(
            timer.stop(&member()).expect("stop").hours,
            hours_from_millis(expected_active.whole_milliseconds() as i64)
        );
    }

    #[test]
    fn display_state_freezes_while_paused() {
        let (mut timer, _slot, clock) = manager();
        assert_eq!(timer.display_state(), TimerDisplayState::default());

        timer.start("p-1", None, None).expect("start");
        clock.advance(Duration::seconds(90));
        timer.pause().expect("pause");
        clock.advance(Duration::hours(2));

        let display = timer.display_state();
        assert!(display.running && display.paused);
        assert_eq!(display.elapsed_seconds, 90);
    }

    #[test]
    fn every_mutation_is_persisted_and_restorable() {
        let (mut timer, slot, clock) = manager();
        timer.start("p-1", None, Some("deploy")).expect("start");
        clock.advance(Duration::minutes(20));
        timer.pause().expect("pause");

        let restored = TimerSessionManager::restore(slot.clone(), clock.clone()).expect("restore");
        assert_eq!(restored.state(), TimerState::Paused);
        assert_eq!(restored.session(), timer.session());
        assert_eq!(
            restored.session().map(|s| s.accumulated_active_ms),
            Some(20 * 60 * 1000)
        );

        let mut restored = restored;
        restored.resume().expect("resume after restore");
        clock.advance(Duration::minutes(10));
        assert_eq!(restored.stop(&member()).expect("stop").hours, 0.5);
    }

    #[test]
    fn restore_from_empty_slot_is_idle() {
        let slot = MemorySessionSlot::new();
        let clock = ManualClock::new(datetime!(2024-03-01 09:00:00 UTC));
        let timer = TimerSessionManager::restore(slot, clock).expect("restore");
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[test]
    fn restore_clears_a_stopped_session() {
        let (_timer, slot, clock) = manager();
        let mut stopped = TimerSession::new("p-1", datetime!(2024-03-01 08:00:00 UTC));
        stopped.running = false;
        stopped.accumulated_active_ms = 60 * 60 * 1000;
        slot.save(&stopped).expect("seed slot");

        let mut timer = TimerSessionManager::restore(slot.clone(), clock).expect("restore");
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(timer.session().is_none());
        assert!(slot.raw().is_none());
        assert!(matches!(
            timer.stop(&member()),
            Err(TimeTrackingError::InvalidState { operation: "stop", .. })
        ));
        timer.start("p-2", None, None).expect("start after clearing");
    }

    #[test]
    fn restore_surfaces_corrupt_slot() {
        let slot = MemorySessionSlot::with_raw("garbage");
        let clock = ManualClock::new(datetime!(2024-03-01 09:00:00 UTC));
        assert!(matches!(
            TimerSessionManager::restore(slot, clock),
            Err(TimeTrackingError::SessionStore(_))
        ));
    }

    #[test]
    fn start_requires_project_and_idle_timer() {
        let (mut timer, slot, _clock) = manager();
        assert!(matches!(
            timer.start("  ", None, None),
            Err(TimeTrackingError::Validation(_))
        ));
        assert!(slot.raw().is_none());

        timer.start("p-1", None, None).expect("start");
        assert!(matches!(
            timer.start("p-2", None, None),
            Err(TimeTrackingError::InvalidState {
                operation: "start",
                state: TimerState::Running
            })
        ));
        assert_eq!(
            timer.session().map(|s| s.project_id.as_str()),
            Some("p-1")
        );
    }

    #[test]
    fn transitions_from_wrong_state_are_rejected() {
        let (mut timer, _slot, _clock) = manager();
        assert!(matches!(
            timer.pause(),
            Err(TimeTrackingError::InvalidState { state: TimerState::Idle, .. })
        ));
        assert!(matches!(
            timer.resume(),
            Err(TimeTrackingError::InvalidState { state: TimerState::Idle, .. })
        ));
        assert!(matches!(
            timer.stop(&member()),
            Err(TimeTrackingError::InvalidState { operation: "stop", .. })
        ));

        timer.start("p-1", None, None).expect("start");
        assert!(matches!(
            timer.resume(),
            Err(TimeTrackingError::InvalidState { state: TimerState::Running, .. })
        ));
        timer.pause().expect("pause");
        assert!(matches!(
            timer.pause(),
            Err(TimeTrackingError::InvalidState { state: TimerState::Paused, .. })
        ));
    }

    #[test]
    fn stop_without_member_is_incomplete() {
        let (mut timer, _slot, clock) = manager();
        timer.start("p-1", None, None).expect("start");
        clock.advance(Duration::hours(1));
        assert!(matches!(
            timer.stop(&TeamMemberId::new("")),
            Err(TimeTrackingError::IncompleteSession(_))
        ));
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn zero_duration_keeps_the_session() {
        let (mut timer, slot, clock) = manager();
        timer.start("p-1", None, None).expect("start");
        clock.advance(Duration::seconds(10));

        assert!(matches!(
            timer.stop(&member()),
            Err(TimeTrackingError::ZeroDuration)
        ));
        assert_eq!(timer.state(), TimerState::Running);
        assert!(slot.raw().is_some());
    }

    #[test]
    fn backwards_clock_never_reduces_active_time() {
        let (mut timer, _slot, clock) = manager();
        timer.start("p-1", None, None).expect("start");
        clock.advance(Duration::minutes(30));
        timer.pause().expect("pause");
        timer.resume().expect("resume");
        clock.advance(Duration::minutes(-10));

        assert_eq!(timer.display_state().elapsed_seconds, 30 * 60);
    }

    #[test]
    fn discard_clears_session_and_slot() {
        let (mut timer, slot, _clock) = manager();
        assert!(timer.discard().expect("discard idle").is_none());

        timer.start("p-1", None, None).expect("start");
        let discarded = timer.discard().expect("discard");
        assert_eq!(discarded.map(|s| s.project_id), Some(ProjectId::new("p-1")));
        assert_eq!(timer.state(), TimerState::Idle);
        assert!(slot.raw().is_none());
    }
}
