use serde::{Deserialize, Serialize};
use strum::Display;
use time::OffsetDateTime;

use super::{ProjectId, TaskId};

/// Lifecycle position of the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// An in-progress work session.
///
/// Only the elapsed *active* time is accumulated: pausing folds the interval
/// since `resume_anchor` into `accumulated_active_ms`, resuming moves the
/// anchor. `actual_start_time` never changes after the session is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub running: bool,
    pub paused: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub actual_start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub resume_anchor: OffsetDateTime,
    pub accumulated_active_ms: i64,
    pub project_id: ProjectId,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    #[serde(default)]
    pub description: String,
}

impl TimerSession {
    pub fn new(project_id: impl Into<ProjectId>, started_at: OffsetDateTime) -> Self {
        Self {
            running: true,
            paused: false,
            actual_start_time: started_at,
            resume_anchor: started_at,
            accumulated_active_ms: 0,
            project_id: project_id.into(),
            task_id: None,
            description: String::new(),
        }
    }

    pub fn with_task(mut self, task_id: Option<TaskId>) -> Self {
        self.task_id = task_id;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn state(&self) -> TimerState {
        match (self.running, self.paused) {
            (true, true) => TimerState::Paused,
            (true, false) => TimerState::Running,
            (false, _) => TimerState::Idle,
        }
    }

    /// This session paused at `at`, with the active time up to then folded
    /// into the accumulated total. Already paused sessions are unchanged.
    pub fn paused_at(mut self, at: OffsetDateTime) -> Self {
        self.accumulated_active_ms = self.active_millis_at(at);
        self.paused = true;
        self
    }

    /// Total active milliseconds as of `now`.
    ///
    /// A clock that moved backwards never reduces the accumulated total.
    pub fn active_millis_at(&self, now: OffsetDateTime) -> i64 {
        if self.state() == TimerState::Running {
            let since_anchor = (now - self.resume_anchor).whole_milliseconds() as i64;
            self.accumulated_active_ms + since_anchor.max(0)
        } else {
            self.accumulated_active_ms
        }
    }
}

/// Read-only snapshot for a periodic UI refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerDisplayState {
    pub running: bool,
    pub paused: bool,
    pub elapsed_seconds: i64,
}

impl TimerDisplayState {
    /// Elapsed time as (hours, minutes, seconds).
    pub fn elapsed_hms(&self) -> (i64, i64, i64) {
        let total_seconds = self.elapsed_seconds;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        (hours, minutes, seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use time::Duration;

    #[test]
    fn running_session_counts_time_since_anchor() {
        let start = datetime!(2024-03-01 09:00:00 UTC);
        let session = TimerSession::new("p-1", start);
        assert_eq!(
            session.active_millis_at(start + Duration::minutes(5)),
            5 * 60 * 1000
        );
    }

    #[test]
    fn paused_session_ignores_wall_clock() {
        let start = datetime!(2024-03-01 09:00:00 UTC);
        let mut session = TimerSession::new("p-1", start);
        session.paused = true;
        session.accumulated_active_ms = 1_000;
        assert_eq!(session.active_millis_at(start + Duration::hours(3)), 1_000);
    }

    #[test]
    fn paused_at_freezes_active_time() {
        let start = datetime!(2024-03-01 09:00:00 UTC);
        let paused = TimerSession::new("p-1", start).paused_at(start + Duration::minutes(40));
        assert_eq!(paused.state(), TimerState::Paused);
        assert_eq!(
            paused.active_millis_at(start + Duration::hours(5)),
            40 * 60 * 1000
        );

        let again = paused.clone().paused_at(start + Duration::hours(2));
        assert_eq!(again, paused);
    }

    #[test]
    fn elapsed_hms_splits_seconds() {
        let display = TimerDisplayState {
            running: true,
            paused: false,
            elapsed_seconds: 3_725,
        };
        assert_eq!(display.elapsed_hms(), (1, 2, 5));
    }

    #[test]
    fn session_serializes_with_rfc3339_timestamps() {
        let start = datetime!(2024-03-01 09:00:00 UTC);
        let session = TimerSession::new("p-1", start).with_description("standup");
        let json = serde_json::to_value(&session).expect("serialize session");
        assert_eq!(json["actualStartTime"], "2024-03-01T09:00:00Z");
        assert_eq!(json["accumulatedActiveMs"], 0);

        let back: TimerSession = serde_json::from_value(json).expect("deserialize session");
        assert_eq!(back, session);
    }
}
