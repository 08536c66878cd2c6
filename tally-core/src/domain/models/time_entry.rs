use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use super::{ProjectId, TaskId, TeamMemberId, TimeEntryId};
use crate::domain::TimeTrackingError;

pub const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Round an hour quantity to two decimal places.
pub fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Convert a duration in milliseconds to hours rounded to two decimals.
pub fn hours_from_millis(millis: i64) -> f64 {
    round_hours(millis as f64 / MILLIS_PER_HOUR)
}

/// Derive the hours of an entry from its wall-clock bounds.
///
/// Fails with [`TimeTrackingError::InvalidInterval`] unless `end > start`.
pub fn derive_hours(start: OffsetDateTime, end: OffsetDateTime) -> Result<f64, TimeTrackingError> {
    if end <= start {
        return Err(TimeTrackingError::InvalidInterval);
    }
    let millis = (end - start).whole_milliseconds();
    Ok(hours_from_millis(millis as i64))
}

/// A persisted record of work performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub project_id: ProjectId,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    pub team_member_id: TeamMemberId,
    pub date: Date,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub hours: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub client_billed: bool,
    #[serde(default)]
    pub contractor_paid: bool,
}

impl TimeEntry {
    /// The mutable fields of this entry as a draft, for editing.
    pub fn to_draft(&self) -> NewTimeEntry {
        NewTimeEntry {
            project_id: self.project_id.clone(),
            task_id: self.task_id.clone(),
            team_member_id: self.team_member_id.clone(),
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            hours: self.hours,
            description: self.description.clone(),
            billable: self.billable,
            client_billed: self.client_billed,
            contractor_paid: self.contractor_paid,
        }
    }
}

/// A time entry that has not been persisted yet.
///
/// Both creating and editing an entry go through a draft, so validation
/// runs in one place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTimeEntry {
    pub project_id: ProjectId,
    #[serde(default)]
    pub task_id: Option<TaskId>,
    pub team_member_id: TeamMemberId,
    pub date: Date,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub start_time: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub end_time: Option<OffsetDateTime>,
    pub hours: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub billable: bool,
    #[serde(default)]
    pub client_billed: bool,
    #[serde(default)]
    pub contractor_paid: bool,
}

impl NewTimeEntry {
    /// A billable draft with a fixed number of hours and no wall-clock bounds.
    pub fn new(
        project_id: impl Into<ProjectId>,
        team_member_id: impl Into<TeamMemberId>,
        date: Date,
        hours: f64,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            task_id: None,
            team_member_id: team_member_id.into(),
            date,
            start_time: None,
            end_time: None,
            hours,
            description: String::new(),
            billable: true,
            client_billed: false,
            contractor_paid: false,
        }
    }

    pub fn with_task(mut self, task_id: impl Into<TaskId>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_billable(mut self, billable: bool) -> Self {
        self.billable = billable;
        self
    }

    pub fn with_client_billed(mut self, client_billed: bool) -> Self {
        self.client_billed = client_billed;
        self
    }

    pub fn with_contractor_paid(mut self, contractor_paid: bool) -> Self {
        self.contractor_paid = contractor_paid;
        self
    }

    /// Set both wall-clock bounds and recompute `hours` from them.
    pub fn with_times(
        mut self,
        start_time: OffsetDateTime,
        end_time: OffsetDateTime,
    ) -> Result<Self, TimeTrackingError> {
        self.hours = derive_hours(start_time, end_time)?;
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        Ok(self)
    }

    /// Check the draft can be persisted.
    ///
    /// `hours` is not re-derived here: a timer draft carries active hours
    /// that exclude paused intervals. Editing the bounds goes through
    /// [`NewTimeEntry::with_times`], which recomputes them.
    pub fn normalized(self) -> Result<Self, TimeTrackingError> {
        if self.project_id.is_blank() {
            return Err(TimeTrackingError::validation("project id is required"));
        }
        if self.team_member_id.is_blank() {
            return Err(TimeTrackingError::validation("team member id is required"));
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if end <= start {
                return Err(TimeTrackingError::InvalidInterval);
            }
        }
        if !self.hours.is_finite() || self.hours <= 0.0 {
            return Err(TimeTrackingError::validation(
                "hours must be greater than zero",
            ));
        }
        Ok(self)
    }

    /// Attach an identifier, producing the persisted shape.
    pub fn into_entry(self, id: impl Into<TimeEntryId>) -> TimeEntry {
        TimeEntry {
            id: id.into(),
            project_id: self.project_id,
            task_id: self.task_id,
            team_member_id: self.team_member_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            hours: self.hours,
            description: self.description,
            billable: self.billable,
            client_billed: self.client_billed,
            contractor_paid: self.contractor_paid,
        }
    }
}
