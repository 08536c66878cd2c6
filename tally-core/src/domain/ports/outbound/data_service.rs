//! Data service ports (outbound).
//!
//! The external data service owns storage, ids and schema. The core only
//! needs list/filter/create/update/delete over a few entity types.

use async_trait::async_trait;
use time::Date;

use crate::domain::{
    models::{NewTimeEntry, Project, ProjectId, TeamMember, TeamMemberId, TimeEntry, TimeEntryId},
    TimeTrackingError,
};

/// Sort order for filtered time entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntrySort {
    #[default]
    DateAscending,
    DateDescending,
}

/// Server-side filter for time entries. Unset fields match everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimeEntryQuery {
    pub project_id: Option<ProjectId>,
    pub team_member_id: Option<TeamMemberId>,
    /// Inclusive date bounds.
    pub date_range: Option<(Date, Date)>,
    pub sort: EntrySort,
    pub limit: Option<usize>,
}

impl TimeEntryQuery {
    pub fn for_project(project_id: impl Into<ProjectId>) -> Self {
        Self {
            project_id: Some(project_id.into()),
            ..Self::default()
        }
    }

    pub fn with_team_member(mut self, team_member_id: impl Into<TeamMemberId>) -> Self {
        self.team_member_id = Some(team_member_id.into());
        self
    }

    pub fn with_date_range(mut self, start: Date, end: Date) -> Self {
        self.date_range = Some((start, end));
        self
    }

    pub fn with_sort(mut self, sort: EntrySort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &TimeEntry) -> bool {
        if self
            .project_id
            .as_ref()
            .is_some_and(|id| *id != entry.project_id)
        {
            return false;
        }
        if self
            .team_member_id
            .as_ref()
            .is_some_and(|id| *id != entry.team_member_id)
        {
            return false;
        }
        match self.date_range {
            Some((start, end)) => entry.date >= start && entry.date <= end,
            None => true,
        }
    }
}

/// Outbound port for time entry persistence.
#[async_trait]
pub trait TimeEntryRepository: Send + Sync + 'static {
    async fn list_time_entries(&self) -> Result<Vec<TimeEntry>, TimeTrackingError>;

    async fn filter_time_entries(
        &self,
        query: &TimeEntryQuery,
    ) -> Result<Vec<TimeEntry>, TimeTrackingError>;

    async fn get_time_entry(
        &self,
        id: &TimeEntryId,
    ) -> Result<Option<TimeEntry>, TimeTrackingError>;

    /// Persist a new entry. The data service assigns the id.
    async fn create_time_entry(&self, entry: &NewTimeEntry)
        -> Result<TimeEntry, TimeTrackingError>;

    /// Replace the fields of an existing entry.
    async fn update_time_entry(
        &self,
        id: &TimeEntryId,
        entry: &NewTimeEntry,
    ) -> Result<TimeEntry, TimeTrackingError>;

    async fn delete_time_entry(&self, id: &TimeEntryId) -> Result<(), TimeTrackingError>;
}

/// Outbound port for project lookups.
#[async_trait]
pub trait ProjectRepository: Send + Sync + 'static {
    async fn list_projects(&self) -> Result<Vec<Project>, TimeTrackingError>;

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, TimeTrackingError>;
}

/// Outbound port for team member lookups.
#[async_trait]
pub trait TeamMemberRepository: Send + Sync + 'static {
    async fn list_team_members(&self) -> Result<Vec<TeamMember>, TimeTrackingError>;
}
