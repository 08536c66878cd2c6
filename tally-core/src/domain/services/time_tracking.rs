use std::{collections::HashSet, sync::Arc};

use async_trait::async_trait;
use time::Date;

use crate::domain::{
    models::{
        derive_hours, AccountingReport, EntryFilter, MonthlyBudgetStatus, NewTimeEntry, Project,
        ProjectId, TimeEntry, TimeEntryId,
    },
    ports::{
        inbound::TimeTrackingService,
        outbound::{ProjectRepository, TeamMemberRepository, TimeEntryQuery, TimeEntryRepository},
    },
    services::{build_report, compute_monthly_status, filter_entries, month_window},
    TimeTrackingError,
};

/// Implementation of the TimeTrackingService inbound port.
///
/// Validates drafts, runs the retainer budget check before every save and
/// delegates persistence to the data service ports. Data service failures
/// are returned as-is; nothing is retried.
pub struct TimeTrackingServiceImpl<E, P, M> {
    entries: Arc<E>,
    projects: Arc<P>,
    members: Arc<M>,
}

impl<E, P, M> TimeTrackingServiceImpl<E, P, M> {
    pub fn new(entries: Arc<E>, projects: Arc<P>, members: Arc<M>) -> Self {
        Self {
            entries,
            projects,
            members,
        }
    }
}

impl<E, P, M> TimeTrackingServiceImpl<E, P, M>
where
    E: TimeEntryRepository,
    P: ProjectRepository,
    M: TeamMemberRepository,
{
    async fn require_project(&self, id: &ProjectId) -> Result<Project, TimeTrackingError> {
        self.projects
            .get_project(id)
            .await?
            .ok_or_else(|| TimeTrackingError::ProjectNotFound(id.to_string()))
    }

    async fn require_entry(&self, id: &TimeEntryId) -> Result<TimeEntry, TimeTrackingError> {
        self.entries
            .get_time_entry(id)
            .await?
            .ok_or_else(|| TimeTrackingError::TimeEntryNotFound(id.to_string()))
    }

    async fn status_for(
        &self,
        project: &Project,
        reference_date: Date,
        exclude_entry_id: Option<&TimeEntryId>,
    ) -> Result<Option<MonthlyBudgetStatus>, TimeTrackingError> {
        if !project.is_retainer() || project.budget_hours <= 0.0 {
            return Ok(None);
        }
        let Some((month_start, month_end)) = month_window(reference_date) else {
            return Ok(None);
        };
        let query =
            TimeEntryQuery::for_project(project.id.clone()).with_date_range(month_start, month_end);
        let entries = self.entries.filter_time_entries(&query).await?;
        Ok(compute_monthly_status(
            project,
            &entries,
            reference_date,
            exclude_entry_id,
        ))
    }

    /// Fails with `BudgetConfirmationRequired` when saving `draft` would push
    /// its month past the retainer budget and the caller has not consented.
    async fn check_budget(
        &self,
        project: &Project,
        draft: &NewTimeEntry,
        exclude_entry_id: Option<&TimeEntryId>,
        confirm_override: bool,
    ) -> Result<(), TimeTrackingError> {
        let Some(status) = self.status_for(project, draft.date, exclude_entry_id).await? else {
            return Ok(());
        };
        let projection = status.project(draft.hours);
        if !projection.will_exceed_budget {
            return Ok(());
        }
        if !confirm_override {
            return Err(TimeTrackingError::BudgetConfirmationRequired {
                status: Box::new(status),
                projection,
            });
        }

        tracing::warn!(
            project_id = %project.id,
            month_start = %status.month_start,
            budget_hours = status.budget_hours,
            projected_total = projection.projected_total,
            "saving time entry over the monthly retainer budget"
        );
        Ok(())
    }

    async fn set_flag(
        &self,
        ids: &[TimeEntryId],
        flag: fn(&mut NewTimeEntry) -> &mut bool,
        value: bool,
    ) -> Result<usize, TimeTrackingError> {
        let mut seen = HashSet::new();
        let mut targets = Vec::with_capacity(ids.len());
        for id in ids.iter().filter(|id| seen.insert(*id)) {
            targets.push(self.require_entry(id).await?);
        }

        let mut changed = 0;
        for entry in targets {
            let mut draft = entry.to_draft();
            let field = flag(&mut draft);
            if *field == value {
                continue;
            }
            *field = value;
            self.entries.update_time_entry(&entry.id, &draft).await?;
            changed += 1;
        }
        Ok(changed)
    }
}

#[async_trait]
impl<E, P, M> TimeTrackingService for TimeTrackingServiceImpl<E, P, M>
where
    E: TimeEntryRepository,
    P: ProjectRepository,
    M: TeamMemberRepository,
{
    async fn record_time_entry(
        &self,
        draft: NewTimeEntry,
        confirm_override: bool,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let draft = draft.normalized()?;
        let project = self.require_project(&draft.project_id).await?;
        self.check_budget(&project, &draft, None, confirm_override)
            .await?;

        let created = self.entries.create_time_entry(&draft).await?;
        tracing::info!(
            entry_id = %created.id,
            project_id = %created.project_id,
            hours = created.hours,
            "time entry recorded"
        );
        Ok(created)
    }

    async fn update_time_entry(
        &self,
        id: &TimeEntryId,
        draft: NewTimeEntry,
        confirm_override: bool,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let mut draft = draft.normalized()?;
        let existing = self.require_entry(id).await?;
        if let (Some(start), Some(end)) = (draft.start_time, draft.end_time) {
            if (draft.start_time, draft.end_time) != (existing.start_time, existing.end_time) {
                draft.hours = derive_hours(start, end)?;
            }
        }
        let project = self.require_project(&draft.project_id).await?;
        self.check_budget(&project, &draft, Some(id), confirm_override)
            .await?;

        let updated = self.entries.update_time_entry(id, &draft).await?;
        tracing::info!(
            entry_id = %updated.id,
            project_id = %updated.project_id,
            hours = updated.hours,
            "time entry updated"
        );
        Ok(updated)
    }

    async fn delete_time_entry(&self, id: &TimeEntryId) -> Result<(), TimeTrackingError> {
        self.entries.delete_time_entry(id).await?;
        tracing::info!(entry_id = %id, "time entry deleted");
        Ok(())
    }

    async fn monthly_status(
        &self,
        project_id: &ProjectId,
        reference_date: Date,
        exclude_entry_id: Option<&TimeEntryId>,
    ) -> Result<Option<MonthlyBudgetStatus>, TimeTrackingError> {
        let project = self.require_project(project_id).await?;
        self.status_for(&project, reference_date, exclude_entry_id)
            .await
    }

    async fn accounting_report(
        &self,
        project_id: &ProjectId,
        filter: &EntryFilter,
    ) -> Result<AccountingReport, TimeTrackingError> {
        if !filter.has_valid_range() {
            return Err(TimeTrackingError::InvalidDateRange);
        }
        let project = self.require_project(project_id).await?;
        let entries = self
            .entries
            .filter_time_entries(&TimeEntryQuery::for_project(project.id.clone()))
            .await?;
        let team_members = self.members.list_team_members().await?;

        let filtered = filter_entries(&entries, filter);
        Ok(build_report(&filtered, &project, &team_members))
    }

    async fn set_client_billed(
        &self,
        ids: &[TimeEntryId],
        billed: bool,
    ) -> Result<usize, TimeTrackingError> {
        let changed = self
            .set_flag(ids, |draft| &mut draft.client_billed, billed)
            .await?;
        tracing::info!(changed, billed, "updated client billed flags");
        Ok(changed)
    }

    async fn set_contractor_paid(
        &self,
        ids: &[TimeEntryId],
        paid: bool,
    ) -> Result<usize, TimeTrackingError> {
        let changed = self
            .set_flag(ids, |draft| &mut draft.contractor_paid, paid)
            .await?;
        tracing::info!(changed, paid, "updated contractor paid flags");
        Ok(changed)
    }
}
