use async_trait::async_trait;
use time::Date;

use crate::domain::{
    models::{
        AccountingReport, EntryFilter, MonthlyBudgetStatus, NewTimeEntry, ProjectId, TimeEntry,
        TimeEntryId,
    },
    TimeTrackingError,
};

/// Inbound port for time tracking operations.
///
/// This trait defines the use cases a presentation layer can invoke. It
/// combines the pure budget and accounting rules with the outbound data
/// service ports.
#[async_trait]
pub trait TimeTrackingService: Send + Sync + 'static {
    // ========================================================================
    // Time Entry Operations
    // ========================================================================

    /// Validate and persist a new time entry.
    ///
    /// On a retainer project a save that would push the month past its
    /// budget fails with `BudgetConfirmationRequired` unless
    /// `confirm_override` is set.
    async fn record_time_entry(
        &self,
        draft: NewTimeEntry,
        confirm_override: bool,
    ) -> Result<TimeEntry, TimeTrackingError>;

    /// Replace an existing entry. The entry's own hours are not counted
    /// against the month while checking the budget.
    async fn update_time_entry(
        &self,
        id: &TimeEntryId,
        draft: NewTimeEntry,
        confirm_override: bool,
    ) -> Result<TimeEntry, TimeTrackingError>;

    async fn delete_time_entry(&self, id: &TimeEntryId) -> Result<(), TimeTrackingError>;

    // ========================================================================
    // Retainer Budget
    // ========================================================================

    /// Monthly budget usage for the month containing `reference_date`.
    ///
    /// `None` when the project is not a retainer with a positive budget.
    async fn monthly_status(
        &self,
        project_id: &ProjectId,
        reference_date: Date,
        exclude_entry_id: Option<&TimeEntryId>,
    ) -> Result<Option<MonthlyBudgetStatus>, TimeTrackingError>;

    // ========================================================================
    // Accounting
    // ========================================================================

    async fn accounting_report(
        &self,
        project_id: &ProjectId,
        filter: &EntryFilter,
    ) -> Result<AccountingReport, TimeTrackingError>;

    /// Set `client_billed` on every listed entry. Returns how many changed.
    async fn set_client_billed(
        &self,
        ids: &[TimeEntryId],
        billed: bool,
    ) -> Result<usize, TimeTrackingError>;

    /// Set `contractor_paid` on every listed entry. Returns how many changed.
    async fn set_contractor_paid(
        &self,
        ids: &[TimeEntryId],
        paid: bool,
    ) -> Result<usize, TimeTrackingError>;
}
