use time::{Date, Month};

use crate::domain::models::{
    round_hours, MonthlyBudgetStatus, Project, TimeEntry, TimeEntryId,
};

/// First and last day of the calendar month containing `reference`.
pub fn month_window(reference: Date) -> Option<(Date, Date)> {
    let first = reference.replace_day(1).ok()?;
    let next_first = match reference.month() {
        Month::December => Date::from_calendar_date(reference.year() + 1, Month::January, 1),
        month => Date::from_calendar_date(reference.year(), month.next(), 1),
    }
    .ok()?;
    Some((first, next_first.previous_day()?))
}

/// Retainer usage for the month of `reference_date`.
///
/// The month is taken from `reference_date`, not today, so back-dated
/// entries are checked against the month they belong to. Returns `None` for
/// projects that are not retainers with a positive budget. Entries of other
/// projects and the entry `exclude_entry_id` (the one being edited) are not
/// counted.
pub fn compute_monthly_status(
    project: &Project,
    entries: &[TimeEntry],
    reference_date: Date,
    exclude_entry_id: Option<&TimeEntryId>,
) -> Option<MonthlyBudgetStatus> {
    if !project.is_retainer() || project.budget_hours <= 0.0 {
        return None;
    }
    let (month_start, month_end) = month_window(reference_date)?;

    let hours_used = round_hours(
        entries
            .iter()
            .filter(|entry| entry.project_id == project.id)
            .filter(|entry| entry.date >= month_start && entry.date <= month_end)
            .filter(|entry| exclude_entry_id != Some(&entry.id))
            .map(|entry| entry.hours)
            .sum(),
    );

    Some(MonthlyBudgetStatus {
        project_id: project.id.clone(),
        month_start,
        month_end,
        budget_hours: project.budget_hours,
        hours_used,
        hours_remaining: round_hours(project.budget_hours - hours_used),
        is_over_budget: hours_used >= project.budget_hours,
    })
}
