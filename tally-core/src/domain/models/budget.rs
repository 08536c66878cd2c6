use serde::Serialize;
use time::Date;

use super::{round_hours, ProjectId};

/// Usage of a retainer project's monthly hour allotment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyBudgetStatus {
    pub project_id: ProjectId,
    /// First day of the evaluated month.
    pub month_start: Date,
    /// Last day of the evaluated month.
    pub month_end: Date,
    pub budget_hours: f64,
    pub hours_used: f64,
    pub hours_remaining: f64,
    pub is_over_budget: bool,
}

impl MonthlyBudgetStatus {
    /// What the month would look like after adding `candidate_hours`.
    pub fn project(&self, candidate_hours: f64) -> BudgetProjection {
        let projected_total = round_hours(self.hours_used + candidate_hours);
        BudgetProjection {
            candidate_hours,
            projected_total,
            will_exceed_budget: projected_total > self.budget_hours,
        }
    }
}

/// Outcome of adding an unsaved amount of hours to a month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetProjection {
    pub candidate_hours: f64,
    pub projected_total: f64,
    pub will_exceed_budget: bool,
}
