use thiserror::Error;

use super::models::{BudgetProjection, MonthlyBudgetStatus, TimerState};

/// Errors that can occur during time tracking operations.
///
/// Every variant is recoverable by the caller: fix the input, retry, or
/// discard the timer.
#[derive(Debug, Error)]
pub enum TimeTrackingError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("cannot {operation} while the timer is {state}")]
    InvalidState {
        operation: &'static str,
        state: TimerState,
    },
    #[error("incomplete timer session: missing {0}")]
    IncompleteSession(&'static str),
    #[error("timer session has no recorded duration")]
    ZeroDuration,
    #[error("end time must be after start time")]
    InvalidInterval,
    #[error("invalid date range")]
    InvalidDateRange,
    #[error(
        "saving would use {:.2}h of the {:.2}h monthly retainer budget",
        .projection.projected_total,
        .status.budget_hours
    )]
    BudgetConfirmationRequired {
        status: Box<MonthlyBudgetStatus>,
        projection: BudgetProjection,
    },
    #[error("project not found: {0}")]
    ProjectNotFound(String),
    #[error("time entry not found: {0}")]
    TimeEntryNotFound(String),
    #[error("session store error: {0}")]
    SessionStore(String),
    #[error("data service error: {0}")]
    DataService(String),
}

impl TimeTrackingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn session_store(msg: impl Into<String>) -> Self {
        Self::SessionStore(msg.into())
    }

    pub fn data_service(msg: impl Into<String>) -> Self {
        Self::DataService(msg.into())
    }
}
