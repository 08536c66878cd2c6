use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::Date;

use super::TimeEntry;

/// Filter on the client-billed flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BillingFilter {
    #[default]
    All,
    Billed,
    Unbilled,
}

impl BillingFilter {
    pub fn matches(self, client_billed: bool) -> bool {
        match self {
            BillingFilter::All => true,
            BillingFilter::Billed => client_billed,
            BillingFilter::Unbilled => !client_billed,
        }
    }
}

/// Filter on the contractor-paid flag.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PaymentFilter {
    #[default]
    All,
    Paid,
    Unpaid,
}

impl PaymentFilter {
    pub fn matches(self, contractor_paid: bool) -> bool {
        match self {
            PaymentFilter::All => true,
            PaymentFilter::Paid => contractor_paid,
            PaymentFilter::Unpaid => !contractor_paid,
        }
    }
}

/// Criteria for the accounting view. Date bounds are inclusive whole days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryFilter {
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub billing: BillingFilter,
    pub payment: PaymentFilter,
}

impl EntryFilter {
    pub fn between(start_date: Date, end_date: Date) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Self::default()
        }
    }

    pub fn with_billing(mut self, billing: BillingFilter) -> Self {
        self.billing = billing;
        self
    }

    pub fn with_payment(mut self, payment: PaymentFilter) -> Self {
        self.payment = payment;
        self
    }

    pub fn has_valid_range(&self) -> bool {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    pub fn matches(&self, entry: &TimeEntry) -> bool {
        if self.start_date.is_some_and(|start| entry.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| entry.date > end) {
            return false;
        }
        self.billing.matches(entry.client_billed) && self.payment.matches(entry.contractor_paid)
    }
}

/// Display values for a single entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryAmounts {
    /// Client revenue; zero unless the entry is hourly-billable.
    pub revenue: f64,
    /// Internal cost at the team member's rate.
    pub cost: f64,
}

/// Revenue, cost and profit totals for a project.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingRollup {
    pub total_hours: f64,
    pub billable_hours: f64,
    pub hourly_revenue: f64,
    pub billed_revenue: f64,
    pub unbilled_revenue: f64,
    pub total_payroll: f64,
    pub paid_payroll: f64,
    pub unpaid_payroll: f64,
    pub profit: f64,
    /// Percentage of revenue; exactly zero when there is no revenue.
    pub profit_margin: f64,
}

/// One row of the accounting view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingLine {
    pub entry: TimeEntry,
    pub amounts: EntryAmounts,
}

/// Rollups together with the rows they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingReport {
    pub rollup: AccountingRollup,
    pub lines: Vec<AccountingLine>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_filters_pass_everything() {
        for flag in [true, false] {
            assert!(BillingFilter::All.matches(flag));
            assert!(PaymentFilter::All.matches(flag));
        }
    }

    #[test]
    fn filters_parse_from_cli_strings() {
        assert_eq!("unbilled".parse::<BillingFilter>().ok(), Some(BillingFilter::Unbilled));
        assert_eq!("PAID".parse::<PaymentFilter>().ok(), Some(PaymentFilter::Paid));
        assert!("sometimes".parse::<PaymentFilter>().is_err());
    }
}
