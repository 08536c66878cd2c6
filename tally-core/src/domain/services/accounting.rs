use std::collections::HashMap;

use crate::domain::models::{
    AccountingLine, AccountingReport, AccountingRollup, EntryAmounts, EntryFilter, Project,
    TeamMember, TeamMemberId, TimeEntry,
};

/// Entries matching `filter`, in their original order.
pub fn filter_entries(entries: &[TimeEntry], filter: &EntryFilter) -> Vec<TimeEntry> {
    entries
        .iter()
        .filter(|entry| filter.matches(entry))
        .cloned()
        .collect()
}

/// Whether an entry earns hourly revenue on `project`.
///
/// Retainer clients are treated as pre-paid, so retainer time never counts.
fn earns_hourly_revenue(entry: &TimeEntry, project: &Project) -> bool {
    entry.billable && project.is_billable_to_client() && !project.is_retainer()
}

/// Revenue and cost of a single entry, given the member's cost rate.
pub fn entry_amounts(entry: &TimeEntry, project: &Project, cost_rate: f64) -> EntryAmounts {
    let revenue = if earns_hourly_revenue(entry, project) {
        entry.hours * project.hourly_rate
    } else {
        0.0
    };
    EntryAmounts {
        revenue,
        cost: entry.hours * cost_rate,
    }
}

fn cost_rates(team_members: &[TeamMember]) -> HashMap<&TeamMemberId, f64> {
    team_members
        .iter()
        .map(|member| (&member.id, member.hourly_rate))
        .collect()
}

/// Per-entry rows for `entries`. Unknown team members cost nothing.
pub fn accounting_lines(
    entries: &[TimeEntry],
    project: &Project,
    team_members: &[TeamMember],
) -> Vec<AccountingLine> {
    let rates = cost_rates(team_members);
    entries
        .iter()
        .map(|entry| {
            let cost_rate = rates.get(&entry.team_member_id).copied().unwrap_or(0.0);
            AccountingLine {
                entry: entry.clone(),
                amounts: entry_amounts(entry, project, cost_rate),
            }
        })
        .collect()
}

fn rollup_lines(lines: &[AccountingLine]) -> AccountingRollup {
    let mut rollup = lines
        .iter()
        .fold(AccountingRollup::default(), |mut acc, line| {
            let entry = &line.entry;
            let EntryAmounts { revenue, cost } = line.amounts;

            acc.total_hours += entry.hours;
            if entry.billable {
                acc.billable_hours += entry.hours;
            }

            acc.hourly_revenue += revenue;
            if entry.client_billed {
                acc.billed_revenue += revenue;
            } else {
                acc.unbilled_revenue += revenue;
            }

            acc.total_payroll += cost;
            if entry.contractor_paid {
                acc.paid_payroll += cost;
            } else {
                acc.unpaid_payroll += cost;
            }
            acc
        });

    rollup.profit = rollup.hourly_revenue - rollup.total_payroll;
    rollup.profit_margin = if rollup.hourly_revenue == 0.0 {
        0.0
    } else {
        rollup.profit / rollup.hourly_revenue * 100.0
    };
    rollup
}

/// Revenue, payroll and profit totals for already-filtered entries.
pub fn compute_rollups(
    entries: &[TimeEntry],
    project: &Project,
    team_members: &[TeamMember],
) -> AccountingRollup {
    rollup_lines(&accounting_lines(entries, project, team_members))
}

/// Rollups plus the rows behind them.
pub fn build_report(
    entries: &[TimeEntry],
    project: &Project,
    team_members: &[TeamMember],
) -> AccountingReport {
    let lines = accounting_lines(entries, project, team_members);
    AccountingReport {
        rollup: rollup_lines(&lines),
        lines,
    }
}
