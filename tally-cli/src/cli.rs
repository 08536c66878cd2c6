use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tally_core::domain::models::{BillingFilter, PaymentFilter};
use time::{macros::format_description, Date, Time};

#[derive(Debug, Parser)]
#[command(name = "tally")]
#[command(about = "Timer sessions, retainer budgets and accounting rollups")]
pub struct Cli {
    /// Ledger file to use instead of the configured one
    #[arg(long, global = true)]
    pub ledger: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a timer on a project
    Start {
        project: String,
        #[arg(long)]
        task: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Pause the running timer
    Pause,
    /// Resume the paused timer
    Resume,
    /// Stop the timer and record the time entry
    Stop {
        /// Team member to record the entry for (defaults to config)
        #[arg(long)]
        member: Option<String>,
        /// Save even if the retainer budget would be exceeded
        #[arg(long)]
        confirm: bool,
    },
    /// Throw away the current timer session
    Discard,
    /// Show the timer
    Status {
        /// Keep refreshing every second until interrupted
        #[arg(short, long)]
        watch: bool,
    },
    /// Record a time entry by hand
    Add(AddArgs),
    /// Show retainer usage for a month
    Budget {
        project: String,
        /// Any day of the month to check (defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<Date>,
    },
    /// Revenue, payroll and profit for a project
    Report {
        project: String,
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,
        #[arg(long, value_parser = parse_date)]
        to: Option<Date>,
        #[arg(long, default_value_t = BillingFilter::All)]
        billing: BillingFilter,
        #[arg(long, default_value_t = PaymentFilter::All)]
        payment: PaymentFilter,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark entries as billed to the client
    MarkBilled {
        #[arg(required = true)]
        ids: Vec<String>,
        /// Clear the flag instead
        #[arg(long)]
        undo: bool,
    },
    /// Mark entries as paid to the contractor
    MarkPaid {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        undo: bool,
    },
    /// Print config path and create default file if missing
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct AddArgs {
    pub project: String,
    #[arg(long, value_parser = parse_date)]
    pub date: Date,
    /// Hours worked; ignored when --start and --end are given
    #[arg(long)]
    pub hours: Option<f64>,
    #[arg(long, value_parser = parse_time, requires = "end")]
    pub start: Option<Time>,
    #[arg(long, value_parser = parse_time, requires = "start")]
    pub end: Option<Time>,
    #[arg(long)]
    pub task: Option<String>,
    #[arg(short, long)]
    pub description: Option<String>,
    #[arg(long)]
    pub member: Option<String>,
    #[arg(long)]
    pub non_billable: bool,
    #[arg(long)]
    pub confirm: bool,
}

pub fn parse_date(raw: &str) -> Result<Date, String> {
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

pub fn parse_time(raw: &str) -> Result<Time, String> {
    Time::parse(raw, format_description!("[hour]:[minute]"))
        .map_err(|e| format!("expected HH:MM: {e}"))
}

pub fn format_date(date: Date) -> String {
    date.format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string())
}
