use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};
use tally_core::{
    adapters::outbound::{FileSessionSlot, InMemoryStore, SystemClock},
    domain::{
        models::{
            AccountingReport, EntryFilter, MonthlyBudgetStatus, NewTimeEntry, ProjectId, TaskId,
            TeamMemberId, TimeEntry, TimeEntryId, TimerDisplayState,
        },
        ports::{
            inbound::TimeTrackingService,
            outbound::{Clock, SessionSlot},
        },
        services::{TimeTrackingServiceImpl, TimerSessionManager},
        TimeTrackingError,
    },
};
use time::{PrimitiveDateTime, UtcOffset};

use crate::{
    cli::{format_date, AddArgs, Cli, Commands},
    config::TallyConfig,
    ledger::Ledger,
};

type Service = TimeTrackingServiceImpl<InMemoryStore, InMemoryStore, InMemoryStore>;
type Timer = TimerSessionManager<Arc<FileSessionSlot>, SystemClock>;

/// Everything a command needs: the ledger-backed service and the timer slot.
struct Workspace {
    config: TallyConfig,
    ledger: Ledger,
    store: InMemoryStore,
    service: Service,
    slot: Arc<FileSessionSlot>,
}

impl Workspace {
    fn open(config: TallyConfig, ledger_override: Option<PathBuf>) -> Result<Self> {
        let ledger_path = match ledger_override {
            Some(path) => path,
            None => config.ledger_path()?,
        };
        let ledger = Ledger::new(ledger_path);
        let store = InMemoryStore::from_snapshot(ledger.load()?);
        let store_handle = Arc::new(store.clone());
        let service = TimeTrackingServiceImpl::new(
            store_handle.clone(),
            store_handle.clone(),
            store_handle,
        );
        let slot = Arc::new(FileSessionSlot::in_dir(config.state_dir()?));

        Ok(Self {
            config,
            ledger,
            store,
            service,
            slot,
        })
    }

    fn timer(&self) -> Result<Timer> {
        TimerSessionManager::restore(self.slot.clone(), SystemClock)
            .with_context(|| format!("Failed to load timer from {}", self.slot.path().display()))
    }

    fn member(&self, flag: Option<String>) -> TeamMemberId {
        TeamMemberId::new(flag.unwrap_or_else(|| self.config.team_member_id.clone()))
    }

    fn persist(&self) -> Result<()> {
        let snapshot = self.store.snapshot()?;
        self.ledger.save(&snapshot)
    }
}

pub async fn run(cli: Cli, config: TallyConfig) -> Result<()> {
    if let Commands::ConfigPath = cli.command {
        return config_path(&config);
    }

    let ws = Workspace::open(config, cli.ledger)?;
    match cli.command {
        Commands::Start {
            project,
            task,
            description,
        } => {
            let mut timer = ws.timer()?;
            let session = timer.start(project, task.map(TaskId::new), description.as_deref())?;
            println!("Timer started on {}", session.project_id);
        }
        Commands::Pause => {
            let mut timer = ws.timer()?;
            timer.pause()?;
            print_display(&timer.display_state());
        }
        Commands::Resume => {
            let mut timer = ws.timer()?;
            timer.resume()?;
            print_display(&timer.display_state());
        }
        Commands::Stop { member, confirm } => stop(&ws, ws.member(member), confirm).await?,
        Commands::Discard => match ws.timer()?.discard()? {
            Some(session) => println!("Discarded timer on {}", session.project_id),
            None => println!("No timer to discard"),
        },
        Commands::Status { watch } => {
            let timer = ws.timer()?;
            if watch {
                watch_timer(&timer).await?;
            } else {
                print_display(&timer.display_state());
            }
        }
        Commands::Add(args) => {
            let member = ws.member(args.member.clone());
            let draft = manual_draft(&args, member, SystemClock.now().offset())?;
            let entry = save_entry(&ws, draft, args.confirm).await?;
            print_entry(&entry);
        }
        Commands::Budget { project, date } => {
            let reference = date.unwrap_or_else(|| SystemClock.now().date());
            let project_id = ProjectId::new(project);
            match ws
                .service
                .monthly_status(&project_id, reference, None)
                .await?
            {
                Some(status) => print_status(&status),
                None => println!("{project_id} has no monthly retainer budget"),
            }
        }
        Commands::Report {
            project,
            from,
            to,
            billing,
            payment,
            json,
        } => {
            let filter = EntryFilter {
                start_date: from,
                end_date: to,
                billing,
                payment,
            };
            let report = ws
                .service
                .accounting_report(&ProjectId::new(project), &filter)
                .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        }
        Commands::MarkBilled { ids, undo } => {
            let ids = entry_ids(ids);
            let changed = ws.service.set_client_billed(&ids, !undo).await?;
            ws.persist()?;
            println!("{changed} of {} entries changed", ids.len());
        }
        Commands::MarkPaid { ids, undo } => {
            let ids = entry_ids(ids);
            let changed = ws.service.set_contractor_paid(&ids, !undo).await?;
            ws.persist()?;
            println!("{changed} of {} entries changed", ids.len());
        }
        Commands::ConfigPath => {}
    }

    Ok(())
}

fn config_path(config: &TallyConfig) -> Result<()> {
    let path = TallyConfig::config_path()?;
    if !path.exists() {
        config.save_to(&path)?;
        println!("Created default config at {}", path.display());
    }
    println!("{}", path.display());
    Ok(())
}

async fn stop(ws: &Workspace, member: TeamMemberId, confirm: bool) -> Result<()> {
    let mut timer = ws.timer()?;
    let session = timer.session().cloned();
    let draft = timer.stop(&member)?;
    let stopped_at = draft.end_time;

    match save_entry(ws, draft, confirm).await {
        Ok(entry) => {
            print_entry(&entry);
            Ok(())
        }
        Err(err) => {
            // Nothing was saved. Keep the session, frozen at the stop instant,
            // so a retry records the same hours.
            if let (Some(session), Some(stopped_at)) = (session, stopped_at) {
                ws.slot.save(&session.paused_at(stopped_at))?;
            }
            Err(err.context("timer paused at the stop time"))
        }
    }
}

/// Draft for a hand-entered time entry. Both bounds win over `--hours`.
fn manual_draft(args: &AddArgs, member: TeamMemberId, offset: UtcOffset) -> Result<NewTimeEntry> {
    let mut draft = NewTimeEntry::new(
        args.project.as_str(),
        member,
        args.date,
        args.hours.unwrap_or(0.0),
    )
    .with_billable(!args.non_billable)
    .with_description(args.description.clone().unwrap_or_default());
    if let Some(task) = &args.task {
        draft = draft.with_task(task.as_str());
    }

    match (args.start, args.end, args.hours) {
        (Some(start), Some(end), _) => {
            let at = |time| PrimitiveDateTime::new(args.date, time).assume_offset(offset);
            Ok(draft.with_times(at(start), at(end))?)
        }
        (None, None, Some(_)) => Ok(draft),
        _ => bail!("either --hours or both --start and --end are required"),
    }
}

async fn save_entry(ws: &Workspace, draft: NewTimeEntry, confirm: bool) -> Result<TimeEntry> {
    let entry = match ws.service.record_time_entry(draft, confirm).await {
        Ok(entry) => entry,
        Err(err @ TimeTrackingError::BudgetConfirmationRequired { .. }) => {
            bail!("{err}; rerun with --confirm to save anyway")
        }
        Err(err) => return Err(err.into()),
    };
    ws.persist()?;
    Ok(entry)
}

async fn watch_timer(timer: &Timer) -> Result<()> {
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tick.tick() => {
                let (h, m, s) = timer.display_state().elapsed_hms();
                print!("\r{h:02}:{m:02}:{s:02} {}", timer.state());
                std::io::Write::flush(&mut std::io::stdout())?;
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                return Ok(());
            }
        }
    }
}

fn entry_ids(ids: Vec<String>) -> Vec<TimeEntryId> {
    ids.into_iter().map(TimeEntryId::from).collect()
}

fn print_display(display: &TimerDisplayState) {
    let (h, m, s) = display.elapsed_hms();
    let state = match (display.running, display.paused) {
        (true, true) => "paused",
        (true, false) => "running",
        (false, _) => "idle",
    };
    println!("{h:02}:{m:02}:{s:02} {state}");
}

fn print_entry(entry: &TimeEntry) {
    println!(
        "{} {} {} {:.2}h {}",
        entry.id,
        format_date(entry.date),
        entry.project_id,
        entry.hours,
        entry.description
    );
}

fn print_status(status: &MonthlyBudgetStatus) {
    println!(
        "{} {}..{}",
        status.project_id,
        format_date(status.month_start),
        format_date(status.month_end)
    );
    println!("  budget     {:>8.2}h", status.budget_hours);
    println!("  used       {:>8.2}h", status.hours_used);
    println!("  remaining  {:>8.2}h", status.hours_remaining);
    if status.is_over_budget {
        println!("  over budget");
    }
}

fn print_report(report: &AccountingReport) {
    for line in &report.lines {
        let entry = &line.entry;
        println!(
            "{:<8} {} {:>6.2}h {:>10.2} {:>10.2} {}{}",
            entry.id.as_str(),
            format_date(entry.date),
            entry.hours,
            line.amounts.revenue,
            line.amounts.cost,
            if entry.client_billed { "B" } else { "-" },
            if entry.contractor_paid { "P" } else { "-" },
        );
    }

    let rollup = &report.rollup;
    println!();
    println!(
        "hours      {:>10.2} ({:.2} billable)",
        rollup.total_hours, rollup.billable_hours
    );
    println!(
        "revenue    {:>10.2} ({:.2} billed, {:.2} unbilled)",
        rollup.hourly_revenue, rollup.billed_revenue, rollup.unbilled_revenue
    );
    println!(
        "payroll    {:>10.2} ({:.2} paid, {:.2} unpaid)",
        rollup.total_payroll, rollup.paid_payroll, rollup.unpaid_payroll
    );
    println!(
        "profit     {:>10.2} ({:.1}% margin)",
        rollup.profit, rollup.profit_margin
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::adapters::outbound::DataSnapshot;
    use clap::Parser;
    use tally_core::domain::models::{BillingType, Project, TeamMember, TimerSession, TimerState};
    use time::macros::{date, datetime};

    fn workspace(dir: &std::path::Path) -> Workspace {
        let ledger = Ledger::new(dir.join("ledger.json"));
        ledger
            .save(&DataSnapshot {
                projects: vec![
                    Project::new("p-ret", BillingType::Retainer).with_budget_hours(4.0),
                    Project::new("p-small", BillingType::Retainer).with_budget_hours(0.5),
                ],
                team_members: vec![TeamMember::new("tm-1", 50.0)],
                time_entries: vec![],
            })
            .expect("seed ledger");
        let config = TallyConfig {
            ledger_path: Some(ledger.path().to_path_buf()),
            state_dir: Some(dir.join("state")),
            team_member_id: "tm-1".to_string(),
            ..TallyConfig::default()
        };
        Workspace::open(config, None).expect("open workspace")
    }

    #[tokio::test]
    async fn saved_entries_reach_the_ledger() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let ws = workspace(dir.path());
        let draft = NewTimeEntry::new("p-ret", ws.member(None), date!(2024 - 03 - 01), 3.0);

        let entry = save_entry(&ws, draft, false).await.expect("save");

        let reloaded = Ledger::new(dir.path().join("ledger.json")).load().expect("reload");
        assert_eq!(reloaded.time_entries, vec![entry]);
    }

    #[tokio::test]
    async fn over_budget_save_asks_for_confirmation() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let ws = workspace(dir.path());
        let draft = NewTimeEntry::new("p-ret", "tm-1", date!(2024 - 03 - 01), 5.0);

        let err = save_entry(&ws, draft.clone(), false)
            .await
            .expect_err("needs confirmation");
        assert!(err.to_string().contains("--confirm"));
        assert!(ws.ledger.load().expect("reload").time_entries.is_empty());

        save_entry(&ws, draft, true).await.expect("confirmed save");
        assert_eq!(ws.ledger.load().expect("reload").time_entries.len(), 1);
    }

    #[tokio::test]
    async fn refused_stop_pauses_the_timer_at_the_stop_time() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let ws = workspace(dir.path());
        let started = SystemClock.now() - time::Duration::hours(1);
        ws.slot
            .save(&TimerSession::new("p-small", started))
            .expect("seed slot");

        let err = stop(&ws, TeamMemberId::new("tm-1"), false)
            .await
            .expect_err("over the retainer");
        assert!(format!("{err:#}").contains("--confirm"));
        assert!(ws.ledger.load().expect("reload").time_entries.is_empty());

        let timer = ws.timer().expect("timer");
        assert_eq!(timer.state(), TimerState::Paused);
        let session = timer.session().expect("session kept");
        assert!(session.accumulated_active_ms >= 3_600_000);
        assert!(session.accumulated_active_ms < 3_660_000);
        assert_eq!(
            session.active_millis_at(SystemClock.now() + time::Duration::hours(2)),
            session.accumulated_active_ms
        );
    }

    fn add_args(args: &[&str]) -> AddArgs {
        let argv = ["tally", "add", "p-ret", "--date", "2024-03-01"]
            .into_iter()
            .chain(args.iter().copied());
        match Cli::try_parse_from(argv).expect("parse add").command {
            Commands::Add(args) => args,
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn manual_draft_takes_plain_hours() {
        let args = add_args(&["--hours", "2.5", "--task", "t-1", "--non-billable"]);
        let draft = manual_draft(&args, TeamMemberId::new("tm-1"), UtcOffset::UTC).expect("draft");

        assert_eq!(draft.hours, 2.5);
        assert_eq!(draft.start_time, None);
        assert_eq!(draft.task_id, Some(TaskId::new("t-1")));
        assert!(!draft.billable);
    }

    #[test]
    fn manual_draft_prefers_bounds_over_hours() {
        let args = add_args(&["--hours", "9", "--start", "09:00", "--end", "10:30"]);
        let draft = manual_draft(&args, TeamMemberId::new("tm-1"), UtcOffset::UTC).expect("draft");

        assert_eq!(draft.hours, 1.5);
        assert_eq!(draft.start_time, Some(datetime!(2024-03-01 09:00 UTC)));
        assert_eq!(draft.end_time, Some(datetime!(2024-03-01 10:30 UTC)));
        assert!(draft.billable);
    }

    #[test]
    fn manual_draft_needs_hours_or_bounds() {
        let err = manual_draft(&add_args(&[]), TeamMemberId::new("tm-1"), UtcOffset::UTC)
            .expect_err("nothing to record");
        assert!(err.to_string().contains("--hours"));

        let reversed = add_args(&["--start", "10:00", "--end", "09:00"]);
        assert!(manual_draft(&reversed, TeamMemberId::new("tm-1"), UtcOffset::UTC).is_err());
    }
}
