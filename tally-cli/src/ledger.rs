//! Local JSON ledger used as a development backend.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tally_core::adapters::outbound::DataSnapshot;

#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the ledger. A missing file is an empty ledger.
    pub fn load(&self) -> Result<DataSnapshot> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no ledger yet, starting empty");
            return Ok(DataSnapshot::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read ledger at {}", self.path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse ledger at {}", self.path.display()))
    }

    pub fn save(&self, snapshot: &DataSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write ledger at {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::domain::models::{BillingType, NewTimeEntry, Project, TeamMember};
    use time::macros::date;

    #[test]
    fn missing_ledger_is_empty() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let ledger = Ledger::new(dir.path().join("ledger.json"));
        assert_eq!(ledger.load().expect("load"), DataSnapshot::default());
    }

    #[test]
    fn saved_ledger_loads_back() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let ledger = Ledger::new(dir.path().join("data").join("ledger.json"));
        let snapshot = DataSnapshot {
            projects: vec![Project::new("p-1", BillingType::Retainer).with_budget_hours(40.0)],
            team_members: vec![TeamMember::new("tm-1", 55.0)],
            time_entries: vec![
                NewTimeEntry::new("p-1", "tm-1", date!(2024 - 03 - 01), 1.5).into_entry("te-1")
            ],
        };

        ledger.save(&snapshot).expect("save");
        assert_eq!(ledger.load().expect("load"), snapshot);
    }

    #[test]
    fn hand_written_ledger_uses_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let ledger = Ledger::new(dir.path().join("ledger.json"));
        std::fs::write(
            ledger.path(),
            r#"{"projects":[{"id":"p-1","billingType":"hourly","hourlyRate":90}]}"#,
        )
        .expect("write ledger");

        let snapshot = ledger.load().expect("load");
        assert_eq!(snapshot.projects[0].hourly_rate, 90.0);
        assert!(snapshot.time_entries.is_empty());
    }
}
