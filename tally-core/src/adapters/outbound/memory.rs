//! In-memory data service.
//!
//! Implements every data service port over a shared snapshot. Used by tests
//! and by the CLI, which loads the snapshot from a local ledger file.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    models::{NewTimeEntry, Project, ProjectId, TeamMember, TimeEntry, TimeEntryId},
    ports::outbound::{
        EntrySort, ProjectRepository, TeamMemberRepository, TimeEntryQuery, TimeEntryRepository,
    },
    TimeTrackingError,
};

/// Everything the data service holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSnapshot {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
}

/// Data service backed by an in-memory snapshot.
///
/// Clones share state. Ids are assigned as `te-<n>`, skipping ids already in
/// use by loaded entries.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<DataSnapshot>>,
    next_id: Arc<AtomicU64>,
    offline: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: DataSnapshot) -> Self {
        Self {
            data: Arc::new(RwLock::new(snapshot)),
            ..Self::default()
        }
    }

    pub fn with_projects(self, projects: Vec<Project>) -> Self {
        self.seed().projects.extend(projects);
        self
    }

    pub fn with_team_members(self, team_members: Vec<TeamMember>) -> Self {
        self.seed().team_members.extend(team_members);
        self
    }

    pub fn with_time_entries(self, time_entries: Vec<TimeEntry>) -> Self {
        self.seed().time_entries.extend(time_entries);
        self
    }

    /// Make every call fail, as an unreachable backend would.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// A copy of the current contents.
    pub fn snapshot(&self) -> Result<DataSnapshot, TimeTrackingError> {
        Ok(self.read()?.clone())
    }

    fn seed(&self) -> RwLockWriteGuard<'_, DataSnapshot> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<(), TimeTrackingError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TimeTrackingError::data_service("data service offline"));
        }
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, DataSnapshot>, TimeTrackingError> {
        self.ensure_online()?;
        self.data
            .read()
            .map_err(|_| TimeTrackingError::data_service("store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, DataSnapshot>, TimeTrackingError> {
        self.ensure_online()?;
        self.data
            .write()
            .map_err(|_| TimeTrackingError::data_service("store lock poisoned"))
    }

    fn next_entry_id(&self, data: &DataSnapshot) -> TimeEntryId {
        loop {
            let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            let id = TimeEntryId::new(format!("te-{n}"));
            if !data.time_entries.iter().any(|entry| entry.id == id) {
                return id;
            }
        }
    }
}

#[async_trait]
impl TimeEntryRepository for InMemoryStore {
    async fn list_time_entries(&self) -> Result<Vec<TimeEntry>, TimeTrackingError> {
        Ok(self.read()?.time_entries.clone())
    }

    async fn filter_time_entries(
        &self,
        query: &TimeEntryQuery,
    ) -> Result<Vec<TimeEntry>, TimeTrackingError> {
        let mut entries: Vec<TimeEntry> = self
            .read()?
            .time_entries
            .iter()
            .filter(|entry| query.matches(entry))
            .cloned()
            .collect();

        entries.sort_by(|a, b| (a.date, a.start_time).cmp(&(b.date, b.start_time)));
        if query.sort == EntrySort::DateDescending {
            entries.reverse();
        }
        if let Some(limit) = query.limit {
            entries.truncate(limit);
        }

        Ok(entries)
    }

    async fn get_time_entry(
        &self,
        id: &TimeEntryId,
    ) -> Result<Option<TimeEntry>, TimeTrackingError> {
        Ok(self
            .read()?
            .time_entries
            .iter()
            .find(|entry| entry.id == *id)
            .cloned())
    }

    async fn create_time_entry(
        &self,
        entry: &NewTimeEntry,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let mut data = self.write()?;
        let id = self.next_entry_id(&data);
        let created = entry.clone().into_entry(id);
        data.time_entries.push(created.clone());
        Ok(created)
    }

    async fn update_time_entry(
        &self,
        id: &TimeEntryId,
        entry: &NewTimeEntry,
    ) -> Result<TimeEntry, TimeTrackingError> {
        let mut data = self.write()?;
        let slot = data
            .time_entries
            .iter_mut()
            .find(|existing| existing.id == *id)
            .ok_or_else(|| TimeTrackingError::TimeEntryNotFound(id.to_string()))?;
        *slot = entry.clone().into_entry(id.clone());
        Ok(slot.clone())
    }

    async fn delete_time_entry(&self, id: &TimeEntryId) -> Result<(), TimeTrackingError> {
        let mut data = self.write()?;
        let before = data.time_entries.len();
        data.time_entries.retain(|entry| entry.id != *id);
        if data.time_entries.len() == before {
            return Err(TimeTrackingError::TimeEntryNotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectRepository for InMemoryStore {
    async fn list_projects(&self) -> Result<Vec<Project>, TimeTrackingError> {
        Ok(self.read()?.projects.clone())
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, TimeTrackingError> {
        Ok(self
            .read()?
            .projects
            .iter()
            .find(|project| project.id == *id)
            .cloned())
    }
}

#[async_trait]
impl TeamMemberRepository for InMemoryStore {
    async fn list_team_members(&self) -> Result<Vec<TeamMember>, TimeTrackingError> {
        Ok(self.read()?.team_members.clone())
    }
}
