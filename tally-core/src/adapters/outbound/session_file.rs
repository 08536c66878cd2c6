//! Durable timer session slots.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};

use crate::domain::{
    models::TimerSession,
    ports::outbound::{SessionSlot, TIMER_SESSION_KEY},
    TimeTrackingError,
};

fn secure_write(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    #[cfg(unix)]
    {
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(path, content)?;
    }

    Ok(())
}

fn decode(raw: &str) -> Result<Option<TimerSession>, TimeTrackingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(raw)
        .map(Some)
        .map_err(|e| TimeTrackingError::session_store(format!("corrupt timer session: {e}")))
}

fn encode(session: &TimerSession) -> Result<String, TimeTrackingError> {
    serde_json::to_string(session).map_err(|e| TimeTrackingError::session_store(e.to_string()))
}

/// Timer session stored as a JSON file readable only by the owner.
#[derive(Debug, Clone)]
pub struct FileSessionSlot {
    path: PathBuf,
}

impl FileSessionSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The slot under its fixed key inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{TIMER_SESSION_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionSlot for FileSessionSlot {
    fn load(&self) -> Result<Option<TimerSession>, TimeTrackingError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            TimeTrackingError::session_store(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))
        })?;
        decode(&raw)
    }

    fn save(&self, session: &TimerSession) -> Result<(), TimeTrackingError> {
        let content = encode(session)?;
        secure_write(&self.path, &content).map_err(|e| {
            TimeTrackingError::session_store(format!(
                "failed to write {}: {e}",
                self.path.display()
            ))
        })
    }

    fn clear(&self) -> Result<(), TimeTrackingError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path).map_err(|e| {
                TimeTrackingError::session_store(format!(
                    "failed to remove {}: {e}",
                    self.path.display()
                ))
            })?;
        }
        Ok(())
    }
}

/// Process-local slot holding the serialized session.
#[derive(Debug, Default)]
pub struct MemorySessionSlot {
    blob: Mutex<Option<String>>,
}

impl MemorySessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot pre-filled with raw content, as left behind by another process.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            blob: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|blob| blob.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<String>>, TimeTrackingError> {
        self.blob
            .lock()
            .map_err(|_| TimeTrackingError::session_store("session slot lock poisoned"))
    }
}

impl SessionSlot for MemorySessionSlot {
    fn load(&self) -> Result<Option<TimerSession>, TimeTrackingError> {
        match self.lock()?.as_deref() {
            Some(raw) => decode(raw),
            None => Ok(None),
        }
    }

    fn save(&self, session: &TimerSession) -> Result<(), TimeTrackingError> {
        let content = encode(session)?;
        *self.lock()? = Some(content);
        Ok(())
    }

    fn clear(&self) -> Result<(), TimeTrackingError> {
        *self.lock()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn session() -> TimerSession {
        TimerSession::new("p-1", datetime!(2024-03-01 09:00:00 UTC)).with_description("triage")
    }

    #[test]
    fn file_slot_round_trips_and_clears() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let slot = FileSessionSlot::in_dir(dir.path().join("state"));
        assert!(slot.load().expect("load empty slot").is_none());

        slot.save(&session()).expect("save session");
        assert_eq!(slot.load().expect("load session"), Some(session()));

        slot.clear().expect("clear slot");
        assert!(slot.load().expect("load cleared slot").is_none());
        slot.clear().expect("clearing twice is fine");
    }

    #[cfg(unix)]
    #[test]
    fn file_slot_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("create temp dir");
        let slot = FileSessionSlot::in_dir(dir.path());
        slot.save(&session()).expect("save session");
        let mode = std::fs::metadata(slot.path())
            .expect("stat slot")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn corrupt_content_is_reported() {
        let slot = MemorySessionSlot::with_raw("{not json");
        assert!(matches!(
            slot.load(),
            Err(TimeTrackingError::SessionStore(_))
        ));
    }

    #[test]
    fn blank_content_reads_as_empty() {
        let slot = MemorySessionSlot::with_raw("  \n");
        assert!(slot.load().expect("load blank slot").is_none());
    }
}
