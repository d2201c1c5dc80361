use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Last charging decision applied to the hardware, persisted across
/// restarts. Unknown fields in the file are ignored and missing fields
/// fall back to defaults so old records keep loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerState {
    #[serde(default = "default_enabled")]
    pub charging_enabled: bool,
    #[serde(default = "Local::now")]
    pub last_update: DateTime<Local>,
}

fn default_enabled() -> bool {
    true
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            charging_enabled: true,
            last_update: Local::now(),
        }
    }
}

/// JSON-file store for the controller state.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the persisted state, or the default state when the file is
    /// absent, unreadable or malformed. Never fails the caller.
    pub fn load(&self) -> ControllerState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::debug!("No state file at {}, starting fresh", self.path.display());
                return ControllerState::default();
            }
            Err(e) => {
                log::warn!("Failed to read {}: {}", self.path.display(), e);
                return ControllerState::default();
            }
        };

        match serde_json::from_str::<ControllerState>(&content) {
            Ok(state) => {
                log::info!("Loaded previous state: charging_enabled={}", state.charging_enabled);
                state
            }
            Err(e) => {
                log::warn!("State file {} is malformed ({}), starting fresh", self.path.display(), e);
                ControllerState::default()
            }
        }
    }

    /// Overwrites the record atomically (write to a sibling temp file,
    /// then rename) so a concurrent reader never sees a partial write.
    pub fn save(&self, state: &ControllerState) -> Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to rename {} into place", tmp.display()))?;
        Ok(())
    }
}

/// Per-user directory holding the state file and the log, following
/// `$XDG_STATE_HOME` with the usual `~/.local/state` fallback.
pub fn default_state_dir() -> PathBuf {
    let base = std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
            PathBuf::from(home).join(".local").join("state")
        });
    base.join("chargecap")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_charging_enabled() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StateStore::new(tmp.path().join("state.json"));

        let state = ControllerState {
            charging_enabled: false,
            last_update: Local::now(),
        };
        store.save(&state).unwrap();

        assert!(!store.load().charging_enabled);
    }

    #[test]
    fn missing_file_loads_default() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StateStore::new(tmp.path().join("state.json"));

        assert!(store.load().charging_enabled);
    }

    #[test]
    fn malformed_file_loads_default() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        assert!(StateStore::new(path).load().charging_enabled);
    }

    #[test]
    fn unknown_and_missing_fields_are_tolerated() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("state.json");
        fs::write(&path, r#"{"charging_enabled": false, "schema": 2}"#).unwrap();

        assert!(!StateStore::new(path).load().charging_enabled);
    }

    #[test]
    fn save_replaces_previous_record() {
        let tmp = tempfile::tempdir().unwrap();
        let store = StateStore::new(tmp.path().join("state.json"));

        store.save(&ControllerState::default()).unwrap();
        let mut state = ControllerState::default();
        state.charging_enabled = false;
        store.save(&state).unwrap();

        assert!(!store.load().charging_enabled);
        assert!(!tmp.path().join("state.json.tmp").exists());
    }
}
