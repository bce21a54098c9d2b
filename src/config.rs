use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Tunables for the sync core, read from a JSON file at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncConfig {
    /// Base URL of the remote relational API.
    pub remote_url: String,
    /// API key sent with every remote request.
    pub api_key: String,
    /// Seconds between scheduled background syncs.
    pub sync_interval_secs: u64,
    /// Milliseconds to debounce local timer-state changes before publish.
    pub publish_debounce_ms: u64,
    /// Milliseconds the replicator waits before flushing an outbound write.
    pub replicate_debounce_ms: u64,
    /// Polling period for the HTTP change-feed subscription, in milliseconds.
    pub subscribe_poll_ms: u64,
    /// Maximum remote sessions fetched per download pass.
    pub session_download_limit: usize,
    /// Days of local history scanned when building the de-duplication set.
    pub dedup_window_days: i64,
    /// Deadline for the dashboard stats fetch, in seconds.
    pub stats_deadline_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_url: String::new(),
            api_key: String::new(),
            sync_interval_secs: 300,
            publish_debounce_ms: 500,
            replicate_debounce_ms: 300,
            subscribe_poll_ms: 1000,
            session_download_limit: 100,
            dedup_window_days: 365,
            stats_deadline_secs: 5,
        }
    }
}

impl SyncConfig {
    /// Read the config file, falling back to defaults when it is absent or
    /// unparseable (a broken config must not keep the timer from working).
    pub fn load(path: &PathBuf) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(contents) => serde_json::from_str(&contents).unwrap_or_default(),
                Err(_) => Self::default(),
            }
        } else {
            Self::default()
        }
    }

    pub fn save(&self, path: &PathBuf) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.json");
        let config = SyncConfig::load(&path);
        assert_eq!(config.sync_interval_secs, 300);
        assert_eq!(config.publish_debounce_ms, 500);
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sync.json");

        let mut config = SyncConfig::default();
        config.remote_url = "https://api.example.test".to_string();
        config.session_download_limit = 50;
        config.save(&path).unwrap();

        let loaded = SyncConfig::load(&path);
        assert_eq!(loaded.remote_url, "https://api.example.test");
        assert_eq!(loaded.session_download_limit, 50);
    }
}
