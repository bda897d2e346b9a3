//! Storage configuration and path management for Cadence.
//!
//! Production code uses `StorageConfig::from_home()` which points to `~/.cadence/`.
//! Tests use `StorageConfig::with_root(temp_dir)` for isolation.

use std::path::{Path, PathBuf};

use crate::error::{CadenceError, Result};

/// Central configuration for all Cadence storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all Cadence data (default: ~/.cadence)
    root: PathBuf,
}

impl StorageConfig {
    pub fn from_home() -> Result<Self> {
        let home = dirs::home_dir().ok_or(CadenceError::HomeDirNotFound)?;
        Ok(Self {
            root: home.join(".cadence"),
        })
    }

    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to config.toml (timer thresholds).
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Path to records.jsonl (finished session history, one record per line).
    pub fn records_file(&self) -> PathBuf {
        self.root.join("records.jsonl")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Directories
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to snapshots/ directory (one in-progress session per routine).
    pub fn snapshots_dir(&self) -> PathBuf {
        self.root.join("snapshots")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Per-Routine Paths
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to a routine's snapshot file.
    /// Example: ~/.cadence/snapshots/session-morning-routine.json
    pub fn snapshot_file(&self, routine_id: &str) -> PathBuf {
        self.snapshots_dir()
            .join(format!("session-{}.json", Self::encode_key(routine_id)))
    }

    /// Encodes a routine id for use as a file name.
    /// `[A-Za-z0-9_-]` passes through; every other UTF-8 byte (including `%`)
    /// becomes `%XX`, so distinct ids never share a file.
    pub fn encode_key(key: &str) -> String {
        let mut encoded = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
                encoded.push(byte as char);
            } else {
                encoded.push_str(&format!("%{byte:02X}"));
            }
        }
        encoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_root() {
        let storage = StorageConfig::with_root(PathBuf::from("/tmp/cadence-test"));
        assert_eq!(
            storage.config_file(),
            PathBuf::from("/tmp/cadence-test/config.toml")
        );
        assert_eq!(
            storage.snapshot_file("morning"),
            PathBuf::from("/tmp/cadence-test/snapshots/session-morning.json")
        );
        assert_eq!(storage.logs_dir(), PathBuf::from("/tmp/cadence-test/logs"));
    }

    #[test]
    fn encode_key_escapes_path_separators() {
        assert_eq!(
            StorageConfig::encode_key("../etc/passwd"),
            "%2E%2E%2Fetc%2Fpasswd"
        );
        assert_eq!(StorageConfig::encode_key("routine-42_a"), "routine-42_a");
    }

    #[test]
    fn distinct_ids_get_distinct_snapshot_files() {
        let storage = StorageConfig::with_root(PathBuf::from("/tmp/cadence-test"));
        let ids = [
            "team.morning",
            "team_morning",
            "team%2Emorning",
            "team morning",
            "téam",
        ];
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                assert_ne!(
                    storage.snapshot_file(a),
                    storage.snapshot_file(b),
                    "{a} vs {b}"
                );
            }
        }
        assert_eq!(StorageConfig::encode_key("%"), "%25");
    }
}
