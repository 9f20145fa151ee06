//! On-disk cache of the static CPU profile.
//!
//! One JSON file per machine under the cache directory. Entries older than
//! the TTL, or written by another host sharing the directory, are discarded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use cpuprobe_protocol::CpuProfile;
use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use crate::config::ProbeConfig;
use crate::error::ProbeError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedProfile {
    machine_id: String,
    cached_at: DateTime<Utc>,
    profile: CpuProfile,
}

/// Profile cache bound to one directory and one machine.
#[derive(Debug, Clone)]
pub struct ProfileCache {
    dir: PathBuf,
    ttl: Duration,
    machine_id: String,
}

impl ProfileCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self::with_machine_id(dir, ttl, machine_id())
    }

    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.cache_dir.clone(), config.cache_ttl)
    }

    /// Uses an explicit machine id instead of the host name.
    pub fn with_machine_id(
        dir: impl Into<PathBuf>,
        ttl: Duration,
        machine_id: impl Into<String>,
    ) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            machine_id: machine_id.into(),
        }
    }

    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    /// Path of this machine's cache file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("profile-{}.json", self.machine_id))
    }

    /// Returns the cached profile if present and still fresh.
    ///
    /// Stale, foreign or corrupt entries are deleted and reported as a miss.
    pub fn load(&self) -> Result<Option<CpuProfile>, ProbeError> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let entry = match serde_json::from_str::<CachedProfile>(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding corrupt profile cache");
                remove(&path)?;
                return Ok(None);
            }
        };

        if entry.machine_id != self.machine_id {
            tracing::debug!(
                cached = %entry.machine_id,
                current = %self.machine_id,
                "profile cache belongs to another machine"
            );
            remove(&path)?;
            return Ok(None);
        }

        if self.is_expired(entry.cached_at, Utc::now()) {
            tracing::debug!(cached_at = %entry.cached_at, "profile cache expired");
            remove(&path)?;
            return Ok(None);
        }

        tracing::debug!(path = %path.display(), "profile cache hit");
        Ok(Some(entry.profile))
    }

    /// Writes `profile`, creating the cache directory if needed.
    pub fn store(&self, profile: &CpuProfile) -> Result<(), ProbeError> {
        std::fs::create_dir_all(&self.dir)?;
        let entry = CachedProfile {
            machine_id: self.machine_id.clone(),
            cached_at: Utc::now(),
            profile: profile.clone(),
        };
        let path = self.path();
        std::fs::write(&path, serde_json::to_string_pretty(&entry)?)?;
        tracing::debug!(path = %path.display(), "profile cached");
        Ok(())
    }

    /// Deletes this machine's cache file, if any.
    pub fn clear(&self) -> Result<(), ProbeError> {
        remove(&self.path())
    }

    fn is_expired(&self, cached_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let Ok(ttl) = chrono::Duration::from_std(self.ttl) else {
            return false;
        };
        // A timestamp from the future means the clock moved; don't trust it.
        cached_at > now || now - cached_at > ttl
    }
}

fn remove(path: &Path) -> Result<(), ProbeError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// CRC-32 of the host name, as eight hex digits.
pub fn machine_id() -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".into());
    machine_id_for(&host)
}

fn machine_id_for(host: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(host.as_bytes());
    format!("{:08x}", hasher.finalize())
}
