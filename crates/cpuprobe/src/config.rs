//! Probe configuration.
//!
//! Reads/writes JSON at `~/.config/cpuprobe/config.json` (Linux) or
//! `%APPDATA%\cpuprobe\config.json` (Windows). Missing or invalid fields fall
//! back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 5_000;
const MAX_COMMAND_TIMEOUT_MS: u64 = 60_000;
const DEFAULT_USAGE_SAMPLE_MS: u64 = 200;
const MIN_USAGE_SAMPLE_MS: u64 = 50;
const MAX_USAGE_SAMPLE_MS: u64 = 5_000;
const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60 * 24;

/// On-disk config format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    proc_root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sys_root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    command_timeout_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    usage_sample_ms: Option<u64>,
    #[serde(default)]
    cache_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cache_ttl_secs: Option<u64>,
}

/// Probe configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeConfig {
    /// Mount point of procfs (Linux).
    pub proc_root: PathBuf,
    /// Mount point of sysfs (Linux).
    pub sys_root: PathBuf,
    /// Per-command timeout; `None` waits forever.
    pub command_timeout: Option<Duration>,
    /// Gap between the two `/proc/stat` samples of a usage reading.
    pub usage_sample: Duration,
    /// Persist the static CPU profile between runs.
    pub cache_enabled: bool,
    pub cache_dir: PathBuf,
    pub cache_ttl: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            proc_root: PathBuf::from("/proc"),
            sys_root: PathBuf::from("/sys"),
            command_timeout: Some(Duration::from_millis(DEFAULT_COMMAND_TIMEOUT_MS)),
            usage_sample: Duration::from_millis(DEFAULT_USAGE_SAMPLE_MS),
            cache_enabled: false,
            cache_dir: default_cache_dir(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }
}

impl ProbeConfig {
    /// Loads configuration from the default location.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self, ProbeError> {
        Self::load_from(&config_file_path())
    }

    /// Loads configuration from an explicit path.
    ///
    /// An unreadable or malformed file is logged and yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ProbeError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to read probe config, using defaults"
                );
                return Ok(Self::default());
            }
        };
        match serde_json::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Self::from_file(file)),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse probe config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ProbeError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = ConfigFile {
            proc_root: Some(self.proc_root.clone()),
            sys_root: Some(self.sys_root.clone()),
            command_timeout_ms: Some(
                self.command_timeout
                    .map(|t| t.as_millis() as u64)
                    .unwrap_or(0),
            ),
            usage_sample_ms: Some(self.usage_sample.as_millis() as u64),
            cache_enabled: self.cache_enabled,
            cache_dir: Some(self.cache_dir.clone()),
            cache_ttl_secs: Some(self.cache_ttl.as_secs()),
        };

        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(path, json)?;

        tracing::debug!(path = %path.display(), "probe configuration saved");
        Ok(())
    }

    /// Saves configuration to the default location.
    pub fn save(&self) -> Result<(), ProbeError> {
        self.save_to(&config_file_path())
    }

    fn from_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(root) = file.proc_root.filter(|p| !p.as_os_str().is_empty()) {
            config.proc_root = root;
        }
        if let Some(root) = file.sys_root.filter(|p| !p.as_os_str().is_empty()) {
            config.sys_root = root;
        }
        match file.command_timeout_ms {
            Some(0) => config.command_timeout = None,
            Some(ms) if ms <= MAX_COMMAND_TIMEOUT_MS => {
                config.command_timeout = Some(Duration::from_millis(ms));
            }
            _ => {}
        }
        if let Some(ms) = file.usage_sample_ms {
            config.usage_sample =
                Duration::from_millis(ms.clamp(MIN_USAGE_SAMPLE_MS, MAX_USAGE_SAMPLE_MS));
        }
        config.cache_enabled = file.cache_enabled;
        if let Some(dir) = file.cache_dir.filter(|p| !p.as_os_str().is_empty()) {
            config.cache_dir = dir;
        }
        if let Some(secs) = file.cache_ttl_secs.filter(|s| *s > 0) {
            config.cache_ttl = Duration::from_secs(secs);
        }

        config
    }
}

/// Default config file location.
pub fn config_file_path() -> PathBuf {
    config_base_dir().join("cpuprobe").join("config.json")
}

fn config_base_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata)
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".config")
    }
}

fn default_cache_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let local =
            std::env::var("LOCALAPPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData\\Local".into());
        PathBuf::from(local).join("cpuprobe")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home).join(".cache").join("cpuprobe")
    }
}
