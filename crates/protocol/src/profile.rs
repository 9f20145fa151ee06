use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Static CPU attributes resolved once per `Processor`.
///
/// Every attribute that could not be queried or parsed is `None` (or an
/// empty `flags` list); consumers treat that as "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuProfile {
    /// Platform tag the profile was collected on (`"linux"` or `"windows"`).
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub architecture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stepping: Option<String>,
    /// Socket designation as reported by firmware (`LGA1200`, `CPU0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_cores: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_cores: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtualization: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_clock_mhz: Option<u32>,
    /// Turbo / boost clocks supported (Intel Turbo Boost, AMD Core Performance Boost).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boost: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<String>,
    #[serde(default)]
    pub cache: CacheSizes,
    pub collected_at: DateTime<Utc>,
}

impl CpuProfile {
    /// Creates a profile with every attribute unknown.
    pub fn unknown(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            name: None,
            vendor: None,
            architecture: None,
            family: None,
            stepping: None,
            socket: None,
            physical_cores: None,
            logical_cores: None,
            virtualization: None,
            max_clock_mhz: None,
            boost: None,
            flags: Vec::new(),
            cache: CacheSizes::default(),
            collected_at: Utc::now(),
        }
    }

    /// Returns `true` if the CPU advertises the given feature flag.
    ///
    /// Comparison is case-insensitive (`wmic` and `/proc/cpuinfo` disagree).
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f.eq_ignore_ascii_case(flag))
    }

    /// Number of attributes that resolved to a value.
    pub fn resolved_count(&self) -> usize {
        [
            self.name.is_some(),
            self.vendor.is_some(),
            self.architecture.is_some(),
            self.family.is_some(),
            self.stepping.is_some(),
            self.socket.is_some(),
            self.physical_cores.is_some(),
            self.logical_cores.is_some(),
            self.virtualization.is_some(),
            self.max_clock_mhz.is_some(),
            self.boost.is_some(),
            !self.flags.is_empty(),
            self.cache.l1_kib.is_some(),
            self.cache.l2_kib.is_some(),
            self.cache.l3_kib.is_some(),
        ]
        .into_iter()
        .filter(|resolved| *resolved)
        .count()
    }
}

/// Cache sizes per level, in KiB.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSizes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l1_kib: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l2_kib: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l3_kib: Option<u64>,
}
