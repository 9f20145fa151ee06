use std::fmt;

use crate::error::ProbeError;

/// Operating-system family a facade queries.
///
/// Resolved once when a facade is built and never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
}

impl Platform {
    /// Detects the running operating system.
    pub fn detect() -> Result<Self, ProbeError> {
        let platform = Self::from_os_name(std::env::consts::OS)?;
        if platform == Platform::Linux {
            log_linux_distribution();
        }
        Ok(platform)
    }

    /// Maps an OS name as reported by `std::env::consts::OS`.
    ///
    /// Anything but `windows` and `linux` is rejected before any OS call.
    pub fn from_os_name(os: &str) -> Result<Self, ProbeError> {
        match os {
            "windows" => Ok(Platform::Windows),
            "linux" => Ok(Platform::Linux),
            other => Err(ProbeError::UnsupportedPlatform(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn log_linux_distribution() {
    let Ok(content) = std::fs::read_to_string("/etc/os-release") else {
        tracing::debug!("no /etc/os-release, assuming a generic Linux");
        return;
    };
    let id = os_release_field(&content, "ID").unwrap_or_default();
    if is_debian_family(&content) {
        tracing::debug!(distribution = %id, "detected Debian-family Linux");
    } else {
        // lscpu and procfs behave the same elsewhere; only the family is untested.
        tracing::warn!(distribution = %id, "Linux distribution outside the Debian family");
    }
}

/// Reads a `KEY=value` field from `/etc/os-release` content, unquoted.
pub(crate) fn os_release_field(content: &str, key: &str) -> Option<String> {
    content.lines().find_map(|line| {
        let (k, v) = line.split_once('=')?;
        (k.trim() == key).then(|| v.trim().trim_matches('"').to_string())
    })
}

/// Debian, Ubuntu, Mint, Pop!_OS and friends all name `debian` in `ID` or `ID_LIKE`.
pub(crate) fn is_debian_family(os_release: &str) -> bool {
    ["ID", "ID_LIKE"].iter().any(|key| {
        os_release_field(os_release, key)
            .is_some_and(|v| v.split_whitespace().any(|id| id == "debian" || id == "ubuntu"))
    })
}
