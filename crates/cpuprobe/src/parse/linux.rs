//! Parsers for `/proc/cpuinfo`, `/proc/stat`, `lscpu`, `uname -m` and sysfs files.

use super::{colon_value, non_empty, parse_f64, parse_u32, size_to_kib};
use crate::error::ParseError;

/// Model name from `/proc/cpuinfo` (`model name : AMD Ryzen 3 3200G`).
pub fn cpuinfo_model_name(text: &str) -> Result<String, ParseError> {
    let value = colon_value(text, "model name").ok_or_else(|| ParseError::missing("model name"))?;
    non_empty("model name", value)
}

/// Vendor from `/proc/cpuinfo`.
///
/// x86 kernels print `vendor_id`; ARM kernels only print the numeric
/// `CPU implementer`, which is mapped to a vendor name.
pub fn cpuinfo_vendor(text: &str) -> Result<String, ParseError> {
    if let Some(vendor) = colon_value(text, "vendor_id") {
        return non_empty("vendor_id", vendor);
    }

    let implementer =
        colon_value(text, "CPU implementer").ok_or_else(|| ParseError::missing("vendor_id"))?;
    let code = u32::from_str_radix(implementer.trim_start_matches("0x"), 16)
        .map_err(|_| ParseError::invalid("CPU implementer", implementer))?;
    Ok(match code {
        0x41 => "ARM",
        0x42 => "Broadcom",
        0x43 => "Cavium",
        0x44 => "DEC",
        0x46 => "Fujitsu",
        0x48 => "HiSilicon",
        0x4e => "Nvidia",
        0x50 => "APM",
        0x51 => "Qualcomm",
        0x56 => "Marvell",
        0x61 => "Apple",
        0x69 => "Intel",
        0xc0 => "Ampere",
        _ => return Ok(implementer.to_string()),
    }
    .to_string())
}

/// Feature flags from `/proc/cpuinfo` (`flags` on x86, `Features` on ARM).
pub fn cpuinfo_flags(text: &str) -> Result<Vec<String>, ParseError> {
    let value = colon_value(text, "flags")
        .or_else(|| colon_value(text, "Features"))
        .ok_or_else(|| ParseError::missing("flags"))?;
    Ok(value.split_whitespace().map(str::to_string).collect())
}

/// Turbo support from the x86 `flags` line: `cpb` (AMD Core Performance
/// Boost) or `ida` (Intel Dynamic Acceleration).
///
/// ARM kernels print `Features` without an equivalent, so the answer there
/// is unknown rather than `false`.
pub fn cpuinfo_boost(text: &str) -> Result<bool, ParseError> {
    let flags = colon_value(text, "flags").ok_or_else(|| ParseError::missing("flags"))?;
    Ok(flags.split_whitespace().any(|f| f == "cpb" || f == "ida"))
}

/// Current clock of every logical CPU, keyed by its `processor` number.
pub fn cpuinfo_clock_speeds(text: &str) -> Result<Vec<(u32, f64)>, ParseError> {
    let mut processor = None;
    let mut speeds = Vec::new();

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        match key.trim() {
            "processor" => processor = Some(parse_u32("processor", value)?),
            k if k.eq_ignore_ascii_case("cpu MHz") => {
                // Kernels without `processor` lines number CPUs in order.
                let idx = processor.take().unwrap_or(speeds.len() as u32);
                speeds.push((idx, parse_f64("cpu MHz", value)?));
            }
            _ => {}
        }
    }

    if speeds.is_empty() {
        return Err(ParseError::missing("cpu MHz"));
    }
    Ok(speeds)
}

/// Machine architecture from `uname -m`.
pub fn uname_architecture(text: &str) -> Result<String, ParseError> {
    let arch = text.lines().next().unwrap_or("");
    non_empty("architecture", arch)
}

pub fn lscpu_family(text: &str) -> Result<String, ParseError> {
    lscpu_string(text, "CPU family")
}

pub fn lscpu_stepping(text: &str) -> Result<String, ParseError> {
    lscpu_string(text, "Stepping")
}

/// Physical cores: `Core(s) per socket` × `Socket(s)`.
///
/// Some ARM boards report clusters instead of sockets.
pub fn lscpu_physical_cores(text: &str) -> Result<u32, ParseError> {
    let per_socket = colon_value(text, "Core(s) per socket")
        .or_else(|| colon_value(text, "Core(s) per cluster"))
        .ok_or_else(|| ParseError::missing("Core(s) per socket"))?;
    let per_socket = parse_u32("Core(s) per socket", per_socket)?;

    let sockets = match topology_count(text, "Socket(s)")
        .or_else(|| topology_count(text, "Cluster(s)"))
    {
        Some(v) => parse_u32("Socket(s)", v)?,
        None => 1,
    };
    Ok(per_socket * sockets)
}

/// lscpu prints "-" when the topology level is not exposed.
fn topology_count<'a>(text: &'a str, key: &str) -> Option<&'a str> {
    colon_value(text, key).filter(|v| *v != "-")
}

/// Logical CPUs from the `CPU(s)` line.
pub fn lscpu_logical_cores(text: &str) -> Result<u32, ParseError> {
    let value = colon_value(text, "CPU(s)").ok_or_else(|| ParseError::missing("CPU(s)"))?;
    parse_u32("CPU(s)", value)
}

/// Hardware virtualization support.
///
/// `Virtualization: VT-x` / `AMD-V` is authoritative; otherwise the `vmx`
/// (Intel) and `svm` (AMD) flags decide. A running hypervisor is not
/// evidence of support, so `Hypervisor vendor` is ignored.
pub fn lscpu_virtualization(text: &str) -> Result<bool, ParseError> {
    if let Some(value) = colon_value(text, "Virtualization") {
        return Ok(matches!(value, "VT-x" | "AMD-V"));
    }
    let flags = colon_value(text, "Flags").ok_or_else(|| ParseError::missing("Virtualization"))?;
    Ok(flags.split_whitespace().any(|f| f == "vmx" || f == "svm"))
}

pub fn lscpu_l1d_cache_kib(text: &str) -> Result<u64, ParseError> {
    lscpu_cache(text, &["L1d cache", "L1d"])
}

pub fn lscpu_l2_cache_kib(text: &str) -> Result<u64, ParseError> {
    lscpu_cache(text, &["L2 cache", "L2"])
}

pub fn lscpu_l3_cache_kib(text: &str) -> Result<u64, ParseError> {
    lscpu_cache(text, &["L3 cache", "L3"])
}

/// Max clock in whole MHz.
///
/// `CPU max MHz` only appears when cpufreq is available; guests without it
/// fall back to the nominal `CPU MHz`.
pub fn lscpu_max_clock_mhz(text: &str) -> Result<u32, ParseError> {
    let (key, value) = colon_value(text, "CPU max MHz")
        .map(|v| ("CPU max MHz", v))
        .or_else(|| colon_value(text, "CPU MHz").map(|v| ("CPU MHz", v)))
        .ok_or_else(|| ParseError::missing("CPU max MHz"))?;
    Ok(parse_f64(key, value)?.round() as u32)
}

/// hwmon `temp*_input` holds millidegrees Celsius.
pub fn hwmon_celsius(text: &str) -> Result<f64, ParseError> {
    let raw = text.trim();
    let millis: i64 = raw
        .parse()
        .map_err(|_| ParseError::invalid("temp1_input", raw))?;
    Ok(millis as f64 / 1000.0)
}

/// Cumulative jiffies of one `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub idle: u64,
    pub total: u64,
}

impl CpuTimes {
    /// Busy percentage between an earlier sample and this one, one decimal.
    ///
    /// `None` when no time elapsed (the counters did not move).
    pub fn usage_since(&self, earlier: &CpuTimes) -> Option<f64> {
        let d_total = self.total.checked_sub(earlier.total)?;
        if d_total == 0 {
            return None;
        }
        let d_idle = self.idle.saturating_sub(earlier.idle).min(d_total);
        let pct = (1.0 - d_idle as f64 / d_total as f64) * 100.0;
        Some((pct * 10.0).floor() / 10.0)
    }
}

/// One read of `/proc/stat`: the aggregate `cpu` line plus every `cpuN` line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatSample {
    pub total: CpuTimes,
    /// `(N, times)` for each `cpuN` line. Offline CPUs have no line.
    pub cores: Vec<(u32, CpuTimes)>,
}

impl StatSample {
    pub fn core(&self, idx: u32) -> Option<&CpuTimes> {
        self.cores.iter().find(|(n, _)| *n == idx).map(|(_, t)| t)
    }
}

/// Parses the `cpu` lines of `/proc/stat`.
///
/// Fields: user nice system idle iowait irq softirq steal guest guest_nice.
/// Idle time counts `idle` and `iowait`; guest time is already part of
/// `user`/`nice` and is excluded from the total.
pub fn proc_stat(text: &str) -> Result<StatSample, ParseError> {
    let mut total = None;
    let mut cores = Vec::new();

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        let Some(label) = parts.next() else { continue };
        let Some(suffix) = label.strip_prefix("cpu") else {
            continue;
        };

        let fields = parts
            .map(|f| f.parse::<u64>().map_err(|_| ParseError::invalid("/proc/stat", line)))
            .collect::<Result<Vec<_>, _>>()?;
        if fields.len() < 4 {
            return Err(ParseError::invalid("/proc/stat", line));
        }

        let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
        let total_jiffies: u64 = fields.iter().take(8).sum();
        let times = CpuTimes {
            idle,
            total: total_jiffies,
        };

        if suffix.is_empty() {
            total = Some(times);
        } else if let Ok(idx) = suffix.parse::<u32>() {
            cores.push((idx, times));
        }
    }

    Ok(StatSample {
        total: total.ok_or_else(|| ParseError::missing("cpu"))?,
        cores,
    })
}

fn lscpu_string(text: &str, key: &'static str) -> Result<String, ParseError> {
    let value = colon_value(text, key).ok_or_else(|| ParseError::missing(key))?;
    non_empty(key, value)
}

/// Newer lscpu prints `L1d: 256 KiB (8 instances)` under a "Caches" header,
/// older ones `L1d cache: 32K`.
fn lscpu_cache(text: &str, keys: &[&'static str]) -> Result<u64, ParseError> {
    for key in keys {
        if let Some(value) = colon_value(text, key) {
            return size_to_kib(key, value);
        }
    }
    Err(ParseError::missing(keys[0]))
}
