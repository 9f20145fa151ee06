//! Parsers for `wmic ... /format:list` output.
//!
//! The list format is one `Key=Value` per line with records separated by
//! blank lines (one record per socket, cache or logical processor).
//! PowerShell `Format-List` prints `Key : Value` instead, and hand-written
//! fixtures spell keys with spaces (`Max Clock Speed: 2800 MHz`), so keys are
//! compared ignoring case and whitespace and the first `=` or `:` splits the
//! line.

use super::{non_empty, parse_f64, parse_u32, parse_u64};
use crate::error::ParseError;

/// One blank-line separated record of `(key, value)` pairs.
pub type Record<'a> = Vec<(&'a str, &'a str)>;

/// Splits list output into records.
pub fn records(text: &str) -> Vec<Record<'_>> {
    let mut out = Vec::new();
    let mut current = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            continue;
        }
        if let Some(pair) = split_list_line(line) {
            current.push(pair);
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Splits on whichever of `=` and `:` comes first.
fn split_list_line(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(['=', ':'])?;
    let key = line[..idx].trim();
    if key.is_empty() {
        return None;
    }
    Some((key, line[idx + 1..].trim()))
}

fn key_matches(found: &str, wanted: &str) -> bool {
    let mut found = found.chars().filter(|c| !c.is_whitespace());
    let mut wanted = wanted.chars().filter(|c| !c.is_whitespace());
    loop {
        match (found.next(), wanted.next()) {
            (None, None) => return true,
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(&b) => {}
            _ => return false,
        }
    }
}

fn record_value<'a>(record: &Record<'a>, key: &str) -> Option<&'a str> {
    record
        .iter()
        .find(|(k, v)| key_matches(k, key) && !v.is_empty())
        .map(|(_, v)| *v)
}

/// Every non-empty value of `key`, in output order.
pub fn values<'a>(text: &'a str, key: &str) -> Vec<&'a str> {
    text.lines()
        .filter_map(|line| split_list_line(line.trim()))
        .filter(|(k, v)| key_matches(k, key) && !v.is_empty())
        .map(|(_, v)| v)
        .collect()
}

fn first_value<'a>(text: &'a str, key: &'static str) -> Result<&'a str, ParseError> {
    values(text, key)
        .into_iter()
        .next()
        .ok_or_else(|| ParseError::missing(key))
}

fn sum_u32(text: &str, key: &'static str) -> Result<u32, ParseError> {
    let counts = values(text, key)
        .into_iter()
        .map(|v| parse_u32(key, v))
        .collect::<Result<Vec<_>, _>>()?;
    if counts.is_empty() {
        return Err(ParseError::missing(key));
    }
    Ok(counts.into_iter().sum())
}

pub fn wmic_name(text: &str) -> Result<String, ParseError> {
    non_empty("Name", first_value(text, "Name")?)
}

pub fn wmic_manufacturer(text: &str) -> Result<String, ParseError> {
    non_empty("Manufacturer", first_value(text, "Manufacturer")?)
}

pub fn wmic_family(text: &str) -> Result<String, ParseError> {
    non_empty("Family", first_value(text, "Family")?)
}

pub fn wmic_stepping(text: &str) -> Result<String, ParseError> {
    non_empty("Stepping", first_value(text, "Stepping")?)
}

/// `SocketDesignation` of the first socket (`LGA1200`, `CPU0`, `AM4`).
pub fn wmic_socket(text: &str) -> Result<String, ParseError> {
    non_empty("SocketDesignation", first_value(text, "SocketDesignation")?)
}

/// Maps the `Win32_Processor.Architecture` code to the names `uname -m` uses.
pub fn wmic_architecture(text: &str) -> Result<String, ParseError> {
    let raw = first_value(text, "Architecture")?;
    let arch = match parse_u32("Architecture", raw)? {
        0 => "x86",
        1 => "mips",
        2 => "alpha",
        3 => "powerpc",
        5 => "arm",
        6 => "ia64",
        9 => "x86_64",
        12 => "aarch64",
        _ => return Err(ParseError::invalid("Architecture", raw)),
    };
    Ok(arch.to_string())
}

/// Physical cores summed over every socket.
pub fn wmic_physical_cores(text: &str) -> Result<u32, ParseError> {
    sum_u32(text, "NumberOfCores")
}

/// Logical processors summed over every socket.
pub fn wmic_logical_cores(text: &str) -> Result<u32, ParseError> {
    sum_u32(text, "NumberOfLogicalProcessors")
}

/// `VirtualizationFirmwareEnabled`, falling back to `VMMonitorModeExtensions`
/// (which is blank on some firmware) from the same output.
pub fn wmic_virtualization(text: &str) -> Result<bool, ParseError> {
    let raw = values(text, "VirtualizationFirmwareEnabled")
        .into_iter()
        .next()
        .or_else(|| values(text, "VMMonitorModeExtensions").into_iter().next())
        .ok_or_else(|| ParseError::missing("VirtualizationFirmwareEnabled"))?;
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::invalid("VirtualizationFirmwareEnabled", raw)),
    }
}

/// `MaxClockSpeed` in MHz (`Max Clock Speed: 2800 MHz` → 2800).
pub fn wmic_max_clock_mhz(text: &str) -> Result<u32, ParseError> {
    parse_u32("MaxClockSpeed", first_value(text, "MaxClockSpeed")?)
}

/// `CurrentClockSpeed` of every socket in MHz, numbered in output order.
pub fn wmic_clock_speeds(text: &str) -> Result<Vec<(u32, f64)>, ParseError> {
    let speeds = values(text, "CurrentClockSpeed")
        .into_iter()
        .zip(0u32..)
        .map(|(v, socket)| Ok((socket, parse_f64("CurrentClockSpeed", v)?)))
        .collect::<Result<Vec<_>, ParseError>>()?;
    if speeds.is_empty() {
        return Err(ParseError::missing("CurrentClockSpeed"));
    }
    Ok(speeds)
}

/// `L2CacheSize` in KiB.
pub fn wmic_l2_cache_kib(text: &str) -> Result<u64, ParseError> {
    parse_u64("L2CacheSize", first_value(text, "L2CacheSize")?)
}

/// `L3CacheSize` in KiB.
pub fn wmic_l3_cache_kib(text: &str) -> Result<u64, ParseError> {
    parse_u64("L3CacheSize", first_value(text, "L3CacheSize")?)
}

/// L1 size from `Win32_CacheMemory`: the record whose `Purpose` is
/// `L1 Cache` or, failing that, whose `Level` is 3 ("Primary").
pub fn wmic_l1_cache_kib(text: &str) -> Result<u64, ParseError> {
    let all = records(text);
    let record = all
        .iter()
        .find(|r| record_value(r, "Purpose").is_some_and(|p| key_matches(p, "L1 Cache")))
        .or_else(|| all.iter().find(|r| record_value(r, "Level") == Some("3")))
        .ok_or_else(|| ParseError::missing("L1 Cache"))?;
    let size = record_value(record, "InstalledSize")
        .ok_or_else(|| ParseError::missing("InstalledSize"))?;
    parse_u64("InstalledSize", size)
}

/// `MSAcpi_ThermalZoneTemperature.CurrentTemperature` is tenths of a Kelvin.
pub fn wmic_thermal_celsius(text: &str) -> Result<f64, ParseError> {
    let deci_kelvin = parse_f64("CurrentTemperature", first_value(text, "CurrentTemperature")?)?;
    Ok((deci_kelvin - 2731.5) / 10.0)
}

/// `Win32_Processor.CurrentVoltage` in volts.
///
/// With bit 7 set the low seven bits hold tenths of a volt; otherwise the
/// whole value does.
pub fn wmic_voltage(text: &str) -> Result<f64, ParseError> {
    let raw = parse_u32("CurrentVoltage", first_value(text, "CurrentVoltage")?)?;
    let tenths = if raw & 0x80 != 0 { raw & 0x7f } else { raw };
    Ok(f64::from(tenths) / 10.0)
}

/// Per-processor and total load from `Win32_PerfFormattedData_PerfOS_Processor`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuLoad {
    pub total: f64,
    /// `(logical processor number, percent)`, ascending.
    pub cores: Vec<(u32, f64)>,
}

/// Parses `Name`/`PercentProcessorTime` records. `Name` is the processor
/// index or `_Total`; without a `_Total` record the mean of the cores is used.
pub fn wmic_processor_load(text: &str) -> Result<CpuLoad, ParseError> {
    let mut total = None;
    let mut cores: Vec<(u32, f64)> = Vec::new();

    for record in records(text) {
        let (Some(name), Some(pct)) = (
            record_value(&record, "Name"),
            record_value(&record, "PercentProcessorTime"),
        ) else {
            continue;
        };
        let pct = parse_f64("PercentProcessorTime", pct)?;
        if name == "_Total" {
            total = Some(pct);
        } else if let Ok(idx) = name.parse::<u32>() {
            cores.push((idx, pct));
        } else if let Some((_, idx)) = name.split_once(',') {
            // Processor groups are named "0,3" (group, index).
            if let Ok(idx) = idx.parse::<u32>() {
                cores.push((idx, pct));
            }
        }
    }

    cores.sort_by_key(|(idx, _)| *idx);

    let total = match total {
        Some(total) => total,
        None if !cores.is_empty() => {
            cores.iter().map(|(_, pct)| pct).sum::<f64>() / cores.len() as f64
        }
        None => return Err(ParseError::missing("PercentProcessorTime")),
    };
    Ok(CpuLoad { total, cores })
}
