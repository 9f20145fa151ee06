//! Human-readable and machine-readable exports of a [`CpuProfile`].

use std::path::{Path, PathBuf};

use cpuprobe_protocol::CpuProfile;

use crate::error::ProbeError;

const UNKNOWN: &str = "unknown";

/// Output format of a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Aligned `Key : value` lines.
    Text,
    /// `key,value` rows with a header.
    Csv,
    /// The profile itself, pretty-printed.
    Json,
}

impl ReportFormat {
    /// File name used when a report is written into a directory.
    pub fn default_file_name(self) -> &'static str {
        match self {
            ReportFormat::Text => "cpu-report.txt",
            ReportFormat::Csv => "cpu-report.csv",
            ReportFormat::Json => "cpu-report.json",
        }
    }

    /// Picks a format from a file extension (`txt`, `csv`, `json`).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" => Some(ReportFormat::Text),
            "csv" => Some(ReportFormat::Csv),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Report rows in display order: `(key, formatted value)`.
pub fn report_rows(profile: &CpuProfile) -> Vec<(&'static str, String)> {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| UNKNOWN.into());
    let count = |v: Option<u32>| v.map_or_else(|| UNKNOWN.into(), |n| n.to_string());
    let support = |v: Option<bool>| match v {
        Some(true) => "supported".to_string(),
        Some(false) => "not supported".to_string(),
        None => UNKNOWN.into(),
    };

    vec![
        ("cpu_name", text(&profile.name)),
        ("vendor", text(&profile.vendor)),
        ("architecture", text(&profile.architecture)),
        ("family", text(&profile.family)),
        ("stepping", text(&profile.stepping)),
        ("socket", text(&profile.socket)),
        (
            "flags",
            if profile.flags.is_empty() {
                UNKNOWN.into()
            } else {
                profile.flags.join(" ")
            },
        ),
        ("l1_cache_size", format_kib(profile.cache.l1_kib)),
        ("l2_cache_size", format_kib(profile.cache.l2_kib)),
        ("l3_cache_size", format_kib(profile.cache.l3_kib)),
        ("max_clock_speed", format_mhz(profile.max_clock_mhz)),
        ("turbo_boost", support(profile.boost)),
        ("virtualization", support(profile.virtualization)),
        ("cpu_cores", count(profile.physical_cores)),
        ("cpu_threads", count(profile.logical_cores)),
        ("platform", profile.platform.clone()),
        (
            "report_date",
            profile.collected_at.format("%d/%m/%Y %H:%M UTC").to_string(),
        ),
    ]
}

/// Renders `profile` in `format`.
pub fn render(profile: &CpuProfile, format: ReportFormat) -> Result<String, ProbeError> {
    match format {
        ReportFormat::Text => Ok(render_text(&report_rows(profile))),
        ReportFormat::Csv => Ok(render_csv(&report_rows(profile))),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(profile)?),
    }
}

/// Writes a report and returns the path written.
///
/// When `path` is an existing directory the format's default file name is
/// used inside it.
pub fn write_report(
    profile: &CpuProfile,
    path: &Path,
    format: ReportFormat,
) -> Result<PathBuf, ProbeError> {
    let target = if path.is_dir() {
        path.join(format.default_file_name())
    } else {
        path.to_path_buf()
    };
    if let Some(parent) = target.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(&target, render(profile, format)?)?;
    tracing::info!(path = %target.display(), ?format, "cpu report written");
    Ok(target)
}

fn render_text(rows: &[(&'static str, String)]) -> String {
    let labels: Vec<String> = rows.iter().map(|(key, _)| title_case(key)).collect();
    let width = labels.iter().map(String::len).max().unwrap_or(0);

    let mut out = String::new();
    for (label, (_, value)) in labels.iter().zip(rows) {
        out.push_str(&format!("{label:<width$} : {value}\n"));
    }
    out
}

fn render_csv(rows: &[(&'static str, String)]) -> String {
    let mut out = String::from("key,value\n");
    for (key, value) in rows {
        out.push_str(key);
        out.push(',');
        out.push_str(&csv_field(value));
        out.push('\n');
    }
    out
}

/// Quotes a field containing a separator, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `cpu_name` → `Cpu Name`.
fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn format_kib(kib: Option<u64>) -> String {
    match kib {
        None => UNKNOWN.into(),
        Some(kib) if kib >= 1024 && kib % 1024 == 0 => format!("{} MiB", kib / 1024),
        Some(kib) if kib >= 1024 => format!("{:.1} MiB", kib as f64 / 1024.0),
        Some(kib) => format!("{kib} KiB"),
    }
}

fn format_mhz(mhz: Option<u32>) -> String {
    match mhz {
        None => UNKNOWN.into(),
        Some(mhz) if mhz >= 1000 => format!("{:.2} GHz", f64::from(mhz) / 1000.0),
        Some(mhz) => format!("{mhz} MHz"),
    }
}
