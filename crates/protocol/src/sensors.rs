use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a sensor reading measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorKind {
    ClockSpeed,
    Temperature,
    Usage,
    Voltage,
}

impl SensorKind {
    /// The unit every reading of this kind is expressed in.
    pub fn unit(self) -> Unit {
        match self {
            SensorKind::ClockSpeed => Unit::Megahertz,
            SensorKind::Temperature => Unit::Celsius,
            SensorKind::Usage => Unit::Percent,
            SensorKind::Voltage => Unit::Volts,
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::ClockSpeed => write!(f, "clock speed"),
            SensorKind::Temperature => write!(f, "temperature"),
            SensorKind::Usage => write!(f, "usage"),
            SensorKind::Voltage => write!(f, "voltage"),
        }
    }
}

/// Measurement unit of a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "MHz")]
    Megahertz,
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "V")]
    Volts,
}

impl Unit {
    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Megahertz => "MHz",
            Unit::Celsius => "°C",
            Unit::Percent => "%",
            Unit::Volts => "V",
        }
    }
}

/// A single live sensor value, stamped with the time it was retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    pub kind: SensorKind,
    pub value: f64,
    pub unit: Unit,
    /// Core (or socket) index for per-core readings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core: Option<u32>,
    pub timestamp: DateTime<Utc>,
}

impl SensorReading {
    /// Creates a whole-CPU reading taken now. The unit follows from `kind`.
    pub fn now(kind: SensorKind, value: f64) -> Self {
        Self {
            kind,
            value,
            unit: kind.unit(),
            core: None,
            timestamp: Utc::now(),
        }
    }

    /// Creates a reading for a single core taken now.
    pub fn for_core(kind: SensorKind, core: u32, value: f64) -> Self {
        Self {
            core: Some(core),
            ..Self::now(kind, value)
        }
    }
}

impl fmt::Display for SensorReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.core {
            Some(core) => write!(
                f,
                "{} (core {core}): {:.2} {}",
                self.kind,
                self.value,
                self.unit.symbol()
            ),
            None => write!(f, "{}: {:.2} {}", self.kind, self.value, self.unit.symbol()),
        }
    }
}

/// One best-effort reading of every sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorSnapshot {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clock_speed: Option<SensorReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<SensorReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<SensorReading>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<SensorReading>,
}
