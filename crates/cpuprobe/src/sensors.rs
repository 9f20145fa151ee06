//! Live CPU readings. Every call queries the OS again.

use std::time::Duration;

use chrono::Utc;
use cpuprobe_protocol::{SensorKind, SensorReading, SensorSnapshot};

use crate::config::ProbeConfig;
use crate::dispatch::{Dispatcher, UsageRoute};
use crate::error::{ParseError, ProbeError};
use crate::parse::windows::CpuLoad;
use crate::platform::Platform;
use crate::runner::{Runner, SystemRunner};

/// Live CPU sensors.
///
/// Nothing is cached between calls and failures propagate to the caller;
/// a failed call has no effect on the next one.
pub struct Sensors {
    dispatcher: Dispatcher,
    sample_interval: Duration,
}

impl Sensors {
    pub fn new() -> Result<Self, ProbeError> {
        Self::with_config(ProbeConfig::load()?)
    }

    pub fn with_config(config: ProbeConfig) -> Result<Self, ProbeError> {
        let platform = Platform::detect()?;
        let sensors = Self::with_runner(platform, SystemRunner::new(&config))
            .with_sample_interval(config.usage_sample);
        Ok(sensors)
    }

    pub fn with_runner(platform: Platform, runner: impl Runner + 'static) -> Self {
        tracing::info!(%platform, "sensors ready");
        Self {
            dispatcher: Dispatcher::new(platform, Box::new(runner)),
            sample_interval: ProbeConfig::default().usage_sample,
        }
    }

    /// Like [`Sensors::with_runner`] for an OS name; unsupported names fail
    /// before `runner` is touched.
    pub fn for_os(os: &str, runner: impl Runner + 'static) -> Result<Self, ProbeError> {
        let platform = Platform::from_os_name(os)?;
        Ok(Self::with_runner(platform, runner))
    }

    /// Gap between the two counter samples of a usage reading on Linux.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn platform(&self) -> Platform {
        self.dispatcher.platform()
    }

    /// Current clock speed in MHz, averaged over cores (Linux) or sockets (Windows).
    pub fn clock_speed(&self) -> Result<SensorReading, ProbeError> {
        let speeds = self.clock_speeds()?;
        let mean = speeds.iter().map(|(_, mhz)| mhz).sum::<f64>() / speeds.len() as f64;
        Ok(SensorReading::now(SensorKind::ClockSpeed, mean))
    }

    /// Current clock speed of every core (Linux) or socket (Windows).
    pub fn clock_speed_per_core(&self) -> Result<Vec<SensorReading>, ProbeError> {
        Ok(per_core(SensorKind::ClockSpeed, self.clock_speeds()?))
    }

    /// Package temperature in °C.
    pub fn temperature(&self) -> Result<SensorReading, ProbeError> {
        let routes = self.dispatcher.routes();
        let celsius = self.dispatcher.query("temperature", &routes.temperature)?;
        Ok(SensorReading::now(SensorKind::Temperature, celsius))
    }

    /// Overall CPU usage in percent.
    ///
    /// On Linux this blocks for the sample interval.
    pub fn usage(&self) -> Result<SensorReading, ProbeError> {
        let load = self.load()?;
        Ok(SensorReading::now(SensorKind::Usage, load.total))
    }

    /// Usage of every logical processor in percent, tagged with its number.
    ///
    /// On Linux a processor whose counters did not move between the two
    /// samples, or that went offline in between, is left out.
    pub fn usage_per_core(&self) -> Result<Vec<SensorReading>, ProbeError> {
        Ok(per_core(SensorKind::Usage, self.load()?.cores))
    }

    /// Core voltage in volts.
    pub fn voltage(&self) -> Result<SensorReading, ProbeError> {
        let routes = self.dispatcher.routes();
        let volts = self.dispatcher.query("voltage", &routes.voltage)?;
        Ok(SensorReading::now(SensorKind::Voltage, volts))
    }

    /// Reads every sensor once; a failing one is logged and left empty.
    pub fn snapshot(&self) -> SensorSnapshot {
        SensorSnapshot {
            timestamp: Utc::now(),
            clock_speed: self.best_effort(SensorKind::ClockSpeed, self.clock_speed()),
            temperature: self.best_effort(SensorKind::Temperature, self.temperature()),
            usage: self.best_effort(SensorKind::Usage, self.usage()),
            voltage: self.best_effort(SensorKind::Voltage, self.voltage()),
        }
    }

    fn best_effort(
        &self,
        kind: SensorKind,
        reading: Result<SensorReading, ProbeError>,
    ) -> Option<SensorReading> {
        reading
            .inspect_err(|e| {
                tracing::warn!(
                    sensor = %kind,
                    platform = %self.platform(),
                    error = %e,
                    "sensor reading unavailable"
                );
            })
            .ok()
    }

    fn clock_speeds(&self) -> Result<Vec<(u32, f64)>, ProbeError> {
        let routes = self.dispatcher.routes();
        self.dispatcher.query("clock speed", &routes.clock_speeds)
    }

    fn load(&self) -> Result<CpuLoad, ProbeError> {
        let routes = self.dispatcher.routes();
        match self.dispatcher.require("usage", &routes.usage)? {
            UsageRoute::Percentages(route) => self.dispatcher.fetch("usage", route),
            UsageRoute::Counters(route) => {
                let before = self.dispatcher.fetch("usage", route)?;
                std::thread::sleep(self.sample_interval);
                let after = self.dispatcher.fetch("usage", route)?;

                let total = after
                    .total
                    .usage_since(&before.total)
                    .ok_or_else(stalled_counters)?;
                let cores = after
                    .cores
                    .iter()
                    .filter_map(|&(core, now)| {
                        let pct = now.usage_since(before.core(core)?);
                        if pct.is_none() {
                            tracing::debug!(core, "core counters did not advance");
                        }
                        Some((core, pct?))
                    })
                    .collect();
                Ok(CpuLoad { total, cores })
            }
        }
    }
}

fn stalled_counters() -> ParseError {
    ParseError {
        field: "/proc/stat",
        reason: "counters did not advance between samples".into(),
    }
}

fn per_core(kind: SensorKind, values: Vec<(u32, f64)>) -> Vec<SensorReading> {
    values
        .into_iter()
        .map(|(core, value)| SensorReading::for_core(kind, core, value))
        .collect()
}
