//! CPU information and live sensor readings from the operating system's
//! own tools.
//!
//! On Linux the data comes from `/proc/cpuinfo`, `/proc/stat`, sysfs,
//! `lscpu` and `uname`; on Windows from `wmic`. The OS is detected once per
//! facade and every query goes through a static per-platform route table:
//! one source, one parser.
//!
//! - [`Processor`] resolves static attributes once. Failures become `None`.
//! - [`Sensors`] queries on every call. Failures are returned.

mod cache;
mod config;
mod dispatch;
mod error;
pub mod parse;
mod platform;
mod processor;
mod report;
mod runner;
mod sensors;

#[cfg(test)]
mod testing;

pub use cache::{ProfileCache, machine_id};
pub use config::{ProbeConfig, config_file_path};
pub use dispatch::{Dispatcher, Route, RouteTable, UsageRoute};
pub use error::{ParseError, ProbeError, UnavailableError};
pub use platform::Platform;
pub use processor::Processor;
pub use report::{ReportFormat, render, report_rows, write_report};
pub use runner::{Runner, Source, SystemRunner};
pub use sensors::Sensors;

pub use cpuprobe_protocol::{
    CacheSizes, CpuProfile, SensorKind, SensorReading, SensorSnapshot, Unit,
};
