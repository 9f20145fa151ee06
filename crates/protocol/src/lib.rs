//! Data model shared by cpuprobe and its consumers.
//!
//! Everything here is plain serde data: no I/O, no platform code.

pub mod profile;
pub mod sensors;

pub use profile::{CacheSizes, CpuProfile};
pub use sensors::{SensorKind, SensorReading, SensorSnapshot, Unit};
