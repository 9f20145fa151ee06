//! Canned runners for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::UnavailableError;
use crate::runner::{Runner, Source};

/// Shared view of how many times a runner was called.
#[derive(Debug, Clone, Default)]
pub struct CallCount(Arc<AtomicUsize>);

impl CallCount {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Answers each source with fixed text; unknown sources are `NotFound`.
///
/// A source given several outputs cycles through them in order.
#[derive(Debug, Default)]
pub struct FixtureRunner {
    outputs: Mutex<HashMap<Source, VecDeque<String>>>,
    calls: CallCount,
}

impl FixtureRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, source: Source, output: &str) -> Self {
        self.with_sequence(source, &[output])
    }

    pub fn with_sequence(self, source: Source, outputs: &[&str]) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .insert(source, outputs.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn calls(&self) -> CallCount {
        self.calls.clone()
    }
}

impl Runner for FixtureRunner {
    fn run(&self, source: &Source) -> Result<String, UnavailableError> {
        self.calls.bump();
        let mut outputs = self.outputs.lock().unwrap();
        let queue = outputs
            .get_mut(source)
            .ok_or_else(|| UnavailableError::NotFound(source.to_string()))?;
        let out = queue
            .pop_front()
            .ok_or_else(|| UnavailableError::NotFound(source.to_string()))?;
        queue.push_back(out.clone());
        Ok(out)
    }
}

/// Fails every call, like a sandbox without any of the OS tools.
#[derive(Debug, Default)]
pub struct FailingRunner {
    calls: CallCount,
}

impl FailingRunner {
    pub fn calls(&self) -> CallCount {
        self.calls.clone()
    }
}

impl Runner for FailingRunner {
    fn run(&self, source: &Source) -> Result<String, UnavailableError> {
        self.calls.bump();
        Err(UnavailableError::NotFound(source.to_string()))
    }
}

pub const CPUINFO: &str = "processor\t: 0\n\
vendor_id\t: AuthenticAMD\n\
model name\t: AMD Ryzen 3 3200G\n\
cpu MHz\t\t: 1400.000\n\
flags\t\t: fpu vme de pse svm sse4_2 cpb\n\
\n\
processor\t: 1\n\
vendor_id\t: AuthenticAMD\n\
model name\t: AMD Ryzen 3 3200G\n\
cpu MHz\t\t: 3600.000\n\
flags\t\t: fpu vme de pse svm sse4_2 cpb\n";

pub const LSCPU: &str = "Architecture:            x86_64\n\
CPU(s):                  4\n\
Vendor ID:               AuthenticAMD\n\
  Model name:            AMD Ryzen 3 3200G\n\
    CPU family:          23\n\
    Core(s) per socket:  4\n\
    Socket(s):           1\n\
    Stepping:            1\n\
    CPU max MHz:         3600.0000\n\
Virtualization features:\n\
  Virtualization:        AMD-V\n\
Caches (sum of all):\n\
  L1d:                   128 KiB (4 instances)\n\
  L2:                    2 MiB (4 instances)\n\
  L3:                    4 MiB (1 instance)\n";

pub const STAT_BEFORE: &str = "cpu  100 0 100 800 0 0 0 0 0 0\n\
cpu0 50 0 50 400 0 0 0 0 0 0\n\
cpu1 50 0 50 400 0 0 0 0 0 0\n\
intr 12345\n";

pub const STAT_AFTER: &str = "cpu  200 0 100 900 0 0 0 0 0 0\n\
cpu0 100 0 50 450 0 0 0 0 0 0\n\
cpu1 100 0 50 450 0 0 0 0 0 0\n\
intr 12399\n";

/// cpu1 is offline and cpu3 stalls between the two samples.
pub const STAT_GAP_BEFORE: &str = "cpu  300 0 0 300 0 0 0 0 0 0\n\
cpu0 100 0 0 100 0 0 0 0 0 0\n\
cpu2 100 0 0 100 0 0 0 0 0 0\n\
cpu3 100 0 0 100 0 0 0 0 0 0\n";

pub const STAT_GAP_AFTER: &str = "cpu  400 0 0 400 0 0 0 0 0 0\n\
cpu0 150 0 0 150 0 0 0 0 0 0\n\
cpu2 175 0 0 125 0 0 0 0 0 0\n\
cpu3 100 0 0 100 0 0 0 0 0 0\n";

pub const LSCPU_SOURCE: Source = Source::Command {
    program: "lscpu",
    args: &[],
};

/// Every Linux source of a 4-core Ryzen box.
pub fn linux_runner() -> FixtureRunner {
    FixtureRunner::new()
        .with(Source::ProcFile("cpuinfo"), CPUINFO)
        .with(LSCPU_SOURCE, LSCPU)
        .with(
            Source::Command {
                program: "uname",
                args: &["-m"],
            },
            "x86_64\n",
        )
        .with(
            Source::Hwmon {
                chips: &["k10temp", "coretemp", "zenpower", "cpu_thermal"],
                file: "temp1_input",
            },
            "45250\n",
        )
        .with_sequence(Source::ProcFile("stat"), &[STAT_BEFORE, STAT_AFTER])
}

pub const fn wmic(args: &'static [&'static str]) -> Source {
    Source::Command {
        program: "wmic",
        args,
    }
}

pub const WMIC_CLOCK: Source = wmic(&["cpu", "get", "CurrentClockSpeed", "/format:list"]);
pub const WMIC_LOAD: Source = wmic(&[
    "path",
    "Win32_PerfFormattedData_PerfOS_Processor",
    "get",
    "Name,PercentProcessorTime",
    "/format:list",
]);
pub const WMIC_VOLTAGE: Source = wmic(&["cpu", "get", "CurrentVoltage", "/format:list"]);

/// The sensor sources of a single-socket Windows box.
pub fn windows_sensor_runner() -> FixtureRunner {
    FixtureRunner::new()
        .with(WMIC_CLOCK, "\r\n\r\nCurrentClockSpeed=2592\r\n\r\n\r\n")
        .with(
            WMIC_LOAD,
            "Name=0\r\nPercentProcessorTime=12\r\n\r\n\
Name=1\r\nPercentProcessorTime=36\r\n\r\n\
Name=_Total\r\nPercentProcessorTime=24\r\n\r\n",
        )
        .with(WMIC_VOLTAGE, "CurrentVoltage=12\r\n")
}
