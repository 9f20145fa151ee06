//! Static routing of (platform, fact) to a data source and its parser.

use crate::error::{ParseError, ProbeError, UnavailableError};
use crate::parse::linux::{self, StatSample};
use crate::parse::windows::{self, CpuLoad};
use crate::platform::Platform;
use crate::runner::{Runner, Source};

/// One data source paired with the parser for its output.
pub struct Route<T: 'static> {
    pub source: Source,
    pub parse: fn(&str) -> Result<T, ParseError>,
}

/// How a platform reports CPU usage.
pub enum UsageRoute {
    /// Cumulative counters; usage is the delta between two samples.
    Counters(Route<StatSample>),
    /// Ready-made percentages from a single query.
    Percentages(Route<CpuLoad>),
}

/// Every fact a platform can answer. `None` means the platform has no
/// built-in source for it.
pub struct RouteTable {
    pub name: Option<Route<String>>,
    pub vendor: Option<Route<String>>,
    pub architecture: Option<Route<String>>,
    pub family: Option<Route<String>>,
    pub stepping: Option<Route<String>>,
    pub socket: Option<Route<String>>,
    pub physical_cores: Option<Route<u32>>,
    pub logical_cores: Option<Route<u32>>,
    pub virtualization: Option<Route<bool>>,
    pub max_clock: Option<Route<u32>>,
    pub boost: Option<Route<bool>>,
    pub flags: Option<Route<Vec<String>>>,
    pub l1_cache: Option<Route<u64>>,
    pub l2_cache: Option<Route<u64>>,
    pub l3_cache: Option<Route<u64>>,
    /// `(core or socket number, MHz)`.
    pub clock_speeds: Option<Route<Vec<(u32, f64)>>>,
    pub temperature: Option<Route<f64>>,
    pub usage: Option<UsageRoute>,
    pub voltage: Option<Route<f64>>,
}

impl Platform {
    /// The route table for this platform.
    pub fn routes(self) -> &'static RouteTable {
        match self {
            Platform::Linux => &LINUX,
            Platform::Windows => &WINDOWS,
        }
    }
}

// ---------------------------------------------------------------------------
// Linux
// ---------------------------------------------------------------------------

const CPUINFO: Source = Source::ProcFile("cpuinfo");
const LSCPU: Source = Source::Command {
    program: "lscpu",
    args: &[],
};

static LINUX: RouteTable = RouteTable {
    name: Some(Route {
        source: CPUINFO,
        parse: linux::cpuinfo_model_name,
    }),
    vendor: Some(Route {
        source: CPUINFO,
        parse: linux::cpuinfo_vendor,
    }),
    architecture: Some(Route {
        source: Source::Command {
            program: "uname",
            args: &["-m"],
        },
        parse: linux::uname_architecture,
    }),
    family: Some(Route {
        source: LSCPU,
        parse: linux::lscpu_family,
    }),
    stepping: Some(Route {
        source: LSCPU,
        parse: linux::lscpu_stepping,
    }),
    // Only DMI tables know the socket, and reading them needs root.
    socket: None,
    physical_cores: Some(Route {
        source: LSCPU,
        parse: linux::lscpu_physical_cores,
    }),
    logical_cores: Some(Route {
        source: LSCPU,
        parse: linux::lscpu_logical_cores,
    }),
    virtualization: Some(Route {
        source: LSCPU,
        parse: linux::lscpu_virtualization,
    }),
    max_clock: Some(Route {
        source: LSCPU,
        parse: linux::lscpu_max_clock_mhz,
    }),
    boost: Some(Route {
        source: CPUINFO,
        parse: linux::cpuinfo_boost,
    }),
    flags: Some(Route {
        source: CPUINFO,
        parse: linux::cpuinfo_flags,
    }),
    l1_cache: Some(Route {
        source: LSCPU,
        parse: linux::lscpu_l1d_cache_kib,
    }),
    l2_cache: Some(Route {
        source: LSCPU,
        parse: linux::lscpu_l2_cache_kib,
    }),
    l3_cache: Some(Route {
        source: LSCPU,
        parse: linux::lscpu_l3_cache_kib,
    }),
    clock_speeds: Some(Route {
        source: CPUINFO,
        parse: linux::cpuinfo_clock_speeds,
    }),
    temperature: Some(Route {
        source: Source::Hwmon {
            chips: &["k10temp", "coretemp", "zenpower", "cpu_thermal"],
            file: "temp1_input",
        },
        parse: linux::hwmon_celsius,
    }),
    usage: Some(UsageRoute::Counters(Route {
        source: Source::ProcFile("stat"),
        parse: linux::proc_stat,
    })),
    voltage: None,
};

// ---------------------------------------------------------------------------
// Windows
// ---------------------------------------------------------------------------

const WMIC: &str = "wmic";

static WINDOWS: RouteTable = RouteTable {
    name: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "Name", "/format:list"],
        },
        parse: windows::wmic_name,
    }),
    vendor: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "Manufacturer", "/format:list"],
        },
        parse: windows::wmic_manufacturer,
    }),
    architecture: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "Architecture", "/format:list"],
        },
        parse: windows::wmic_architecture,
    }),
    family: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "Family", "/format:list"],
        },
        parse: windows::wmic_family,
    }),
    stepping: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "Stepping", "/format:list"],
        },
        parse: windows::wmic_stepping,
    }),
    socket: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "SocketDesignation", "/format:list"],
        },
        parse: windows::wmic_socket,
    }),
    physical_cores: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "NumberOfCores", "/format:list"],
        },
        parse: windows::wmic_physical_cores,
    }),
    logical_cores: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "NumberOfLogicalProcessors", "/format:list"],
        },
        parse: windows::wmic_logical_cores,
    }),
    virtualization: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &[
                "cpu",
                "get",
                "VirtualizationFirmwareEnabled,VMMonitorModeExtensions",
                "/format:list",
            ],
        },
        parse: windows::wmic_virtualization,
    }),
    max_clock: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "MaxClockSpeed", "/format:list"],
        },
        parse: windows::wmic_max_clock_mhz,
    }),
    boost: None,
    flags: None,
    l1_cache: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &[
                "path",
                "Win32_CacheMemory",
                "get",
                "Level,InstalledSize,Purpose",
                "/format:list",
            ],
        },
        parse: windows::wmic_l1_cache_kib,
    }),
    l2_cache: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "L2CacheSize", "/format:list"],
        },
        parse: windows::wmic_l2_cache_kib,
    }),
    l3_cache: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "L3CacheSize", "/format:list"],
        },
        parse: windows::wmic_l3_cache_kib,
    }),
    clock_speeds: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "CurrentClockSpeed", "/format:list"],
        },
        parse: windows::wmic_clock_speeds,
    }),
    temperature: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &[
                "/namespace:\\\\root\\wmi",
                "PATH",
                "MSAcpi_ThermalZoneTemperature",
                "get",
                "CurrentTemperature",
                "/format:list",
            ],
        },
        parse: windows::wmic_thermal_celsius,
    }),
    usage: Some(UsageRoute::Percentages(Route {
        source: Source::Command {
            program: WMIC,
            args: &[
                "path",
                "Win32_PerfFormattedData_PerfOS_Processor",
                "get",
                "Name,PercentProcessorTime",
                "/format:list",
            ],
        },
        parse: windows::wmic_processor_load,
    })),
    voltage: Some(Route {
        source: Source::Command {
            program: WMIC,
            args: &["cpu", "get", "CurrentVoltage", "/format:list"],
        },
        parse: windows::wmic_voltage,
    }),
};

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Runs routes for one fixed platform through one runner.
pub struct Dispatcher {
    platform: Platform,
    runner: Box<dyn Runner>,
}

impl Dispatcher {
    pub fn new(platform: Platform, runner: Box<dyn Runner>) -> Self {
        Self { platform, runner }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn routes(&self) -> &'static RouteTable {
        self.platform.routes()
    }

    /// Unwraps an optional route, failing with `NotSupported` when absent.
    pub fn require<'r, R>(
        &self,
        fact: &'static str,
        route: &'r Option<R>,
    ) -> Result<&'r R, UnavailableError> {
        route.as_ref().ok_or(UnavailableError::NotSupported {
            fact,
            platform: self.platform,
        })
    }

    /// One runner call followed by one parse.
    pub fn fetch<T>(&self, fact: &'static str, route: &Route<T>) -> Result<T, ProbeError> {
        let raw = self.runner.run(&route.source)?;
        let value = (route.parse)(&raw)?;
        tracing::debug!(
            fact,
            platform = %self.platform,
            source = %route.source,
            "route resolved"
        );
        Ok(value)
    }

    /// `require` then `fetch`.
    pub fn query<T>(&self, fact: &'static str, route: &Option<Route<T>>) -> Result<T, ProbeError> {
        let route = self.require(fact, route)?;
        self.fetch(fact, route)
    }
}
