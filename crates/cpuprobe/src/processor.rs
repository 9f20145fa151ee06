//! Static CPU attributes, resolved once per instance.

use cpuprobe_protocol::{CacheSizes, CpuProfile};

use crate::cache::ProfileCache;
use crate::config::ProbeConfig;
use crate::dispatch::{Dispatcher, Route};
use crate::error::{ProbeError, UnavailableError};
use crate::platform::Platform;
use crate::runner::{Runner, SystemRunner};

/// Static CPU attributes of the running machine.
///
/// Every attribute is queried once at construction. One that cannot be
/// queried or parsed is logged and left unknown (`None`), so construction
/// only fails on an unsupported platform.
#[derive(Debug, Clone)]
pub struct Processor {
    platform: Platform,
    profile: CpuProfile,
}

impl Processor {
    /// Probes the running machine with the configuration on disk.
    pub fn new() -> Result<Self, ProbeError> {
        Self::with_config(ProbeConfig::load()?)
    }

    /// Probes the running machine with an explicit configuration.
    pub fn with_config(config: ProbeConfig) -> Result<Self, ProbeError> {
        let platform = Platform::detect()?;
        let runner = SystemRunner::new(&config);
        let processor = if config.cache_enabled {
            Self::with_cache(platform, runner, &ProfileCache::from_config(&config))
        } else {
            Self::with_runner(platform, runner)
        };
        Ok(processor)
    }

    /// Probes through `runner` as if running on `platform`.
    pub fn with_runner(platform: Platform, runner: impl Runner + 'static) -> Self {
        let dispatcher = Dispatcher::new(platform, Box::new(runner));
        let profile = probe(&dispatcher);
        tracing::info!(
            %platform,
            resolved = profile.resolved_count(),
            "processor probed"
        );
        Self { platform, profile }
    }

    /// Probes as if running on the OS named `os` (`std::env::consts::OS`
    /// spelling). Unsupported names fail before `runner` is touched.
    pub fn for_os(os: &str, runner: impl Runner + 'static) -> Result<Self, ProbeError> {
        let platform = Platform::from_os_name(os)?;
        Ok(Self::with_runner(platform, runner))
    }

    /// Reuses a fresh cached profile, or probes and caches the result.
    ///
    /// Cache I/O problems are logged and never fail construction.
    pub fn with_cache(
        platform: Platform,
        runner: impl Runner + 'static,
        cache: &ProfileCache,
    ) -> Self {
        match cache.load() {
            Ok(Some(profile)) if profile.platform == platform.as_str() => {
                tracing::info!(%platform, "processor profile loaded from cache");
                return Self { platform, profile };
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "failed to read profile cache"),
        }

        let processor = Self::with_runner(platform, runner);
        if let Err(e) = cache.store(&processor.profile) {
            tracing::warn!(error = %e, "failed to write profile cache");
        }
        processor
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn name(&self) -> Option<&str> {
        self.profile.name.as_deref()
    }

    pub fn vendor(&self) -> Option<&str> {
        self.profile.vendor.as_deref()
    }

    pub fn architecture(&self) -> Option<&str> {
        self.profile.architecture.as_deref()
    }

    pub fn family(&self) -> Option<&str> {
        self.profile.family.as_deref()
    }

    pub fn stepping(&self) -> Option<&str> {
        self.profile.stepping.as_deref()
    }

    pub fn socket(&self) -> Option<&str> {
        self.profile.socket.as_deref()
    }

    pub fn physical_cores(&self) -> Option<u32> {
        self.profile.physical_cores
    }

    pub fn logical_cores(&self) -> Option<u32> {
        self.profile.logical_cores
    }

    /// Whether the CPU supports hardware virtualization (VT-x / AMD-V).
    pub fn supports_virtualization(&self) -> Option<bool> {
        self.profile.virtualization
    }

    pub fn max_clock_mhz(&self) -> Option<u32> {
        self.profile.max_clock_mhz
    }

    /// Whether the CPU has turbo / boost clocks.
    pub fn supports_boost(&self) -> Option<bool> {
        self.profile.boost
    }

    /// Feature flags; empty when unknown.
    pub fn flags(&self) -> &[String] {
        &self.profile.flags
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.profile.has_flag(flag)
    }

    pub fn cache_sizes(&self) -> CacheSizes {
        self.profile.cache
    }

    pub fn profile(&self) -> &CpuProfile {
        &self.profile
    }

    pub fn into_profile(self) -> CpuProfile {
        self.profile
    }
}

fn probe(dispatcher: &Dispatcher) -> CpuProfile {
    let routes = dispatcher.routes();
    let mut profile = CpuProfile::unknown(dispatcher.platform().as_str());

    profile.name = resolve(dispatcher, "name", &routes.name);
    profile.vendor = resolve(dispatcher, "vendor", &routes.vendor);
    profile.architecture = resolve(dispatcher, "architecture", &routes.architecture);
    profile.family = resolve(dispatcher, "family", &routes.family);
    profile.stepping = resolve(dispatcher, "stepping", &routes.stepping);
    profile.socket = resolve(dispatcher, "socket", &routes.socket);
    profile.physical_cores = resolve(dispatcher, "physical cores", &routes.physical_cores);
    profile.logical_cores = resolve(dispatcher, "logical cores", &routes.logical_cores);
    profile.virtualization = resolve(dispatcher, "virtualization", &routes.virtualization);
    profile.max_clock_mhz = resolve(dispatcher, "max clock speed", &routes.max_clock);
    profile.boost = resolve(dispatcher, "boost", &routes.boost);
    profile.flags = resolve(dispatcher, "flags", &routes.flags).unwrap_or_default();
    profile.cache = CacheSizes {
        l1_kib: resolve(dispatcher, "L1 cache", &routes.l1_cache),
        l2_kib: resolve(dispatcher, "L2 cache", &routes.l2_cache),
        l3_kib: resolve(dispatcher, "L3 cache", &routes.l3_cache),
    };

    profile
}

/// Queries one attribute, degrading any failure to `None`.
fn resolve<T>(dispatcher: &Dispatcher, fact: &'static str, route: &Option<Route<T>>) -> Option<T> {
    match dispatcher.query(fact, route) {
        Ok(value) => Some(value),
        // Absent route: a known gap of the platform, not a failure.
        Err(ProbeError::Unavailable(UnavailableError::NotSupported { .. })) => {
            tracing::debug!(fact, platform = %dispatcher.platform(), "attribute not provided");
            None
        }
        Err(e) => {
            tracing::warn!(fact, platform = %dispatcher.platform(), error = %e, "attribute unknown");
            None
        }
    }
}
