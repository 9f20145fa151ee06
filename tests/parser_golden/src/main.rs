fn main() {
    println!("Run `cargo test -p parser-golden` to execute the golden-file parser tests.");
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    use cpuprobe::parse::{linux, windows};
    use cpuprobe::{Platform, Processor, Runner, Sensors, Source, UnavailableError};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a raw fixture as text.
    fn load_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Deserializes a JSON fixture, re-serializes it, and compares the values.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture: serde_json::Value = serde_json::from_str(&load_fixture(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"));
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed).unwrap();
        assert_eq!(fixture, reserialized, "roundtrip mismatch for {name}");
    }

    /// Serves fixture files in place of OS commands and pseudo-files.
    struct FixtureFiles(HashMap<Source, &'static str>);

    impl Runner for FixtureFiles {
        fn run(&self, source: &Source) -> Result<String, UnavailableError> {
            let name = self
                .0
                .get(source)
                .ok_or_else(|| UnavailableError::NotFound(source.to_string()))?;
            Ok(load_fixture(name))
        }
    }

    fn wmic(args: &'static [&'static str]) -> Source {
        Source::Command {
            program: "wmic",
            args,
        }
    }

    // -----------------------------------------------------------------------
    // Linux
    // -----------------------------------------------------------------------

    #[test]
    fn cpuinfo_ryzen() {
        let text = load_fixture("linux/cpuinfo_ryzen.txt");
        assert_eq!(
            linux::cpuinfo_model_name(&text).unwrap(),
            "AMD Ryzen 3 3200G with Radeon Vega Graphics"
        );
        assert_eq!(linux::cpuinfo_vendor(&text).unwrap(), "AuthenticAMD");
        let flags = linux::cpuinfo_flags(&text).unwrap();
        assert_eq!(flags.len(), 113);
        assert!(flags.iter().any(|f| f == "svm"));
        assert_eq!(
            linux::cpuinfo_clock_speeds(&text).unwrap(),
            vec![(0, 1397.253), (1, 3600.0), (2, 1600.0), (3, 1402.747)]
        );
        assert!(linux::cpuinfo_boost(&text).unwrap());
    }

    #[test]
    fn cpuinfo_arm() {
        let text = load_fixture("linux/cpuinfo_raspberry_pi.txt");
        assert_eq!(linux::cpuinfo_vendor(&text).unwrap(), "ARM");
        assert_eq!(
            linux::cpuinfo_flags(&text).unwrap(),
            vec!["fp", "asimd", "evtstrm", "crc32", "cpuid"]
        );
        // No "model name" and no "cpu MHz" on this kernel.
        assert!(linux::cpuinfo_model_name(&text).is_err());
        assert!(linux::cpuinfo_clock_speeds(&text).is_err());
        assert!(linux::cpuinfo_boost(&text).is_err());
    }

    #[test]
    fn lscpu_grouped_layout() {
        let text = load_fixture("linux/lscpu_util_linux_2_39.txt");
        assert_eq!(linux::lscpu_family(&text).unwrap(), "23");
        assert_eq!(linux::lscpu_stepping(&text).unwrap(), "1");
        assert_eq!(linux::lscpu_physical_cores(&text).unwrap(), 4);
        assert_eq!(linux::lscpu_logical_cores(&text).unwrap(), 4);
        assert!(linux::lscpu_virtualization(&text).unwrap());
        assert_eq!(linux::lscpu_l1d_cache_kib(&text).unwrap(), 128);
        assert_eq!(linux::lscpu_l2_cache_kib(&text).unwrap(), 2048);
        assert_eq!(linux::lscpu_l3_cache_kib(&text).unwrap(), 4096);
        assert_eq!(linux::lscpu_max_clock_mhz(&text).unwrap(), 3600);
    }

    #[test]
    fn lscpu_flat_layout() {
        let text = load_fixture("linux/lscpu_util_linux_2_34.txt");
        assert_eq!(linux::lscpu_family(&text).unwrap(), "6");
        assert_eq!(linux::lscpu_stepping(&text).unwrap(), "10");
        assert_eq!(linux::lscpu_physical_cores(&text).unwrap(), 4);
        assert_eq!(linux::lscpu_logical_cores(&text).unwrap(), 8);
        assert!(linux::lscpu_virtualization(&text).unwrap());
        assert_eq!(linux::lscpu_l1d_cache_kib(&text).unwrap(), 128);
        assert_eq!(linux::lscpu_l2_cache_kib(&text).unwrap(), 1024);
        assert_eq!(linux::lscpu_l3_cache_kib(&text).unwrap(), 6144);
        assert_eq!(linux::lscpu_max_clock_mhz(&text).unwrap(), 3400);
    }

    #[test]
    fn lscpu_guest_without_virtualization() {
        let text = load_fixture("linux/lscpu_util_linux_2_31.txt");
        assert_eq!(linux::lscpu_physical_cores(&text).unwrap(), 2);
        assert_eq!(linux::lscpu_logical_cores(&text).unwrap(), 2);
        // A KVM guest is not a host capable of virtualization.
        assert!(!linux::lscpu_virtualization(&text).unwrap());
        assert_eq!(linux::lscpu_l1d_cache_kib(&text).unwrap(), 32);
        assert_eq!(linux::lscpu_l3_cache_kib(&text).unwrap(), 33792);
        // No cpufreq in the guest: nominal clock.
        assert_eq!(linux::lscpu_max_clock_mhz(&text).unwrap(), 2500);
    }

    #[test]
    fn proc_stat_counters() {
        let sample = linux::proc_stat(&load_fixture("linux/proc_stat.txt")).unwrap();
        assert_eq!(sample.cores.len(), 4);
        assert_eq!(sample.cores[3].0, 3);
        assert_eq!(sample.total.idle, 3_699_176 + 23_060);
        assert_eq!(
            sample.total.total,
            4705 + 356 + 584 + 3_699_176 + 23_060 + 277
        );
    }

    #[test]
    fn hwmon_and_uname_values() {
        assert_eq!(
            linux::hwmon_celsius(&load_fixture("linux/hwmon_k10temp_temp1_input.txt")).unwrap(),
            45.25
        );
        assert_eq!(
            linux::uname_architecture(&load_fixture("linux/uname_m.txt")).unwrap(),
            "x86_64"
        );
    }

    #[test]
    fn linux_processor_end_to_end() {
        let runner = FixtureFiles(HashMap::from([
            (Source::ProcFile("cpuinfo"), "linux/cpuinfo_ryzen.txt"),
            (
                Source::Command {
                    program: "lscpu",
                    args: &[],
                },
                "linux/lscpu_util_linux_2_39.txt",
            ),
            (
                Source::Command {
                    program: "uname",
                    args: &["-m"],
                },
                "linux/uname_m.txt",
            ),
        ]));
        let cpu = Processor::with_runner(Platform::Linux, runner);
        assert_eq!(cpu.name(), Some("AMD Ryzen 3 3200G with Radeon Vega Graphics"));
        assert_eq!(cpu.architecture(), Some("x86_64"));
        assert_eq!(cpu.logical_cores(), Some(4));
        assert_eq!(cpu.max_clock_mhz(), Some(3600));
        assert_eq!(cpu.supports_boost(), Some(true));
        assert_eq!(cpu.socket(), None);
        assert_eq!(cpu.supports_virtualization(), Some(true));
        assert!(cpu.has_flag("avx2"));
    }

    // -----------------------------------------------------------------------
    // Windows
    // -----------------------------------------------------------------------

    #[test]
    fn wmic_cpu_full_listing() {
        let text = load_fixture("windows/wmic_cpu_full.txt");
        assert_eq!(
            windows::wmic_name(&text).unwrap(),
            "Intel(R) Core(TM) i7-10700 CPU @ 2.90GHz"
        );
        assert_eq!(windows::wmic_manufacturer(&text).unwrap(), "GenuineIntel");
        assert_eq!(windows::wmic_architecture(&text).unwrap(), "x86_64");
        assert_eq!(windows::wmic_family(&text).unwrap(), "198");
        assert!(windows::wmic_stepping(&text).is_err());
        assert_eq!(windows::wmic_physical_cores(&text).unwrap(), 8);
        assert_eq!(windows::wmic_logical_cores(&text).unwrap(), 16);
        assert!(windows::wmic_virtualization(&text).unwrap());
        assert_eq!(windows::wmic_max_clock_mhz(&text).unwrap(), 2904);
        assert_eq!(windows::wmic_clock_speeds(&text).unwrap(), vec![(0, 2904.0)]);
        assert_eq!(windows::wmic_socket(&text).unwrap(), "LGA1200");
        assert_eq!(windows::wmic_l2_cache_kib(&text).unwrap(), 2048);
        assert_eq!(windows::wmic_l3_cache_kib(&text).unwrap(), 16384);
        assert_eq!(windows::wmic_voltage(&text).unwrap(), 0.8);
    }

    #[test]
    fn wmic_dual_socket() {
        let text = load_fixture("windows/wmic_cpu_dual_socket.txt");
        assert_eq!(windows::wmic_physical_cores(&text).unwrap(), 16);
        assert_eq!(windows::wmic_logical_cores(&text).unwrap(), 32);
        assert_eq!(
            windows::wmic_clock_speeds(&text).unwrap(),
            vec![(0, 2100.0), (1, 2094.0)]
        );
        assert_eq!(windows::wmic_socket(&text).unwrap(), "CPU0");
        assert!(!windows::wmic_virtualization(&text).unwrap());
        // 140 = 0x8c: encoded form, 12 tenths.
        assert_eq!(windows::wmic_voltage(&text).unwrap(), 1.2);
    }

    #[test]
    fn powershell_format_list() {
        let text = load_fixture("windows/powershell_format_list.txt");
        assert_eq!(
            windows::wmic_name(&text).unwrap(),
            "AMD Ryzen 7 5800X 8-Core Processor"
        );
        assert_eq!(windows::wmic_max_clock_mhz(&text).unwrap(), 3801);
        assert_eq!(windows::wmic_physical_cores(&text).unwrap(), 8);
        assert_eq!(windows::wmic_logical_cores(&text).unwrap(), 16);
        assert_eq!(windows::wmic_l2_cache_kib(&text).unwrap(), 4096);
        assert_eq!(windows::wmic_l3_cache_kib(&text).unwrap(), 32768);
        assert!(!windows::wmic_virtualization(&text).unwrap());
    }

    #[test]
    fn max_clock_speed_line() {
        let text = load_fixture("windows/max_clock_speed.txt");
        assert_eq!(windows::wmic_max_clock_mhz(&text).unwrap(), 2800);
    }

    #[test]
    fn cache_memory_thermal_and_load() {
        let cache = load_fixture("windows/wmic_cache_memory.txt");
        assert_eq!(windows::wmic_l1_cache_kib(&cache).unwrap(), 512);

        let thermal = load_fixture("windows/wmic_thermal_zone.txt");
        assert_eq!(windows::wmic_thermal_celsius(&thermal).unwrap(), 40.05);

        let load = windows::wmic_processor_load(&load_fixture("windows/wmic_perf_processor.txt"))
            .unwrap();
        assert_eq!(load.total, 13.0);
        assert_eq!(load.cores, vec![(0, 18.0), (1, 6.0), (2, 31.0), (3, 0.0)]);
    }

    #[test]
    fn localized_output_is_unknown() {
        let text = load_fixture("windows/wmic_localized.txt");
        assert!(windows::wmic_name(&text).is_err());
        assert!(windows::wmic_max_clock_mhz(&text).is_err());
    }

    #[test]
    fn windows_processor_and_sensors_end_to_end() {
        let files = || {
            FixtureFiles(HashMap::from([
                (
                    wmic(&["cpu", "get", "MaxClockSpeed", "/format:list"]),
                    "windows/max_clock_speed.txt",
                ),
                (
                    wmic(&["cpu", "get", "Name", "/format:list"]),
                    "windows/wmic_cpu_full.txt",
                ),
                (
                    wmic(&["cpu", "get", "CurrentClockSpeed", "/format:list"]),
                    "windows/wmic_cpu_dual_socket.txt",
                ),
            ]))
        };

        let cpu = Processor::with_runner(Platform::Windows, files());
        assert_eq!(cpu.max_clock_mhz(), Some(2800));
        assert_eq!(cpu.name(), Some("Intel(R) Core(TM) i7-10700 CPU @ 2.90GHz"));
        assert_eq!(cpu.vendor(), None);

        let sensors = Sensors::with_runner(Platform::Windows, files());
        assert_eq!(sensors.clock_speed().unwrap().value, 2097.0);
        let sockets: Vec<_> = sensors
            .clock_speed_per_core()
            .unwrap()
            .into_iter()
            .map(|r| r.core)
            .collect();
        assert_eq!(sockets, vec![Some(0), Some(1)]);
    }

    // -----------------------------------------------------------------------
    // Data model
    // -----------------------------------------------------------------------

    #[test]
    fn cpu_profile_roundtrip() {
        roundtrip_test::<cpuprobe_protocol::CpuProfile>("json/cpu_profile.json");
    }

    #[test]
    fn sensor_snapshot_roundtrip() {
        roundtrip_test::<cpuprobe_protocol::SensorSnapshot>("json/sensor_snapshot.json");
    }
}
