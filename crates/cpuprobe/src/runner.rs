//! Command runner: one OS command or one pseudo-file per call.

use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use crate::config::ProbeConfig;
use crate::error::UnavailableError;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Where a piece of raw text comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// A built-in command and its arguments.
    Command {
        program: &'static str,
        args: &'static [&'static str],
    },
    /// A file relative to the procfs root.
    ProcFile(&'static str),
    /// `file` inside the first `class/hwmon/*` device whose `name` is in `chips`.
    Hwmon {
        chips: &'static [&'static str],
        file: &'static str,
    },
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Command { program, args } => {
                write!(f, "`{program}")?;
                for arg in *args {
                    write!(f, " {arg}")?;
                }
                write!(f, "`")
            }
            Source::ProcFile(rel) => write!(f, "/proc/{rel}"),
            Source::Hwmon { chips, file } => write!(f, "hwmon[{}]/{file}", chips.join("|")),
        }
    }
}

/// Performs exactly one OS-level query and returns its raw text.
pub trait Runner: Send + Sync {
    fn run(&self, source: &Source) -> Result<String, UnavailableError>;
}

/// Runs real commands and reads real files.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    proc_root: PathBuf,
    sys_root: PathBuf,
    timeout: Option<Duration>,
}

impl SystemRunner {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            proc_root: config.proc_root.clone(),
            sys_root: config.sys_root.clone(),
            timeout: config.command_timeout,
        }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(&ProbeConfig::default())
    }
}

impl Runner for SystemRunner {
    fn run(&self, source: &Source) -> Result<String, UnavailableError> {
        match source {
            Source::Command { program, args } => run_command(program, args, self.timeout),
            Source::ProcFile(rel) => read_file(&self.proc_root.join(rel)),
            Source::Hwmon { chips, file } => {
                let dir = find_hwmon(&self.sys_root, chips)
                    .ok_or_else(|| UnavailableError::NotFound(format!("hwmon device {chips:?}")))?;
                read_file(&dir.join(file))
            }
        }
    }
}

fn read_file(path: &Path) -> Result<String, UnavailableError> {
    std::fs::read_to_string(path).map_err(|source| UnavailableError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Scans `class/hwmon` for the first device whose `name` matches one of `chips`.
///
/// Devices are visited in name order so `hwmon0` wins over `hwmon1`.
fn find_hwmon(sys_root: &Path, chips: &[&str]) -> Option<PathBuf> {
    let entries = std::fs::read_dir(sys_root.join("class/hwmon")).ok()?;
    let mut dirs: Vec<PathBuf> = entries.flatten().map(|e| e.path()).collect();
    dirs.sort();

    dirs.into_iter().find(|dir| {
        std::fs::read_to_string(dir.join("name"))
            .map(|name| chips.contains(&name.trim()))
            .unwrap_or(false)
    })
}

fn run_command(
    program: &str,
    args: &[&str],
    timeout: Option<Duration>,
) -> Result<String, UnavailableError> {
    tracing::debug!(program, ?args, "running command");

    let mut command = Command::new(program);
    // Parsers match English labels (`CPU family:`), so no translated output.
    command
        .args(args)
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NO_WINDOW: u32 = 0x0800_0000;
        command.creation_flags(CREATE_NO_WINDOW);
    }

    let mut child = command.spawn().map_err(|source| UnavailableError::Spawn {
        program: program.to_string(),
        source,
    })?;

    // Drain stdout on a separate thread so a chatty child never blocks on a full pipe.
    let mut stdout = child.stdout.take();
    let reader = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(out) = stdout.as_mut() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });

    let started = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                reap(&mut child);
                let _ = reader.join();
                return Err(UnavailableError::Spawn {
                    program: program.to_string(),
                    source,
                });
            }
        }
        if let Some(limit) = timeout
            && started.elapsed() >= limit
        {
            reap(&mut child);
            tracing::warn!(program, ?limit, "command timed out");
            return Err(UnavailableError::Timeout {
                program: program.to_string(),
                timeout: limit,
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    };

    let bytes = reader.join().unwrap_or_default();

    if !status.success() {
        return Err(UnavailableError::ExitStatus {
            program: program.to_string(),
            status: status.to_string(),
        });
    }

    Ok(decode_output(&bytes))
}

/// Kills `child` and collects its exit status so no zombie is left behind.
fn reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

/// Decodes command output, handling the UTF-16LE that `wmic` emits when piped.
fn decode_output(bytes: &[u8]) -> String {
    let utf16 = bytes.starts_with(&[0xFF, 0xFE])
        || (bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0);
    if utf16 {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
            .trim_start_matches('\u{feff}')
            .to_string()
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}
