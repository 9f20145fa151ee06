//! Error types for CPU probing.

use std::path::PathBuf;
use std::time::Duration;

use crate::platform::Platform;

/// Errors surfaced by the `Processor` and `Sensors` facades.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error(transparent)]
    Unavailable(#[from] UnavailableError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// An OS command or pseudo-file could not produce any output.
#[derive(Debug, thiserror::Error)]
pub enum UnavailableError {
    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program}` exited with {status}")]
    ExitStatus { program: String, status: String },

    #[error("`{program}` timed out after {timeout:?}")]
    Timeout { program: String, timeout: Duration },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no {0} found")]
    NotFound(String),

    #[error("{fact} is not provided on {platform}")]
    NotSupported {
        fact: &'static str,
        platform: Platform,
    },
}

/// Raw output did not have the expected format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot parse {field}: {reason}")]
pub struct ParseError {
    pub field: &'static str,
    pub reason: String,
}

impl ParseError {
    /// The marker for `field` is absent from the output.
    pub fn missing(field: &'static str) -> Self {
        Self {
            field,
            reason: "marker not found".into(),
        }
    }

    /// The marker is present but its value cannot be converted.
    pub fn invalid(field: &'static str, value: &str) -> Self {
        Self {
            field,
            reason: format!("unexpected value '{value}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            ParseError::missing("model name").to_string(),
            "cannot parse model name: marker not found"
        );
        assert_eq!(
            ParseError::invalid("MaxClockSpeed", "fast").to_string(),
            "cannot parse MaxClockSpeed: unexpected value 'fast'"
        );
        let err = ProbeError::from(UnavailableError::NotSupported {
            fact: "voltage",
            platform: Platform::Linux,
        });
        assert_eq!(err.to_string(), "voltage is not provided on linux");
        assert_eq!(
            ProbeError::UnsupportedPlatform("macos".into()).to_string(),
            "unsupported platform: macos"
        );
    }
}
