use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Severity attached to every event record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HecLevel {
    #[default]
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Critical,
}

/// Returned when a level name is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown log level: {0:?}")]
pub struct ParseLevelError(pub String);

impl HecLevel {
    pub const ALL: [HecLevel; 6] = [
        HecLevel::Trace,
        HecLevel::Debug,
        HecLevel::Info,
        HecLevel::Warn,
        HecLevel::Error,
        HecLevel::Critical,
    ];

    /// Upper-case label used in rendered output.
    pub const fn as_str(self) -> &'static str {
        match self {
            HecLevel::Trace => "TRACE",
            HecLevel::Debug => "DEBUG",
            HecLevel::Info => "INFO",
            HecLevel::Warn => "WARN",
            HecLevel::Error => "ERROR",
            HecLevel::Critical => "CRITICAL",
        }
    }

    /// Width of the longest label; the raw layout pads continuation lines to it.
    pub fn max_label_width() -> usize {
        Self::ALL
            .iter()
            .map(|level| level.as_str().len())
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for HecLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HecLevel {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TRACE" => Ok(Self::Trace),
            "DEBUG" => Ok(Self::Debug),
            "INFO" | "INFORMATION" => Ok(Self::Info),
            "WARN" | "WARNING" => Ok(Self::Warn),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" | "FATAL" => Ok(Self::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

impl From<HecLevel> for u8 {
    fn from(level: HecLevel) -> Self {
        level as u8
    }
}

impl From<u8> for HecLevel {
    /// Values above the highest discriminant clamp to `Critical`.
    fn from(value: u8) -> Self {
        match value {
            0 => HecLevel::Trace,
            1 => HecLevel::Debug,
            2 => HecLevel::Info,
            3 => HecLevel::Warn,
            4 => HecLevel::Error,
            _ => HecLevel::Critical,
        }
    }
}

impl From<log::Level> for HecLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => HecLevel::Trace,
            log::Level::Debug => HecLevel::Debug,
            log::Level::Info => HecLevel::Info,
            log::Level::Warn => HecLevel::Warn,
            log::Level::Error => HecLevel::Error,
        }
    }
}

#[cfg(feature = "tracing-compat")]
impl From<tracing::Level> for HecLevel {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => HecLevel::Trace,
            tracing::Level::DEBUG => HecLevel::Debug,
            tracing::Level::INFO => HecLevel::Info,
            tracing::Level::WARN => HecLevel::Warn,
            tracing::Level::ERROR => HecLevel::Error,
        }
    }
}

impl<'de> Deserialize<'de> for HecLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl Serialize for HecLevel {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}
