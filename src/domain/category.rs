use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log entry, ordered from most to least severe.
///
/// The discriminants are the integers used on the wire (`cat`), so
/// `Emergency < Alert < ... < Trace` holds both for the enum and the number.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum LogCategory {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    #[default]
    Info = 6,
    Debug = 7,
    Trace = 8,
}

impl LogCategory {
    pub const ALL: [LogCategory; 9] = [
        LogCategory::Emergency,
        LogCategory::Alert,
        LogCategory::Critical,
        LogCategory::Error,
        LogCategory::Warning,
        LogCategory::Notice,
        LogCategory::Info,
        LogCategory::Debug,
        LogCategory::Trace,
    ];

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_i32() == value)
    }

    /// `true` when `self` is as severe as `threshold` or more.
    pub fn is_within(self, threshold: LogCategory) -> bool {
        self <= threshold
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogCategory::Emergency => "EMERGENCY",
            LogCategory::Alert => "ALERT",
            LogCategory::Critical => "CRITICAL",
            LogCategory::Error => "ERROR",
            LogCategory::Warning => "WARNING",
            LogCategory::Notice => "NOTICE",
            LogCategory::Info => "INFO",
            LogCategory::Debug => "DEBUG",
            LogCategory::Trace => "TRACE",
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort priority of a log entry. `None` is the lowest and the default.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[repr(i32)]
pub enum LogPriority {
    #[default]
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    VeryHigh = 4,
}

impl LogPriority {
    pub const ALL: [LogPriority; 5] = [
        LogPriority::None,
        LogPriority::Low,
        LogPriority::Medium,
        LogPriority::High,
        LogPriority::VeryHigh,
    ];

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn from_i32(value: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_i32() == value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogPriority::None => "NONE",
            LogPriority::Low => "LOW",
            LogPriority::Medium => "MEDIUM",
            LogPriority::High => "HIGH",
            LogPriority::VeryHigh => "VERY_HIGH",
        }
    }
}

impl fmt::Display for LogPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
