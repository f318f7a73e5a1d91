//! Human-readable durations used in settings documents
//!
//! Accepts `"<amount> <unit>"` (`"5 seconds"`, `"1 minute"`) as well as the
//! short suffix form (`"2s"`, `"500ms"`).

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeSpan(Duration);

impl TimeSpan {
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self(Duration::from_secs(secs))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl From<Duration> for TimeSpan {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl From<TimeSpan> for Duration {
    fn from(span: TimeSpan) -> Self {
        span.0
    }
}

/// Milliseconds per unit, keyed by every accepted spelling
fn unit_millis(unit: &str) -> Option<u64> {
    let millis = match unit.to_ascii_lowercase().as_str() {
        "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1,
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000,
        "h" | "hour" | "hours" => 3_600_000,
        "d" | "day" | "days" => 86_400_000,
        _ => return None,
    };
    Some(millis)
}

impl FromStr for TimeSpan {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (amount, unit) = trimmed.split_at(split);

        let amount: u64 = amount
            .parse()
            .map_err(|_| ConfigError::InvalidTimeSpan(value.to_string()))?;
        let millis = unit_millis(unit.trim())
            .and_then(|per_unit| amount.checked_mul(per_unit))
            .ok_or_else(|| ConfigError::InvalidTimeSpan(value.to_string()))?;

        Ok(Self::from_millis(millis))
    }
}

impl TryFrom<String> for TimeSpan {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeSpan> for String {
    fn from(span: TimeSpan) -> Self {
        span.to_string()
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let millis = self.0.as_millis();
        if millis % 1_000 == 0 {
            write!(f, "{} seconds", millis / 1_000)
        } else {
            write!(f, "{} milliseconds", millis)
        }
    }
}
