//! Time units used by schedule inputs and activation output tables.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{ActError, ErrorInfo};

/// Time unit accepted in run configurations.
///
/// A year is 365 days and a century is 100 such years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum TimeUnit {
    /// Seconds.
    Second,
    /// Minutes.
    Minute,
    /// Hours.
    Hour,
    /// Days.
    Day,
    /// Weeks.
    Week,
    /// 365-day years.
    #[default]
    Year,
    /// Centuries.
    Century,
}

impl TimeUnit {
    /// Length of one unit in seconds.
    pub const fn seconds(self) -> f64 {
        match self {
            TimeUnit::Second => 1.0,
            TimeUnit::Minute => 60.0,
            TimeUnit::Hour => 3_600.0,
            TimeUnit::Day => 86_400.0,
            TimeUnit::Week => 604_800.0,
            TimeUnit::Year => 31_536_000.0,
            TimeUnit::Century => 3_153_600_000.0,
        }
    }

    /// Short symbol used in tables and configuration files.
    pub const fn symbol(self) -> &'static str {
        match self {
            TimeUnit::Second => "s",
            TimeUnit::Minute => "m",
            TimeUnit::Hour => "h",
            TimeUnit::Day => "d",
            TimeUnit::Week => "w",
            TimeUnit::Year => "y",
            TimeUnit::Century => "c",
        }
    }

    /// Converts `value` expressed in `self` into seconds.
    pub fn to_seconds(self, value: f64) -> f64 {
        value * self.seconds()
    }

    /// Converts `value` expressed in `self` into `target`.
    pub fn convert(self, value: f64, target: TimeUnit) -> f64 {
        if self == target {
            return value;
        }
        value * self.seconds() / target.seconds()
    }
}

impl FromStr for TimeUnit {
    type Err = ActError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let unit = match raw.trim() {
            "s" | "sec" | "second" | "seconds" => TimeUnit::Second,
            "m" | "min" | "minute" | "minutes" => TimeUnit::Minute,
            "h" | "hr" | "hour" | "hours" => TimeUnit::Hour,
            "d" | "day" | "days" => TimeUnit::Day,
            "w" | "week" | "weeks" => TimeUnit::Week,
            "y" | "yr" | "year" | "years" => TimeUnit::Year,
            "c" | "century" | "centuries" => TimeUnit::Century,
            other => {
                return Err(ActError::Config(
                    ErrorInfo::new("units.unknown", "unrecognised time unit")
                        .with_context("time_unit", other)
                        .with_hint("expected one of s, m, h, d, w, y, c"),
                ))
            }
        };
        Ok(unit)
    }
}

impl TryFrom<String> for TimeUnit {
    type Error = ActError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

impl From<TimeUnit> for String {
    fn from(unit: TimeUnit) -> Self {
        unit.symbol().to_string()
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn years_convert_to_seconds() {
        assert_eq!(TimeUnit::Year.to_seconds(4.0), 126_144_000.0);
        assert_eq!(TimeUnit::Day.convert(7.0, TimeUnit::Week), 1.0);
    }

    #[test]
    fn parses_long_names() {
        assert_eq!("years".parse::<TimeUnit>().unwrap(), TimeUnit::Year);
        assert!("fortnight".parse::<TimeUnit>().is_err());
    }
}
