use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Sampling granularity accepted by the fetch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl Interval {
    pub const ALL: [Self; 2] = [Self::OneHour, Self::OneDay];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::OneDay => "1d",
        }
    }

    pub const fn is_intraday(self) -> bool {
        matches!(self, Self::OneHour)
    }

    /// File name the fetch step writes for this interval.
    pub const fn artifact_file_name(self) -> &'static str {
        match self {
            Self::OneHour => "stock_data_1h.csv",
            Self::OneDay => "stock_data_1d.csv",
        }
    }

    /// Resolves a raw query value, falling back to daily for missing or
    /// unrecognized input. The flag reports whether the fallback was taken.
    pub fn resolve_or_daily(value: Option<&str>) -> (Self, bool) {
        match value.map(Self::from_str) {
            Some(Ok(interval)) => (interval, false),
            _ => (Self::OneDay, true),
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    /// Only the exact lowercase forms are accepted.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "1h" => Ok(Self::OneHour),
            "1d" => Ok(Self::OneDay),
            other => Err(ValidationError::InvalidInterval {
                value: other.to_owned(),
            }),
        }
    }
}
