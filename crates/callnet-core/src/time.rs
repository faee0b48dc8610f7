//! Timestamp parsing and hour-of-day buckets.
//!
//! Call exports come from many switches and rarely agree on a timestamp
//! format. [`parse_timestamp`] tries a fixed list of layouts and never fails:
//! anything it cannot read becomes `None`, which [`TimeSlot::from_timestamp`]
//! maps to [`TimeSlot::Unknown`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Date-time layouts accepted in the `Timestamp` column, tried in order.
///
/// Day-first is tried before month-first, so `03/04/2024` reads as 3 April.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Parse a raw `Timestamp` cell.
///
/// Returns `None` for empty or unrecognised values.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Four-way partition of the hour of day, plus `Unknown` for missing times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeSlot {
    /// `[00:00, 06:00)`
    #[serde(rename = "Late Night")]
    LateNight,
    /// `[06:00, 12:00)`
    Morning,
    /// `[12:00, 18:00)`
    Afternoon,
    /// `[18:00, 24:00)`
    Evening,
    Unknown,
}

impl TimeSlot {
    /// Bucket an hour of day (0-23).
    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::LateNight,
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    #[must_use]
    pub fn from_timestamp(timestamp: Option<&NaiveDateTime>) -> Self {
        timestamp.map_or(Self::Unknown, |ts| Self::from_hour(ts.hour()))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LateNight => "Late Night",
            Self::Morning => "Morning",
            Self::Afternoon => "Afternoon",
            Self::Evening => "Evening",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeSlot {
    type Err = String;

    /// Accepts the display labels, case-insensitively, with `_`, `-` or a
    /// space between words (`late night`, `Late_Night`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match wanted.as_str() {
            "latenight" => Ok(Self::LateNight),
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("unknown time slot `{s}`")),
        }
    }
}
