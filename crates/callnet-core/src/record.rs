//! Call-detail-record model.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::time::TimeSlot;

/// Direction of a call relative to the `Caller_ID` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CallType {
    /// `Caller_ID` initiated the call.
    Outgoing,
    /// `Receiver_ID` initiated the call; graph edges are flipped.
    Incoming,
}

impl CallType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Outgoing => "Outgoing",
            Self::Incoming => "Incoming",
        }
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "outgoing" => Ok(Self::Outgoing),
            "incoming" => Ok(Self::Incoming),
            other => Err(other.to_string()),
        }
    }
}

/// One validated row of the input table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    pub caller_id: String,
    pub receiver_id: String,
    /// Raw `Timestamp` cell as it appeared in the file.
    pub timestamp_raw: String,
    /// Parsed timestamp; `None` when the cell was empty or unrecognised.
    pub timestamp: Option<NaiveDateTime>,
    pub location: String,
    pub call_type: CallType,
    /// Call duration in the unit of the source export (usually seconds).
    pub duration: f64,
    pub call_text: Option<String>,
    /// 1-based line in the source CSV, header included.
    pub line: u64,
}

impl CallRecord {
    /// The participant that initiated the call.
    #[must_use]
    pub fn initiator(&self) -> &str {
        match self.call_type {
            CallType::Outgoing => &self.caller_id,
            CallType::Incoming => &self.receiver_id,
        }
    }

    /// The participant that was called.
    #[must_use]
    pub fn recipient(&self) -> &str {
        match self.call_type {
            CallType::Outgoing => &self.receiver_id,
            CallType::Incoming => &self.caller_id,
        }
    }

    #[must_use]
    pub fn time_slot(&self) -> TimeSlot {
        TimeSlot::from_timestamp(self.timestamp.as_ref())
    }
}

/// The full, validated input table.
#[derive(Debug, Clone, Default)]
pub struct CallTable {
    pub records: Vec<CallRecord>,
    /// Whether the source file carried a `Call_Text` column.
    pub has_call_text: bool,
    /// BLAKE3 fingerprint of the raw input bytes (`blake3:<hex>`).
    pub fingerprint: String,
}

impl CallTable {
    /// Build a table from records constructed in code.
    ///
    /// The fingerprint is derived from the records' debug form, so equal
    /// record lists share a fingerprint.
    #[must_use]
    pub fn from_records(records: Vec<CallRecord>) -> Self {
        let has_call_text = records.iter().any(|r| r.call_text.is_some());
        let mut hasher = blake3::Hasher::new();
        for record in &records {
            hasher.update(format!("{record:?}").as_bytes());
            hasher.update(b"\n");
        }
        Self {
            records,
            has_call_text,
            fingerprint: format!("blake3:{}", hasher.finalize().to_hex()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CallRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a CallTable {
    type Item = &'a CallRecord;
    type IntoIter = std::slice::Iter<'a, CallRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(call_type: CallType) -> CallRecord {
        CallRecord {
            caller_id: "A".to_string(),
            receiver_id: "B".to_string(),
            timestamp_raw: String::new(),
            timestamp: None,
            location: "Delhi".to_string(),
            call_type,
            duration: 30.0,
            call_text: None,
            line: 2,
        }
    }

    #[test]
    fn call_type_parses_case_insensitively() {
        assert_eq!(" outgoing ".parse::<CallType>(), Ok(CallType::Outgoing));
        assert_eq!("INCOMING".parse::<CallType>(), Ok(CallType::Incoming));
        assert_eq!("Missed".parse::<CallType>(), Err("missed".to_string()));
    }

    #[test]
    fn outgoing_keeps_direction() {
        let r = record(CallType::Outgoing);
        assert_eq!((r.initiator(), r.recipient()), ("A", "B"));
    }

    #[test]
    fn incoming_flips_direction() {
        let r = record(CallType::Incoming);
        assert_eq!((r.initiator(), r.recipient()), ("B", "A"));
    }

    #[test]
    fn missing_timestamp_is_unknown_slot() {
        assert_eq!(record(CallType::Outgoing).time_slot(), TimeSlot::Unknown);
    }

    #[test]
    fn table_fingerprint_is_stable() {
        let a = CallTable::from_records(vec![record(CallType::Outgoing)]);
        let b = CallTable::from_records(vec![record(CallType::Outgoing)]);
        let c = CallTable::from_records(vec![record(CallType::Incoming)]);
        assert_eq!(a.fingerprint, b.fingerprint);
        assert_ne!(a.fingerprint, c.fingerprint);
        assert!(a.fingerprint.starts_with("blake3:"));
    }
}
