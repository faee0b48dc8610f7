//! CSV ingestion and row validation.
//!
//! # Overview
//!
//! The input is a header-based, comma-separated export with one call per
//! row. Column lookup is by header name, so column order is free:
//!
//! ```text
//! Caller_ID,Receiver_ID,Call_Type,Duration,Location,Timestamp[,Call_Text]
//! ```
//!
//! Validation is strict for everything the graph depends on (ids, call
//! type, duration) and lenient for timestamps, which fall back to `None`.
//! Every row error carries the 1-based line number from the source file.
//!
//! The raw bytes are hashed with BLAKE3 before parsing; the fingerprint
//! identifies the exact input a result was computed from.

use std::io::Read;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, instrument};

use crate::error::ErrorCode;
use crate::record::{CallRecord, CallTable, CallType};
use crate::time::parse_timestamp;

pub const COL_CALLER: &str = "Caller_ID";
pub const COL_RECEIVER: &str = "Receiver_ID";
pub const COL_CALL_TYPE: &str = "Call_Type";
pub const COL_DURATION: &str = "Duration";
pub const COL_LOCATION: &str = "Location";
pub const COL_TIMESTAMP: &str = "Timestamp";
pub const COL_CALL_TEXT: &str = "Call_Text";

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_CALLER,
    COL_RECEIVER,
    COL_CALL_TYPE,
    COL_DURATION,
    COL_LOCATION,
    COL_TIMESTAMP,
];

/// Errors raised while loading a call table.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("malformed CSV{}: {source}", fmt_line(.line))]
    Csv {
        line: Option<u64>,
        #[source]
        source: csv::Error,
    },

    #[error("line {line}: empty {column}")]
    MissingField { line: u64, column: &'static str },

    #[error("line {line}: unknown call type `{value}` (expected Outgoing or Incoming)")]
    InvalidCallType { line: u64, value: String },

    #[error("line {line}: invalid duration `{value}`")]
    InvalidDuration { line: u64, value: String },
}

impl LoadError {
    /// Machine-readable code for this failure.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::InputNotFound,
            Self::MissingColumns(_) => ErrorCode::MissingColumns,
            Self::Csv { .. } => ErrorCode::MalformedRow,
            Self::MissingField { .. } => ErrorCode::MissingField,
            Self::InvalidCallType { .. } => ErrorCode::InvalidCallType,
            Self::InvalidDuration { .. } => ErrorCode::InvalidDuration,
        }
    }
}

#[allow(clippy::ref_option)]
fn fmt_line(line: &Option<u64>) -> String {
    line.map_or_else(String::new, |l| format!(" at line {l}"))
}

impl From<csv::Error> for LoadError {
    fn from(source: csv::Error) -> Self {
        let line = source.position().map(csv::Position::line);
        Self::Csv { line, source }
    }
}

/// Header positions resolved once per file.
struct Columns {
    caller: usize,
    receiver: usize,
    call_type: usize,
    duration: usize,
    location: usize,
    timestamp: usize,
    call_text: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| find(**name).is_none())
            .map(|name| (*name).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(LoadError::MissingColumns(missing));
        }

        let require = |name: &str| {
            find(name).ok_or_else(|| LoadError::MissingColumns(vec![name.to_string()]))
        };

        Ok(Self {
            caller: require(COL_CALLER)?,
            receiver: require(COL_RECEIVER)?,
            call_type: require(COL_CALL_TYPE)?,
            duration: require(COL_DURATION)?,
            location: require(COL_LOCATION)?,
            timestamp: require(COL_TIMESTAMP)?,
            call_text: find(COL_CALL_TEXT),
        })
    }
}

/// Load and validate a call table from a CSV file on disk.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read, or any row/header
/// validation error from [`parse_calls`].
#[instrument]
pub fn load_calls(path: &Path) -> Result<CallTable, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_bytes(&bytes)
}

/// Load and validate a call table from any reader.
///
/// # Errors
///
/// Returns an error on I/O failure, missing required columns, malformed CSV,
/// or a row that fails validation.
pub fn parse_calls<R: Read>(mut reader: R) -> Result<CallTable, LoadError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| LoadError::Io {
            path: PathBuf::from("<reader>"),
            source,
        })?;
    parse_bytes(&bytes)
}

fn parse_bytes(bytes: &[u8]) -> Result<CallTable, LoadError> {
    let fingerprint = format!("blake3:{}", blake3::hash(bytes).to_hex());

    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(bytes);
    let columns = Columns::resolve(reader.headers()?)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        records.push(validate_row(&row, &columns)?);
    }

    debug!(
        rows = records.len(),
        has_call_text = columns.call_text.is_some(),
        "loaded call table"
    );

    Ok(CallTable {
        records,
        has_call_text: columns.call_text.is_some(),
        fingerprint,
    })
}

fn validate_row(row: &StringRecord, columns: &Columns) -> Result<CallRecord, LoadError> {
    let line = row.position().map_or(0, csv::Position::line);
    let cell = |idx: usize| row.get(idx).unwrap_or("").trim();

    let caller_id = cell(columns.caller);
    if caller_id.is_empty() {
        return Err(LoadError::MissingField {
            line,
            column: COL_CALLER,
        });
    }
    let receiver_id = cell(columns.receiver);
    if receiver_id.is_empty() {
        return Err(LoadError::MissingField {
            line,
            column: COL_RECEIVER,
        });
    }

    let call_type = cell(columns.call_type)
        .parse::<CallType>()
        .map_err(|_| LoadError::InvalidCallType {
            line,
            value: cell(columns.call_type).to_string(),
        })?;

    let raw_duration = cell(columns.duration);
    let duration = raw_duration
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| LoadError::InvalidDuration {
            line,
            value: raw_duration.to_string(),
        })?;

    let timestamp_raw = cell(columns.timestamp).to_string();
    let timestamp = parse_timestamp(&timestamp_raw);

    Ok(CallRecord {
        caller_id: caller_id.to_string(),
        receiver_id: receiver_id.to_string(),
        timestamp,
        timestamp_raw,
        location: cell(columns.location).to_string(),
        call_type,
        duration,
        call_text: columns.call_text.map(|idx| cell(idx).to_string()),
        line,
    })
}
