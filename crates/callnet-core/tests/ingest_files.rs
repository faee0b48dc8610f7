//! File-based ingestion tests: real files on disk, fingerprints, and
//! hour-bucket properties over generated timestamps.

use std::io::Write;

use callnet_core::{CallType, ErrorCode, LoadError, TimeSlot, load_calls};
use proptest::prelude::*;
use tempfile::NamedTempFile;

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write csv");
    file.flush().expect("flush csv");
    file
}

#[test]
fn loads_file_from_disk() {
    let file = write_csv(
        "Caller_ID,Receiver_ID,Call_Type,Duration,Location,Timestamp,Call_Text\n\
         911-1,911-2,Outgoing,45,Chennai,2024-02-10 02:15:00,I will hurt you\n\
         911-3,911-1,Incoming,10,Chennai,2024-02-10 14:00:00,thanks a lot\n",
    );

    let table = load_calls(file.path()).expect("load");
    assert_eq!(table.len(), 2);
    assert_eq!(table.records[1].call_type, CallType::Incoming);
    assert_eq!(table.records[0].time_slot(), TimeSlot::LateNight);
    assert_eq!(table.records[1].time_slot(), TimeSlot::Afternoon);
    assert!(table.fingerprint.starts_with("blake3:"));
}

#[test]
fn header_only_file_is_empty_table() {
    let file = write_csv("Caller_ID,Receiver_ID,Call_Type,Duration,Location,Timestamp\n");
    let table = load_calls(file.path()).expect("load");
    assert!(table.is_empty());
    assert!(!table.has_call_text);
}

#[test]
fn quoted_fields_with_commas_survive() {
    let file = write_csv(
        "Caller_ID,Receiver_ID,Call_Type,Duration,Location,Timestamp,Call_Text\n\
         A,B,Outgoing,5,\"Navi Mumbai, MH\",2024-02-10 09:00,\"bomb, at the station\"\n",
    );
    let table = load_calls(file.path()).expect("load");
    assert_eq!(table.records[0].location, "Navi Mumbai, MH");
    assert_eq!(
        table.records[0].call_text.as_deref(),
        Some("bomb, at the station")
    );
}

#[test]
fn later_bad_row_reports_its_line() {
    let file = write_csv(
        "Caller_ID,Receiver_ID,Call_Type,Duration,Location,Timestamp\n\
         A,B,Outgoing,5,X,2024-02-10 09:00\n\
         A,C,Outgoing,5,X,2024-02-10 09:00\n\
         A,,Outgoing,5,X,2024-02-10 09:00\n",
    );
    let err = load_calls(file.path()).expect_err("row 4 is bad");
    assert!(matches!(err, LoadError::MissingField { line: 4, .. }), "{err}");
    assert_eq!(err.error_code(), ErrorCode::MissingField);
}

proptest! {
    #[test]
    fn every_hour_lands_in_its_bucket(hour in 0u32..24, minute in 0u32..60) {
        let file = write_csv(&format!(
            "Caller_ID,Receiver_ID,Call_Type,Duration,Location,Timestamp\n\
             A,B,Outgoing,1,X,2024-05-05 {hour:02}:{minute:02}:00\n"
        ));
        let table = load_calls(file.path()).expect("load");
        let expected = match hour {
            0..=5 => TimeSlot::LateNight,
            6..=11 => TimeSlot::Morning,
            12..=17 => TimeSlot::Afternoon,
            _ => TimeSlot::Evening,
        };
        prop_assert_eq!(table.records[0].time_slot(), expected);
    }
}
