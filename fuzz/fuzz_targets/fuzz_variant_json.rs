// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz deserialization of taxonomy variants from JSON and their encoding.
#![no_main]
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use pdr_record::{Agent, FixedClock, Reportable, encode};
use pdr_taxonomy::ReportableError;

fuzz_target!(|data: &[u8]| {
    let Ok(err) = serde_json::from_slice::<ReportableError>(data) else {
        return;
    };
    let Some(at) = Utc.timestamp_opt(0, 0).single() else {
        return;
    };

    let record = err.to_record(&Agent::new("Cloud-Init", "24.1"), &FixedClock::new(at));
    let keys: Vec<&str> = record.supporting_data().keys().collect();
    assert_eq!(keys, err.code().supporting_fields());

    let line = encode(&record, "vm");
    assert!(line.starts_with("result=error|"));
    let _ = err.to_string();
});
