// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz the single-line encoder with arbitrary reasons, fields and ids.
//!
//! Checks that encoding never panics, keeps the fixed prefix and suffix,
//! balances quotes, and that `quote_field` is reversible.
#![no_main]
use arbitrary::Arbitrary;
use chrono::{TimeZone, Utc};
use libfuzzer_sys::fuzz_target;
use pdr_record::{Agent, ErrorRecord, FieldValue, FixedClock, encode, quote_field};

#[derive(Debug, Arbitrary)]
enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Null,
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        match v {
            Value::Str(s) => FieldValue::Str(s),
            Value::Int(i) => FieldValue::Int(i),
            Value::Float(x) => FieldValue::Float(x),
            Value::Null => FieldValue::Null,
        }
    }
}

#[derive(Debug, Arbitrary)]
struct Input {
    reason: String,
    fields: Vec<(String, Value)>,
    vm_id: String,
}

fuzz_target!(|input: Input| {
    let Some(at) = Utc.timestamp_opt(1_714_564_800, 0).single() else {
        return;
    };
    let mut builder = ErrorRecord::builder(input.reason).agent(Agent::new("Cloud-Init", "24.1"));
    for (k, v) in input.fields {
        builder = builder.field(k, v);
    }
    let record = builder.build_with(&FixedClock::new(at));
    let line = encode(&record, &input.vm_id);

    assert!(line.starts_with("result=error|"));
    assert!(line.ends_with("|documentation_url=https://aka.ms/linuxprovisioningerror"));
    assert_eq!(line.matches('\'').count() % 2, 0, "unbalanced quotes");
    assert_eq!(encode(&record, &input.vm_id), line);

    let field = format!("vm_id={}", input.vm_id);
    let quoted = quote_field(&field);
    if quoted.as_ref() != field {
        let inner = &quoted[1..quoted.len() - 1];
        assert_eq!(inner.replace("''", "'"), field);
    }
});
