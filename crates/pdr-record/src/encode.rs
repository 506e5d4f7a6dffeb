// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-line report encoding.
//!
//! Fields are rendered as `key=value` and joined with [`DELIMITER`]. A field
//! containing a line feed, carriage return or [`QUOTE`] has every quote
//! doubled and is wrapped in quotes. Nothing else is escaped: `"`, tabs,
//! embedded delimiters and trailing whitespace pass through untouched.

use crate::ErrorRecord;
use chrono::{DateTime, SecondsFormat, Utc};
use std::borrow::Cow;

/// Field separator.
pub const DELIMITER: char = '|';

/// Quote character.
pub const QUOTE: char = '\'';

/// Encode `record` for the instance `vm_id`.
///
/// Output order is `result`, `reason`, `agent`, the supporting fields in
/// insertion order, `vm_id`, `timestamp`, `documentation_url`.
pub fn encode(record: &ErrorRecord, vm_id: &str) -> String {
    let data = record.supporting_data();
    let mut fields = Vec::with_capacity(data.len() + 6);
    fields.push("result=error".to_owned());
    fields.push(format!("reason={}", record.reason()));
    fields.push(format!("agent={}", record.agent()));
    fields.extend(data.iter().map(|(k, v)| format!("{k}={v}")));
    fields.push(format!("vm_id={vm_id}"));
    fields.push(format!("timestamp={}", format_timestamp(record.timestamp())));
    fields.push(format!("documentation_url={}", record.documentation_url()));
    encode_fields(fields)
}

/// Quote each pre-rendered `key=value` field and join them into one line.
pub fn encode_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (idx, field) in fields.into_iter().enumerate() {
        if idx > 0 {
            line.push(DELIMITER);
        }
        line.push_str(&quote_field(field.as_ref()));
    }
    line
}

/// Whether `field` must be quoted.
pub fn needs_quoting(field: &str) -> bool {
    field.contains(['\n', '\r', QUOTE])
}

/// Apply the quoting rule to one rendered field.
///
/// ```
/// use pdr_record::quote_field;
///
/// assert_eq!(quote_field("k=plain \"text\""), "k=plain \"text\"");
/// assert_eq!(quote_field("k=xx'xx"), "'k=xx''xx'");
/// assert_eq!(quote_field("k=x\nx"), "'k=x\nx'");
/// ```
pub fn quote_field(field: &str) -> Cow<'_, str> {
    if !needs_quoting(field) {
        return Cow::Borrowed(field);
    }
    let mut quoted = String::with_capacity(field.len() + 2);
    quoted.push(QUOTE);
    for ch in field.chars() {
        if ch == QUOTE {
            quoted.push(QUOTE);
        }
        quoted.push(ch);
    }
    quoted.push(QUOTE);
    Cow::Owned(quoted)
}

/// ISO-8601 with microseconds and an explicit `+00:00` offset.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}
