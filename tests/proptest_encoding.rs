// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for report encoding and configuration.

use proptest::prelude::*;

use chrono::{TimeZone, Utc};
use pdr_config::{ReportConfig, merge_configs, parse_toml, validate_config};
use pdr_record::{Agent, ErrorRecord, FieldValue, FixedClock, encode};
use pdr_taxonomy::{ImdsRequestError, ReportableError, TransportCause};

// ── Strategies ──────────────────────────────────────────────────────────

fn fast_config() -> ProptestConfig {
    ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    }
}

fn clock() -> FixedClock {
    FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
}

/// Text without the delimiter, so lines can be split back unambiguously.
fn arb_text() -> BoxedStrategy<String> {
    prop_oneof![
        "[^|]{0,40}",
        "[a-z' \n\r\"\t]{0,20}",
        Just("xx'xx'xx".to_owned()),
        Just("x\nx".to_owned()),
    ]
    .boxed()
}

fn arb_value() -> BoxedStrategy<FieldValue> {
    prop_oneof![
        arb_text().prop_map(FieldValue::Str),
        any::<i64>().prop_map(FieldValue::Int),
        (-1.0e6..1.0e6f64).prop_map(FieldValue::Float),
        Just(FieldValue::Null),
    ]
    .boxed()
}

fn arb_valid_log_level() -> BoxedStrategy<String> {
    prop_oneof![
        Just("error".to_owned()),
        Just("warn".to_owned()),
        Just("info".to_owned()),
        Just("debug".to_owned()),
        Just("trace".to_owned()),
    ]
    .boxed()
}

fn arb_optional_string() -> BoxedStrategy<Option<String>> {
    prop_oneof![Just(None), "[a-zA-Z0-9_.-]{1,20}".prop_map(Some)].boxed()
}

fn arb_config() -> BoxedStrategy<ReportConfig> {
    (
        prop_oneof![Just(None), Just(Some("Cloud-Init".to_owned()))],
        arb_optional_string(),
        arb_optional_string(),
        prop_oneof![Just(None), arb_valid_log_level().prop_map(Some)],
    )
        .prop_map(|(product, version, vm_id_placeholder, log_level)| ReportConfig {
            product,
            version,
            vm_id_placeholder,
            log_level,
        })
        .boxed()
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Split an encoded line back into its unquoted fields.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut chars = line.chars().peekable();
    loop {
        let mut field = String::new();
        if chars.peek() == Some(&'\'') {
            chars.next();
            while let Some(c) = chars.next() {
                if c != '\'' {
                    field.push(c);
                } else if chars.peek() == Some(&'\'') {
                    chars.next();
                    field.push('\'');
                } else {
                    break;
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == '|' {
                    break;
                }
                field.push(c);
                chars.next();
            }
        }
        fields.push(field);
        if chars.next() != Some('|') {
            return fields;
        }
    }
}

fn build(reason: &str, values: &[FieldValue]) -> ErrorRecord {
    let mut builder = ErrorRecord::builder(reason).agent(Agent::new("Cloud-Init", "24.1"));
    for (i, v) in values.iter().enumerate() {
        builder = builder.field(format!("f{i}"), v.clone());
    }
    builder.build_with(&clock())
}

// ── Encoding ────────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(fast_config())]

    #[test]
    fn fields_survive_quoting(
        reason in arb_text(),
        values in prop::collection::vec(arb_value(), 0..6),
        vm_id in "[a-z0-9-]{0,12}",
    ) {
        let record = build(&reason, &values);
        let line = encode(&record, &vm_id);

        let mut expected = vec![
            "result=error".to_owned(),
            format!("reason={reason}"),
            "agent=Cloud-Init/24.1".to_owned(),
        ];
        expected.extend(values.iter().enumerate().map(|(i, v)| format!("f{i}={v}")));
        expected.push(format!("vm_id={vm_id}"));
        expected.push("timestamp=2024-05-01T12:00:00.000000+00:00".to_owned());
        expected.push("documentation_url=https://aka.ms/linuxprovisioningerror".to_owned());

        prop_assert_eq!(split_line(&line), expected);
    }

    #[test]
    fn unquoted_fields_are_verbatim(value in "[^|'\n\r]{0,40}") {
        let record = build("r", &[FieldValue::Str(value.clone())]);
        let line = encode(&record, "vm");
        let expected = format!("|f0={value}|");
        prop_assert!(line.contains(&expected));
    }

    #[test]
    fn quoted_fields_double_every_quote(value in "[a-z]{0,5}['\n\r][a-z'\n]{0,10}") {
        let record = build("r", &[FieldValue::Str(value.clone())]);
        let line = encode(&record, "vm");
        let expected = format!("|'f0={}'|", value.replace('\'', "''"));
        prop_assert!(line.contains(&expected));
    }

    #[test]
    fn encoding_is_deterministic(reason in arb_text(), vm_id in "[a-z0-9-]{1,12}") {
        let record = build(&reason, &[FieldValue::Null]);
        prop_assert_eq!(encode(&record, &vm_id), encode(&record, &vm_id));
    }

    #[test]
    fn timeouts_never_classify_as_connection_error(status in prop::option::of(100u16..600)) {
        for cause in [TransportCause::ConnectTimeout, TransportCause::ReadTimeout] {
            let mut error = ImdsRequestError::new(cause, "t", "http://imds");
            error.status = status;
            let reason = ReportableError::imds_url_error(error, 1.0).reason();
            prop_assert!(reason.contains("timeout"), "{}", reason);
        }
    }
}

// ── Configuration ───────────────────────────────────────────────────────

proptest! {
    #![proptest_config(fast_config())]

    #[test]
    fn generated_configs_validate(config in arb_config()) {
        prop_assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn merge_with_empty_overlay_is_identity(config in arb_config()) {
        let empty = ReportConfig {
            product: None,
            version: None,
            vm_id_placeholder: None,
            log_level: None,
        };
        prop_assert_eq!(merge_configs(config.clone(), empty), config);
    }

    #[test]
    fn toml_roundtrip(config in arb_config()) {
        let text = toml::to_string(&config).unwrap();
        prop_assert_eq!(parse_toml(&text).unwrap(), config);
    }
}
