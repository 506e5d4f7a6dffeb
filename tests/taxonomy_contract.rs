// SPDX-License-Identifier: MIT OR Apache-2.0
//! Every variant agrees with its code's registered reason and field list.

use std::collections::HashSet;

use pdr_record::FieldValue;
use pdr_taxonomy::{
    ImdsRequestError, ProcessFailure, ReportCategory, ReportCode, ReportableError, TransportCause,
};
use pdr_traceback::Traceback;

#[derive(Debug, thiserror::Error)]
#[error("boom")]
struct Boom;

fn one_of_each() -> Vec<ReportableError> {
    vec![
        ReportableError::dhcp_lease(5.6, "eth0"),
        ReportableError::dhcp_interface_not_found(1.0),
        ReportableError::imds_url_error(
            ImdsRequestError::new(TransportCause::Other, "404", "http://imds").with_status(404),
            2.0,
        ),
        ReportableError::imds_metadata_parsing(&Boom),
        ReportableError::imds_invalid_metadata("compute", 42),
        ReportableError::ovf_parsing("bad xml"),
        ReportableError::ovf_invalid_metadata("no user"),
        ReportableError::vm_identification(&Boom, "uuid"),
        ReportableError::proxy_agent_not_found(),
        ReportableError::proxy_agent_status_failure(ProcessFailure {
            exit_code: Some(1),
            stdout: "out".into(),
            stderr: "err".into(),
        }),
        ReportableError::unhandled_with_traceback(
            &Boom,
            Traceback::from_parts("Boom: boom", vec![], vec!["   0: main".into()]),
        ),
    ]
}

#[test]
fn samples_cover_every_code() {
    let codes: HashSet<ReportCode> = one_of_each().iter().map(ReportableError::code).collect();
    assert_eq!(codes.len(), ReportCode::ALL.len());
}

#[test]
fn supporting_fields_match_registry() {
    for err in one_of_each() {
        let keys: Vec<String> = err.supporting_data().keys().map(str::to_owned).collect();
        assert_eq!(keys, err.code().supporting_fields(), "{err}");
    }
}

#[test]
fn reasons_follow_templates() {
    for err in one_of_each() {
        let template = err.code().reason_template();
        let reason = err.reason();
        match template.split_once('<') {
            Some((prefix, rest)) => {
                let suffix = rest.split_once('>').map_or("", |(_, s)| s);
                assert!(reason.starts_with(prefix), "{reason} vs {template}");
                assert!(reason.ends_with(suffix), "{reason} vs {template}");
            }
            None => assert_eq!(reason, template),
        }
    }
}

#[test]
fn imds_http_status_in_reason() {
    let err = &one_of_each()[2];
    assert_eq!(err.reason(), "http error 404 querying IMDS");
    assert_eq!(err.category(), ReportCategory::Imds);
}

#[test]
fn invalid_metadata_type_tracks_value() {
    let cases = [
        (FieldValue::from("x"), "str"),
        (FieldValue::from(1), "int"),
        (FieldValue::from(1.5), "float"),
        (FieldValue::Null, "NoneType"),
    ];
    for (value, type_name) in cases {
        let data = ReportableError::imds_invalid_metadata("k", value).supporting_data();
        assert_eq!(data.get("type"), Some(&FieldValue::from(type_name)));
    }
}

#[test]
fn variants_roundtrip_through_json() {
    for err in one_of_each() {
        let json = serde_json::to_value(&err).unwrap();
        assert!(json["kind"].is_string());
        let back: ReportableError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }
}

#[test]
fn display_leads_with_code() {
    for err in one_of_each() {
        assert!(err.to_string().starts_with(&format!("[{}] ", err.code())));
    }
}
