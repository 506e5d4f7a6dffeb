// SPDX-License-Identifier: MIT OR Apache-2.0
//! Closed taxonomy of reportable provisioning failures.
//!
//! Each [`ReportableError`] variant covers one upstream failure category and
//! knows its reason text and ordered supporting fields. Every variant also
//! carries a stable [`ReportCode`] (a machine-readable tag that never
//! changes across releases) grouped into a [`ReportCategory`].
//!
//! The reason text and field names of each variant are a compatibility
//! contract with consumers of the host diagnostic channel.
//!
//! ```
//! use pdr_taxonomy::{ReportCode, ReportableError};
//!
//! let err = ReportableError::dhcp_lease(5.6, "eth0");
//! assert_eq!(err.code(), ReportCode::DhcpLeaseFailed);
//! assert_eq!(err.reason(), "failure to obtain DHCP lease");
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod imds;
mod variant;

pub use imds::{ImdsFailureKind, ImdsRequestError, TransportCause};
pub use pdr_record::Reportable;
pub use variant::{ProcessFailure, ReportableError};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ReportCategory
// ---------------------------------------------------------------------------

/// Broad family that a [`ReportCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ReportCategory {
    /// DHCP lease acquisition.
    Dhcp,
    /// Instance metadata service queries and payloads.
    Imds,
    /// `ovf-env.xml` provisioning media.
    Ovf,
    /// VM identity resolution.
    Identity,
    /// Guest proxy agent.
    ProxyAgent,
    /// Catch-all for unexpected failures.
    Internal,
}

impl fmt::Display for ReportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Dhcp => "dhcp",
            Self::Imds => "imds",
            Self::Ovf => "ovf",
            Self::Identity => "identity",
            Self::ProxyAgent => "proxy_agent",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ReportCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable code for each taxonomy variant.
///
/// Serialises to `SCREAMING_SNAKE_CASE`; values are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportCode {
    // -- DHCP --
    /// No DHCP lease was obtained.
    DhcpLeaseFailed,
    /// No interface suitable for DHCP was found.
    DhcpInterfaceNotFound,

    // -- IMDS --
    /// Transport-level failure querying the metadata service.
    ImdsUrlError,
    /// Metadata payload could not be parsed.
    ImdsMetadataParsing,
    /// Metadata payload held an unusable value.
    ImdsInvalidMetadata,

    // -- OVF --
    /// `ovf-env.xml` is not well-formed XML.
    OvfParsing,
    /// `ovf-env.xml` parsed but its contents are unexpected.
    OvfInvalidMetadata,

    // -- Identity --
    /// The VM identifier could not be derived.
    VmIdentification,

    // -- Proxy agent --
    /// The proxy agent binary is missing.
    ProxyAgentNotFound,
    /// The proxy agent status check failed.
    ProxyAgentStatusFailure,

    // -- Internal --
    /// An error nothing else handled.
    UnhandledException,
}

impl ReportCode {
    /// Every code, in declaration order.
    pub const ALL: &'static [ReportCode] = &[
        Self::DhcpLeaseFailed,
        Self::DhcpInterfaceNotFound,
        Self::ImdsUrlError,
        Self::ImdsMetadataParsing,
        Self::ImdsInvalidMetadata,
        Self::OvfParsing,
        Self::OvfInvalidMetadata,
        Self::VmIdentification,
        Self::ProxyAgentNotFound,
        Self::ProxyAgentStatusFailure,
        Self::UnhandledException,
    ];

    /// Returns the broad [`ReportCategory`] this code belongs to.
    pub fn category(&self) -> ReportCategory {
        match self {
            Self::DhcpLeaseFailed | Self::DhcpInterfaceNotFound => ReportCategory::Dhcp,

            Self::ImdsUrlError | Self::ImdsMetadataParsing | Self::ImdsInvalidMetadata => {
                ReportCategory::Imds
            }

            Self::OvfParsing | Self::OvfInvalidMetadata => ReportCategory::Ovf,

            Self::VmIdentification => ReportCategory::Identity,

            Self::ProxyAgentNotFound | Self::ProxyAgentStatusFailure => {
                ReportCategory::ProxyAgent
            }

            Self::UnhandledException => ReportCategory::Internal,
        }
    }

    /// Stable `&'static str` representation (e.g. `"DHCP_LEASE_FAILED"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DhcpLeaseFailed => "DHCP_LEASE_FAILED",
            Self::DhcpInterfaceNotFound => "DHCP_INTERFACE_NOT_FOUND",
            Self::ImdsUrlError => "IMDS_URL_ERROR",
            Self::ImdsMetadataParsing => "IMDS_METADATA_PARSING",
            Self::ImdsInvalidMetadata => "IMDS_INVALID_METADATA",
            Self::OvfParsing => "OVF_PARSING",
            Self::OvfInvalidMetadata => "OVF_INVALID_METADATA",
            Self::VmIdentification => "VM_IDENTIFICATION",
            Self::ProxyAgentNotFound => "PROXY_AGENT_NOT_FOUND",
            Self::ProxyAgentStatusFailure => "PROXY_AGENT_STATUS_FAILURE",
            Self::UnhandledException => "UNHANDLED_EXCEPTION",
        }
    }

    /// Reason text with `<placeholders>` for the interpolated parts.
    pub fn reason_template(&self) -> &'static str {
        match self {
            Self::DhcpLeaseFailed => "failure to obtain DHCP lease",
            Self::DhcpInterfaceNotFound => "failure to find DHCP interface",
            Self::ImdsUrlError => "<classification> querying IMDS",
            Self::ImdsMetadataParsing => "error parsing IMDS metadata",
            Self::ImdsInvalidMetadata => "invalid IMDS metadata for key=<key>",
            Self::OvfParsing => "error parsing ovf-env.xml: <message>",
            Self::OvfInvalidMetadata => "unexpected metadata parsing ovf-env.xml: <message>",
            Self::VmIdentification => "failure to identify Azure VM ID",
            Self::ProxyAgentNotFound => "azure-proxy-agent not found",
            Self::ProxyAgentStatusFailure => "azure-proxy-agent status failure",
            Self::UnhandledException => "unhandled exception",
        }
    }

    /// Supporting field names emitted for this code, in report order.
    pub fn supporting_fields(&self) -> &'static [&'static str] {
        match self {
            Self::DhcpLeaseFailed | Self::DhcpInterfaceNotFound => &["duration"],
            Self::ImdsUrlError => &["duration", "exception", "url"],
            Self::ImdsMetadataParsing => &["exception"],
            Self::ImdsInvalidMetadata => &["key", "value", "type"],
            Self::OvfParsing | Self::OvfInvalidMetadata | Self::ProxyAgentNotFound => &[],
            Self::VmIdentification => &["exception", "system_uuid"],
            Self::ProxyAgentStatusFailure => &["exit_code", "stdout", "stderr"],
            Self::UnhandledException => &["exception", "traceback_base64"],
        }
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn all_codes_have_unique_as_str() {
        let mut seen = HashSet::new();
        for code in ReportCode::ALL {
            assert!(seen.insert(code.as_str()), "duplicate as_str value: {code}");
        }
        assert_eq!(seen.len(), ReportCode::ALL.len());
    }

    #[test]
    fn code_count() {
        // Ensure we don't silently drop a variant from ALL.
        assert_eq!(ReportCode::ALL.len(), 11);
    }

    #[test]
    fn all_codes_serialize_to_as_str() {
        for code in ReportCode::ALL {
            let json = serde_json::to_string(code).unwrap();
            assert_eq!(json, format!(r#""{}""#, code.as_str()), "mismatch for {code:?}");
            let back: ReportCode = serde_json::from_str(&json).unwrap();
            assert_eq!(back, *code);
        }
    }

    #[test]
    fn display_matches_as_str() {
        for code in ReportCode::ALL {
            assert_eq!(code.to_string(), code.as_str());
        }
    }

    #[test]
    fn categories() {
        assert_eq!(ReportCode::DhcpLeaseFailed.category(), ReportCategory::Dhcp);
        assert_eq!(ReportCode::DhcpInterfaceNotFound.category(), ReportCategory::Dhcp);
        assert_eq!(ReportCode::ImdsUrlError.category(), ReportCategory::Imds);
        assert_eq!(ReportCode::ImdsInvalidMetadata.category(), ReportCategory::Imds);
        assert_eq!(ReportCode::OvfParsing.category(), ReportCategory::Ovf);
        assert_eq!(ReportCode::VmIdentification.category(), ReportCategory::Identity);
        assert_eq!(ReportCode::ProxyAgentNotFound.category(), ReportCategory::ProxyAgent);
        assert_eq!(ReportCode::UnhandledException.category(), ReportCategory::Internal);
    }

    #[test]
    fn category_serde_and_display_agree() {
        for code in ReportCode::ALL {
            let cat = code.category();
            let json = serde_json::to_string(&cat).unwrap();
            assert_eq!(json, format!(r#""{cat}""#));
        }
    }
}
