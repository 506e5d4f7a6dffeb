// SPDX-License-Identifier: MIT OR Apache-2.0

//! The [`ReportableError`] taxonomy.

use crate::{ImdsRequestError, ReportCategory, ReportCode};
use pdr_record::{Agent, Clock, ErrorRecord, FieldValue, Reportable, SupportingData};
use pdr_traceback::Traceback;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use tracing::debug;

/// Output of a failed helper process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("process exited with status {exit_code:?}")]
pub struct ProcessFailure {
    /// Exit status, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// One reportable provisioning failure.
///
/// Each variant holds exactly the inputs of its failure category. Errors
/// given to the constructors are stored as their `Debug` rendering (type
/// name and every field), since nothing else about them can be asked later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportableError {
    /// No DHCP lease within `duration` seconds.
    DhcpLease {
        /// Seconds spent trying.
        duration: f64,
        /// Interface the lease was requested on. Logged, not reported.
        interface: Option<String>,
    },
    /// No DHCP-capable interface within `duration` seconds.
    DhcpInterfaceNotFound {
        /// Seconds spent searching.
        duration: f64,
    },
    /// Transport failure querying the metadata service.
    ImdsUrlError {
        /// The failed request.
        error: ImdsRequestError,
        /// Seconds spent on the request, retries included.
        duration: f64,
    },
    /// Metadata payload could not be parsed.
    ImdsMetadataParsing {
        /// `Debug` rendering of the parse error.
        exception: String,
    },
    /// Metadata key held an unusable value.
    ImdsInvalidMetadata {
        /// Offending key.
        key: String,
        /// Offending value.
        value: FieldValue,
    },
    /// `ovf-env.xml` is not well-formed.
    OvfParsing {
        /// Parser message.
        message: String,
    },
    /// `ovf-env.xml` contents are unexpected.
    OvfInvalidMetadata {
        /// What was unexpected.
        message: String,
    },
    /// An error nothing else handled.
    UnhandledException {
        /// `Debug` rendering of the error.
        exception: String,
        /// Trace captured when the variant was built.
        traceback: Traceback,
    },
    /// The VM identifier could not be derived from the system UUID.
    VmIdentification {
        /// `Debug` rendering of the error.
        exception: String,
        /// Raw system UUID.
        system_uuid: String,
    },
    /// The proxy agent binary is missing.
    ProxyAgentNotFound,
    /// The proxy agent status check failed.
    ProxyAgentStatusFailure {
        /// The failed status invocation.
        failure: ProcessFailure,
    },
}

impl ReportableError {
    /// DHCP lease failure on `interface`.
    pub fn dhcp_lease(duration: f64, interface: impl Into<String>) -> Self {
        Self::DhcpLease {
            duration,
            interface: Some(interface.into()),
        }
    }

    /// No DHCP interface found.
    pub fn dhcp_interface_not_found(duration: f64) -> Self {
        Self::DhcpInterfaceNotFound { duration }
    }

    /// Failed metadata-service request.
    pub fn imds_url_error(error: ImdsRequestError, duration: f64) -> Self {
        Self::ImdsUrlError { error, duration }
    }

    /// Metadata parse failure.
    pub fn imds_metadata_parsing<E: Error + ?Sized>(error: &E) -> Self {
        Self::ImdsMetadataParsing {
            exception: format!("{error:?}"),
        }
    }

    /// Unusable metadata value.
    pub fn imds_invalid_metadata(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self::ImdsInvalidMetadata {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `ovf-env.xml` parse failure; `error`'s message becomes part of the
    /// reason.
    pub fn ovf_parsing<E: fmt::Display + ?Sized>(error: &E) -> Self {
        Self::OvfParsing {
            message: error.to_string(),
        }
    }

    /// Unexpected `ovf-env.xml` contents.
    pub fn ovf_invalid_metadata(message: impl Into<String>) -> Self {
        Self::OvfInvalidMetadata {
            message: message.into(),
        }
    }

    /// Unhandled error; captures the current backtrace.
    ///
    /// A `&dyn Error` is fine here: the traceback summary names the
    /// concrete type from its `Debug` rendering.
    pub fn unhandled<E: Error + ?Sized>(error: &E) -> Self {
        Self::unhandled_with_traceback(error, Traceback::capture(error))
    }

    /// Unhandled error with an already captured traceback.
    pub fn unhandled_with_traceback<E: Error + ?Sized>(error: &E, traceback: Traceback) -> Self {
        Self::UnhandledException {
            exception: format!("{error:?}"),
            traceback,
        }
    }

    /// VM identification failure.
    pub fn vm_identification<E: Error + ?Sized>(error: &E, system_uuid: impl Into<String>) -> Self {
        Self::VmIdentification {
            exception: format!("{error:?}"),
            system_uuid: system_uuid.into(),
        }
    }

    /// Proxy agent missing.
    pub fn proxy_agent_not_found() -> Self {
        Self::ProxyAgentNotFound
    }

    /// Proxy agent status failure.
    pub fn proxy_agent_status_failure(failure: ProcessFailure) -> Self {
        Self::ProxyAgentStatusFailure { failure }
    }

    /// Stable code of this variant.
    pub fn code(&self) -> ReportCode {
        match self {
            Self::DhcpLease { .. } => ReportCode::DhcpLeaseFailed,
            Self::DhcpInterfaceNotFound { .. } => ReportCode::DhcpInterfaceNotFound,
            Self::ImdsUrlError { .. } => ReportCode::ImdsUrlError,
            Self::ImdsMetadataParsing { .. } => ReportCode::ImdsMetadataParsing,
            Self::ImdsInvalidMetadata { .. } => ReportCode::ImdsInvalidMetadata,
            Self::OvfParsing { .. } => ReportCode::OvfParsing,
            Self::OvfInvalidMetadata { .. } => ReportCode::OvfInvalidMetadata,
            Self::UnhandledException { .. } => ReportCode::UnhandledException,
            Self::VmIdentification { .. } => ReportCode::VmIdentification,
            Self::ProxyAgentNotFound => ReportCode::ProxyAgentNotFound,
            Self::ProxyAgentStatusFailure { .. } => ReportCode::ProxyAgentStatusFailure,
        }
    }

    /// Shorthand for `self.code().category()`.
    pub fn category(&self) -> ReportCategory {
        self.code().category()
    }

    /// Human-readable reason.
    pub fn reason(&self) -> String {
        match self {
            Self::ImdsUrlError { error, .. } => error.classify().to_string(),
            Self::ImdsInvalidMetadata { key, .. } => format!("invalid IMDS metadata for key={key}"),
            Self::OvfParsing { message } => format!("error parsing ovf-env.xml: {message}"),
            Self::OvfInvalidMetadata { message } => {
                format!("unexpected metadata parsing ovf-env.xml: {message}")
            }
            other => other.code().reason_template().to_owned(),
        }
    }

    /// Supporting fields in report order.
    pub fn supporting_data(&self) -> SupportingData {
        let data = SupportingData::new();
        match self {
            Self::DhcpLease { duration, .. } | Self::DhcpInterfaceNotFound { duration } => {
                data.with("duration", *duration)
            }
            Self::ImdsUrlError { error, duration } => data
                .with("duration", *duration)
                .with("exception", format!("{error:?}"))
                .with("url", &error.url),
            Self::ImdsMetadataParsing { exception } => data.with("exception", exception),
            Self::ImdsInvalidMetadata { key, value } => data
                .with("key", key)
                .with("value", value.clone())
                .with("type", value.type_name()),
            Self::OvfParsing { .. }
            | Self::OvfInvalidMetadata { .. }
            | Self::ProxyAgentNotFound => data,
            Self::UnhandledException {
                exception,
                traceback,
            } => data
                .with("exception", exception)
                .with("traceback_base64", traceback.to_base64()),
            Self::VmIdentification {
                exception,
                system_uuid,
            } => data
                .with("exception", exception)
                .with("system_uuid", system_uuid),
            Self::ProxyAgentStatusFailure { failure } => data
                .with("exit_code", failure.exit_code)
                .with("stdout", &failure.stdout)
                .with("stderr", &failure.stderr),
        }
    }
}

impl Reportable for ReportableError {
    fn reason(&self) -> String {
        ReportableError::reason(self)
    }

    fn supporting_data(&self) -> SupportingData {
        ReportableError::supporting_data(self)
    }

    fn to_record(&self, agent: &Agent, clock: &dyn Clock) -> ErrorRecord {
        if let Self::DhcpLease {
            interface: Some(interface),
            ..
        } = self
        {
            debug!(code = %self.code(), %interface, "building diagnostic record");
        } else {
            debug!(code = %self.code(), "building diagnostic record");
        }
        ErrorRecord::builder(self.reason())
            .fields(self.supporting_data())
            .agent(agent.clone())
            .build_with(clock)
    }
}

impl fmt::Display for ReportableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code(), self.reason())
    }
}
