// SPDX-License-Identifier: MIT OR Apache-2.0

//! The [`ErrorRecord`] type and its builder.

use crate::{Agent, Clock, DOCUMENTATION_URL, FieldValue, SupportingData, SystemClock};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One reportable provisioning failure.
///
/// Records are immutable once built; encode them with [`crate::encode`] or
/// [`ErrorRecord::encode`] as many times as needed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    reason: String,
    supporting_data: SupportingData,
    agent: Agent,
    timestamp: DateTime<Utc>,
    documentation_url: &'static str,
}

impl ErrorRecord {
    /// Start building a record with the given reason.
    pub fn builder(reason: impl Into<String>) -> RecordBuilder {
        RecordBuilder::new(reason)
    }

    /// Human-readable reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Supporting fields in report order.
    pub fn supporting_data(&self) -> &SupportingData {
        &self.supporting_data
    }

    /// Reporting agent.
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Instant the record was built.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Help resource link.
    pub fn documentation_url(&self) -> &str {
        self.documentation_url
    }

    /// Shorthand for [`crate::encode`].
    pub fn encode(&self, vm_id: &str) -> String {
        crate::encode(self, vm_id)
    }
}

/// Fluent builder for [`ErrorRecord`]s.
///
/// # Examples
///
/// ```
/// use pdr_record::{ErrorRecord, FieldValue};
///
/// let record = ErrorRecord::builder("invalid IMDS metadata for key=compute")
///     .field("key", "compute")
///     .field("value", FieldValue::Null)
///     .build();
///
/// let keys: Vec<_> = record.supporting_data().keys().collect();
/// assert_eq!(keys, ["key", "value"]);
/// ```
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    reason: String,
    supporting_data: SupportingData,
    agent: Option<Agent>,
    timestamp: Option<DateTime<Utc>>,
}

impl RecordBuilder {
    /// Create a builder with the given reason and no fields.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            supporting_data: SupportingData::new(),
            agent: None,
            timestamp: None,
        }
    }

    /// Append a supporting field.
    #[must_use]
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.supporting_data.insert(key, value);
        self
    }

    /// Append every field of `data`.
    #[must_use]
    pub fn fields(mut self, data: SupportingData) -> Self {
        self.supporting_data.extend(data);
        self
    }

    /// Set the reporting agent (defaults to [`Agent::default`]).
    #[must_use]
    pub fn agent(mut self, agent: Agent) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Pin the timestamp instead of reading a clock.
    #[must_use]
    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }

    /// Finish, stamping the record from the system clock.
    pub fn build(self) -> ErrorRecord {
        self.build_with(&SystemClock)
    }

    /// Finish, stamping the record from `clock` unless a timestamp was set.
    pub fn build_with(self, clock: &dyn Clock) -> ErrorRecord {
        ErrorRecord {
            reason: self.reason,
            supporting_data: self.supporting_data,
            agent: self.agent.unwrap_or_default(),
            timestamp: self.timestamp.unwrap_or_else(|| clock.now()),
            documentation_url: DOCUMENTATION_URL,
        }
    }
}

/// Anything that can describe itself as an error record.
///
/// Implementing this is all a new failure type needs to be encodable.
pub trait Reportable {
    /// Human-readable reason.
    fn reason(&self) -> String;

    /// Supporting fields in report order.
    fn supporting_data(&self) -> SupportingData;

    /// Build the record for this failure.
    fn to_record(&self, agent: &Agent, clock: &dyn Clock) -> ErrorRecord {
        ErrorRecord::builder(self.reason())
            .fields(self.supporting_data())
            .agent(agent.clone())
            .build_with(clock)
    }
}
