// SPDX-License-Identifier: MIT OR Apache-2.0
//! Reporting glue around the record encoder.
//!
//! A [`Reporter`] owns the agent identity, a [`VmIdResolver`] and a
//! [`Clock`]. It turns failures into encoded lines, substitutes a
//! placeholder `vm_id` when the identifier cannot be resolved, and forwards
//! lines to a [`ReportSink`] without letting sink failures escape.
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use pdr_record::{Agent, FixedClock};
//! use pdr_report::{MemorySink, Reporter, StaticVmId};
//! use pdr_taxonomy::ReportableError;
//!
//! let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
//! let reporter = Reporter::new(StaticVmId::new("vm-1"), clock)
//!     .with_agent(Agent::new("Cloud-Init", "24.1"));
//!
//! let mut sink = MemorySink::new();
//! assert!(reporter.report_failure(&mut sink, &ReportableError::dhcp_interface_not_found(1.5)));
//! assert!(sink.lines()[0].starts_with("result=error|reason=failure to find DHCP interface|"));
//! ```
#![deny(unsafe_code)]
#![warn(missing_docs)]

mod resolve;
mod sink;

pub use pdr_config::DEFAULT_VM_ID_PLACEHOLDER;
pub use resolve::{ResolveError, StaticVmId, UnknownVmId, VmIdResolver};
pub use sink::{MemorySink, ReportSink, SinkError, WriterSink};

use pdr_config::ReportConfig;
use pdr_record::{Agent, Clock, ErrorRecord, Reportable, encode, encode_fields, format_timestamp};
use tracing::{debug, warn};

/// Builds and delivers report lines.
#[derive(Debug, Clone)]
pub struct Reporter<R, C> {
    agent: Agent,
    resolver: R,
    clock: C,
    placeholder: String,
}

impl<R: VmIdResolver, C: Clock> Reporter<R, C> {
    /// A reporter with the default agent and placeholder.
    pub fn new(resolver: R, clock: C) -> Self {
        Self {
            agent: Agent::default(),
            resolver,
            clock,
            placeholder: DEFAULT_VM_ID_PLACEHOLDER.to_owned(),
        }
    }

    /// A reporter whose agent and placeholder come from `config`.
    pub fn from_config(config: &ReportConfig, resolver: R, clock: C) -> Self {
        Self {
            agent: config.agent(),
            resolver,
            clock,
            placeholder: config.vm_id_placeholder().to_owned(),
        }
    }

    /// Override the agent.
    #[must_use]
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agent = agent;
        self
    }

    /// Override the `vm_id` used when resolution fails.
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Reporting agent.
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Placeholder `vm_id`.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Resolve the instance identifier, falling back to the placeholder.
    pub fn vm_id(&self) -> String {
        match self.resolver.resolve() {
            Ok(id) => id,
            Err(err) => {
                warn!(error = %err, placeholder = %self.placeholder, "failed to resolve vm id");
                self.placeholder.clone()
            }
        }
    }

    /// Build a record for `failure` using this reporter's agent and clock.
    pub fn record<E: Reportable + ?Sized>(&self, failure: &E) -> ErrorRecord {
        failure.to_record(&self.agent, &self.clock)
    }

    /// Encoded error line for `failure`.
    pub fn failure_report<E: Reportable + ?Sized>(&self, failure: &E) -> String {
        self.record_report(&self.record(failure))
    }

    /// Encoded error line for an already built record.
    pub fn record_report(&self, record: &ErrorRecord) -> String {
        let line = encode(record, &self.vm_id());
        debug!(reason = record.reason(), len = line.len(), "encoded failure report");
        line
    }

    /// Encoded success line.
    pub fn success_report(&self) -> String {
        let fields = [
            "result=success".to_owned(),
            format!("agent={}", self.agent),
            format!("timestamp={}", format_timestamp(self.clock.now())),
            format!("vm_id={}", self.vm_id()),
        ];
        let line = encode_fields(fields);
        debug!(len = line.len(), "encoded success report");
        line
    }

    /// Encode `failure` and hand it to `sink`.
    ///
    /// Returns whether the sink accepted the line.
    pub fn report_failure<S, E>(&self, sink: &mut S, failure: &E) -> bool
    where
        S: ReportSink + ?Sized,
        E: Reportable + ?Sized,
    {
        let line = self.failure_report(failure);
        deliver(sink, &line)
    }

    /// Encode `record` and hand it to `sink`.
    pub fn report_record<S: ReportSink + ?Sized>(
        &self,
        sink: &mut S,
        record: &ErrorRecord,
    ) -> bool {
        let line = self.record_report(record);
        deliver(sink, &line)
    }

    /// Encode a success line and hand it to `sink`.
    pub fn report_success<S: ReportSink + ?Sized>(&self, sink: &mut S) -> bool {
        let line = self.success_report();
        deliver(sink, &line)
    }
}

fn deliver<S: ReportSink + ?Sized>(sink: &mut S, line: &str) -> bool {
    match sink.write_report(line) {
        Ok(()) => true,
        Err(err) => {
            warn!(error = %err, "failed to deliver report");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pdr_record::{FieldValue, FixedClock};
    use pdr_taxonomy::ReportableError;

    fn clock() -> FixedClock {
        FixedClock::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
    }

    fn agent() -> Agent {
        Agent::new("Cloud-Init", "24.1")
    }

    struct FailingSink;

    impl ReportSink for FailingSink {
        fn write_report(&mut self, _line: &str) -> Result<(), SinkError> {
            Err(SinkError::Unavailable("channel closed".into()))
        }
    }

    #[test]
    fn resolved_vm_id_is_used() {
        let reporter = Reporter::new(StaticVmId::new("vm-1"), clock());
        assert_eq!(reporter.vm_id(), "vm-1");
    }

    #[test]
    fn unresolved_vm_id_falls_back_to_placeholder() {
        let reporter = Reporter::new(UnknownVmId, clock());
        assert_eq!(reporter.vm_id(), DEFAULT_VM_ID_PLACEHOLDER);
        let reporter = reporter.with_placeholder("unknown");
        assert_eq!(reporter.vm_id(), "unknown");
    }

    #[test]
    fn failure_report_encodes_variant() {
        let reporter = Reporter::new(StaticVmId::new("vm-1"), clock()).with_agent(agent());
        let line = reporter.failure_report(&ReportableError::imds_invalid_metadata(
            "compute",
            FieldValue::Null,
        ));
        assert_eq!(
            line,
            "result=error|reason=invalid IMDS metadata for key=compute|agent=Cloud-Init/24.1\
             |key=compute|value=None|type=NoneType|vm_id=vm-1\
             |timestamp=2024-05-01T12:00:00.000000+00:00\
             |documentation_url=https://aka.ms/linuxprovisioningerror"
        );
    }

    #[test]
    fn success_report_layout() {
        let reporter = Reporter::new(UnknownVmId, clock()).with_agent(agent());
        assert_eq!(
            reporter.success_report(),
            "result=success|agent=Cloud-Init/24.1\
             |timestamp=2024-05-01T12:00:00.000000+00:00|vm_id=failed-to-get-vm-id"
        );
    }

    #[test]
    fn success_report_quotes_odd_vm_id() {
        let reporter = Reporter::new(StaticVmId::new("vm'1"), clock()).with_agent(agent());
        assert!(reporter.success_report().ends_with("|'vm_id=vm''1'"));
    }

    #[test]
    fn record_report_reuses_timestamp() {
        let reporter = Reporter::new(StaticVmId::new("vm-1"), clock());
        let record = reporter.record(&ReportableError::proxy_agent_not_found());
        assert_eq!(reporter.record_report(&record), reporter.record_report(&record));
    }

    #[test]
    fn sink_receives_lines() {
        let reporter = Reporter::new(StaticVmId::new("vm-1"), clock());
        let mut sink = MemorySink::new();
        assert!(reporter.report_failure(&mut sink, &ReportableError::dhcp_lease(5.6, "eth0")));
        assert!(reporter.report_success(&mut sink));
        assert_eq!(sink.len(), 2);
        assert!(sink.lines()[0].starts_with("result=error|"));
        assert!(sink.lines()[1].starts_with("result=success|"));
    }

    #[test]
    fn sink_failure_is_reported_as_false() {
        let reporter = Reporter::new(StaticVmId::new("vm-1"), clock());
        assert!(!reporter.report_failure(
            &mut FailingSink,
            &ReportableError::proxy_agent_not_found()
        ));
        assert!(!reporter.report_success(&mut FailingSink));
    }

    #[test]
    fn from_config_uses_agent_and_placeholder() {
        let config = ReportConfig {
            product: Some("Cloud-Init".into()),
            version: Some("9.9".into()),
            vm_id_placeholder: Some("no-vm".into()),
            log_level: None,
        };
        let reporter = Reporter::from_config(&config, UnknownVmId, clock());
        assert_eq!(reporter.agent().to_string(), "Cloud-Init/9.9");
        assert_eq!(reporter.placeholder(), "no-vm");
        assert!(reporter.success_report().ends_with("|vm_id=no-vm"));
    }
}
