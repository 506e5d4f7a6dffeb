// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations for the `pdr` CLI.
//!
//! These are plain functions over explicit inputs so they can be tested
//! without spawning the binary.

use anyhow::{Context, Result};
use pdr_config::{ReportConfig, validate_config};
use pdr_record::{Clock, ErrorRecord, FieldValue, NULL_SPELLING, SupportingData, encode};
use pdr_report::{ReportSink, Reporter, VmIdResolver};
use pdr_taxonomy::{ReportCategory, ReportCode};
use serde::Serialize;
use tracing::warn;

/// Validate the configuration, logging advisory warnings.
pub fn check_config(config: &ReportConfig) -> Result<()> {
    let warnings = validate_config(config).context("validate config")?;
    for w in warnings {
        warn!(%w, "config warning");
    }
    Ok(())
}

/// Split a `--field KEY=VALUE` argument.
pub fn parse_field(raw: &str) -> Result<(String, FieldValue)> {
    let (raw_key, raw_value) = raw
        .split_once('=')
        .with_context(|| format!("--field expects KEY=VALUE, got '{raw}'"))?;

    let key = raw_key.trim();
    if key.is_empty() {
        anyhow::bail!("--field key cannot be empty (got '{raw}')");
    }

    Ok((key.to_string(), parse_field_value(raw_value)))
}

/// Interpret a field value.
///
/// `None` is the null value. A number keeps its kind only when its
/// canonical rendering is exactly `raw`, so the report always carries the
/// text the caller passed (`5.10`, `007` and `+5` stay strings).
pub fn parse_field_value(raw: &str) -> FieldValue {
    if raw == NULL_SPELLING {
        return FieldValue::Null;
    }
    if let Some(i) = raw.parse::<i64>().ok().filter(|i| i.to_string() == raw) {
        return FieldValue::Int(i);
    }
    match raw.parse::<f64>() {
        Ok(x) if x.is_finite() && format!("{x:?}") == raw => FieldValue::Float(x),
        _ => FieldValue::Str(raw.to_string()),
    }
}

/// Build an error record from command-line inputs.
pub fn build_record(
    reason: &str,
    fields: &[String],
    config: &ReportConfig,
    clock: &dyn Clock,
) -> Result<ErrorRecord> {
    let data = fields
        .iter()
        .map(|f| parse_field(f))
        .collect::<Result<SupportingData>>()?;
    Ok(ErrorRecord::builder(reason)
        .fields(data)
        .agent(config.agent())
        .build_with(clock))
}

/// JSON view of an encoded failure.
#[derive(Debug, Serialize)]
pub struct ErrorOutput<'a> {
    /// The record that was encoded.
    pub record: &'a ErrorRecord,
    /// Instance identifier used.
    pub vm_id: String,
    /// The encoded line.
    pub line: String,
}

/// Encode `record` and either write the line to `sink` or print JSON.
pub fn emit_error<R, C, S>(
    reporter: &Reporter<R, C>,
    record: &ErrorRecord,
    sink: &mut S,
    json: bool,
) -> Result<()>
where
    R: VmIdResolver,
    C: Clock,
    S: ReportSink + ?Sized,
{
    if json {
        let vm_id = reporter.vm_id();
        let line = encode(record, &vm_id);
        let out = ErrorOutput { record, vm_id, line };
        let text = serde_json::to_string_pretty(&out).context("serialize report")?;
        println!("{text}");
        return Ok(());
    }
    if !reporter.report_record(sink, record) {
        anyhow::bail!("failed to write report");
    }
    Ok(())
}

/// Write a success line to `sink`.
pub fn emit_success<R, C, S>(reporter: &Reporter<R, C>, sink: &mut S) -> Result<()>
where
    R: VmIdResolver,
    C: Clock,
    S: ReportSink + ?Sized,
{
    if !reporter.report_success(sink) {
        anyhow::bail!("failed to write report");
    }
    Ok(())
}

/// One row of the `taxonomy` listing.
#[derive(Debug, Clone, Serialize)]
pub struct TaxonomyRow {
    /// Stable code.
    pub code: ReportCode,
    /// Code family.
    pub category: ReportCategory,
    /// Reason text with placeholders.
    pub reason: &'static str,
    /// Supporting field names in order.
    pub fields: &'static [&'static str],
}

/// Every taxonomy entry, in code order.
pub fn taxonomy_rows() -> Vec<TaxonomyRow> {
    ReportCode::ALL
        .iter()
        .map(|&code| TaxonomyRow {
            code,
            category: code.category(),
            reason: code.reason_template(),
            fields: code.supporting_fields(),
        })
        .collect()
}

/// Render the taxonomy as tab-separated text or JSON.
pub fn render_taxonomy(json: bool) -> Result<String> {
    let rows = taxonomy_rows();
    if json {
        return serde_json::to_string_pretty(&rows).context("serialize taxonomy");
    }
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            row.code,
            row.category,
            row.reason,
            row.fields.join(",")
        ));
    }
    Ok(out)
}
