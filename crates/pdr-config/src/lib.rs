// SPDX-License-Identifier: MIT OR Apache-2.0
//! Configuration loading, validation, and merging for diagnostic reports.
//!
//! This crate provides [`ReportConfig`] — the agent identity and fallback
//! settings used when emitting reports — together with helpers for loading
//! from TOML files, merging overlays, and producing advisory
//! [`ConfigWarning`]s.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use pdr_record::{Agent, DEFAULT_PRODUCT, PackageVersion, VersionProvider, needs_quoting};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration loading or validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested configuration file was not found.
    #[error("config file not found: {path}")]
    FileNotFound {
        /// Path that was requested.
        path: String,
    },

    /// The file could not be parsed as valid TOML.
    #[error("failed to parse config: {reason}")]
    ParseError {
        /// Human-readable parse error detail.
        reason: String,
    },

    /// Semantic validation failed (one or more problems).
    #[error("config validation failed: {reasons:?}")]
    ValidationError {
        /// Individual validation failure messages.
        reasons: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Advisory-level issues that do not prevent operation but deserve attention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A recommended optional field is missing.
    MissingOptionalField {
        /// Name of the missing field.
        field: String,
        /// Why it matters.
        hint: String,
    },
    /// The product tag differs from the one host consumers expect.
    NonDefaultProduct {
        /// Configured product.
        product: String,
    },
    /// A value will be quoted on the wire.
    QuotedValue {
        /// Field holding the value.
        field: String,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::MissingOptionalField { field, hint } => {
                write!(f, "missing optional field '{field}': {hint}")
            }
            ConfigWarning::NonDefaultProduct { product } => {
                write!(
                    f,
                    "product '{product}' differs from '{DEFAULT_PRODUCT}'; host tooling may not recognise it"
                )
            }
            ConfigWarning::QuotedValue { field } => {
                write!(f, "'{field}' contains characters that force quoting in reports")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// Settings for the reporting glue.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct ReportConfig {
    /// Product tag of the agent field (defaults to [`DEFAULT_PRODUCT`]).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,

    /// Version of the agent field (defaults to the package version).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// `vm_id` used when the instance identifier cannot be resolved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_id_placeholder: Option<String>,

    /// Log level override (e.g. `"debug"`, `"info"`, `"warn"`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            product: None,
            version: None,
            vm_id_placeholder: None,
            log_level: Some("info".into()),
        }
    }
}

impl ReportConfig {
    /// Agent identity described by this config.
    pub fn agent(&self) -> Agent {
        let product = self.product.as_deref().unwrap_or(DEFAULT_PRODUCT);
        match &self.version {
            Some(version) => Agent::new(product, version.clone()),
            None => Agent::new(product, PackageVersion.version_string()),
        }
    }

    /// Placeholder `vm_id`, falling back to [`DEFAULT_VM_ID_PLACEHOLDER`].
    pub fn vm_id_placeholder(&self) -> &str {
        self.vm_id_placeholder
            .as_deref()
            .unwrap_or(DEFAULT_VM_ID_PLACEHOLDER)
    }

    /// Effective log level.
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// `vm_id` reported when the identifier cannot be resolved.
pub const DEFAULT_VM_ID_PLACEHOLDER: &str = "failed-to-get-vm-id";

/// Recognised log levels.
const VALID_LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load a [`ReportConfig`] from an optional TOML file path.
///
/// * If `path` is `Some`, reads and parses the file.
/// * If `path` is `None`, returns [`ReportConfig::default()`].
///
/// Environment variable overrides are applied on top in both cases.
pub fn load_config(path: Option<&Path>) -> Result<ReportConfig, ConfigError> {
    let mut config = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p).map_err(|_| ConfigError::FileNotFound {
                path: p.display().to_string(),
            })?;
            parse_toml(&content)?
        }
        None => ReportConfig::default(),
    };
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Parse a TOML string into a [`ReportConfig`].
pub fn parse_toml(content: &str) -> Result<ReportConfig, ConfigError> {
    toml::from_str::<ReportConfig>(content).map_err(|e| ConfigError::ParseError {
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Env overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides.
///
/// Recognised variables:
/// - `PDR_PRODUCT`
/// - `PDR_VERSION`
/// - `PDR_VM_ID_PLACEHOLDER`
/// - `PDR_LOG_LEVEL`
pub fn apply_env_overrides(config: &mut ReportConfig) {
    if let Ok(val) = std::env::var("PDR_PRODUCT") {
        config.product = Some(val);
    }
    if let Ok(val) = std::env::var("PDR_VERSION") {
        config.version = Some(val);
    }
    if let Ok(val) = std::env::var("PDR_VM_ID_PLACEHOLDER") {
        config.vm_id_placeholder = Some(val);
    }
    if let Ok(val) = std::env::var("PDR_LOG_LEVEL") {
        config.log_level = Some(val);
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a parsed configuration, returning advisory warnings.
///
/// Hard errors (malformed agent parts, empty placeholder, unknown log level)
/// are returned as a [`ConfigError::ValidationError`]; soft issues come back
/// as warnings.
pub fn validate_config(config: &ReportConfig) -> Result<Vec<ConfigWarning>, ConfigError> {
    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<ConfigWarning> = Vec::new();

    if let Some(level) = &config.log_level {
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            errors.push(format!("invalid log_level '{level}'"));
        }
    }

    if let Some(product) = &config.product {
        if product.trim().is_empty() {
            errors.push("product must not be empty".into());
        } else if product.contains(['/', '|']) || product.chars().any(char::is_whitespace) {
            errors.push(format!(
                "product '{product}' must not contain '/', '|' or whitespace"
            ));
        } else if product != DEFAULT_PRODUCT {
            warnings.push(ConfigWarning::NonDefaultProduct {
                product: product.clone(),
            });
        }
    }

    match &config.version {
        Some(version) if version.trim().is_empty() => {
            errors.push("version must not be empty".into());
        }
        Some(version) => {
            if needs_quoting(version) {
                warnings.push(ConfigWarning::QuotedValue {
                    field: "version".into(),
                });
            }
        }
        None => warnings.push(ConfigWarning::MissingOptionalField {
            field: "version".into(),
            hint: "the agent field will carry the package version".into(),
        }),
    }

    if let Some(placeholder) = &config.vm_id_placeholder {
        if placeholder.trim().is_empty() {
            errors.push("vm_id_placeholder must not be empty".into());
        } else if needs_quoting(placeholder) {
            warnings.push(ConfigWarning::QuotedValue {
                field: "vm_id_placeholder".into(),
            });
        }
    }

    if errors.is_empty() {
        Ok(warnings)
    } else {
        Err(ConfigError::ValidationError { reasons: errors })
    }
}

// ---------------------------------------------------------------------------
// Merging
// ---------------------------------------------------------------------------

/// Merge two configurations.  Values in `overlay` take precedence over `base`.
pub fn merge_configs(base: ReportConfig, overlay: ReportConfig) -> ReportConfig {
    ReportConfig {
        product: overlay.product.or(base.product),
        version: overlay.version.or(base.version),
        vm_id_placeholder: overlay.vm_id_placeholder.or(base.vm_id_placeholder),
        log_level: overlay.log_level.or(base.log_level),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
