// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporting-agent identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Product tag expected by consumers of the host diagnostic channel.
pub const DEFAULT_PRODUCT: &str = "Cloud-Init";

/// Supplies the version string embedded in the agent field.
pub trait VersionProvider {
    /// Version of the reporting software.
    fn version_string(&self) -> String;
}

/// Reports this package's own version.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageVersion;

impl VersionProvider for PackageVersion {
    fn version_string(&self) -> String {
        env!("CARGO_PKG_VERSION").to_owned()
    }
}

/// Identity of the software emitting reports, rendered as
/// `<product>/<version>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Product name.
    pub product: String,
    /// Product version.
    pub version: String,
}

impl Agent {
    /// Build an agent from explicit parts.
    pub fn new(product: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            product: product.into(),
            version: version.into(),
        }
    }

    /// Build an agent, asking `provider` for the version.
    pub fn from_provider(product: impl Into<String>, provider: &dyn VersionProvider) -> Self {
        Self::new(product, provider.version_string())
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::from_provider(DEFAULT_PRODUCT, &PackageVersion)
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.product, self.version)
    }
}
