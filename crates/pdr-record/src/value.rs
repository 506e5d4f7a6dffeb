// SPDX-License-Identifier: MIT OR Apache-2.0

//! Supporting-field values and their canonical string forms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spelling used for a missing value on the wire.
pub const NULL_SPELLING: &str = "None";

/// A single supporting-field value.
///
/// [`Display`](fmt::Display) yields the canonical form written into the
/// report line: strings verbatim, integers in decimal, floats in their
/// shortest round-trip form (always with a fractional part or exponent),
/// and [`FieldValue::Null`] as [`NULL_SPELLING`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Free text.
    Str(String),
    /// Signed integer.
    Int(i64),
    /// Floating-point number.
    Float(f64),
    /// No value.
    Null,
}

impl FieldValue {
    /// Runtime type name reported alongside invalid values.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "str",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Null => "NoneType",
        }
    }

    /// Returns `true` for [`FieldValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            // Debug keeps the trailing ".0" on integral floats.
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Null => f.write_str(NULL_SPELLING),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        Self::Str(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<u16> for FieldValue {
    fn from(i: u16) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
