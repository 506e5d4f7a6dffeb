// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metadata-service transport failures and their classification.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What went wrong underneath an IMDS request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransportCause {
    /// Timed out while establishing the connection.
    ConnectTimeout,
    /// Timed out waiting for or reading the response.
    ReadTimeout,
    /// No connection could be made.
    Connection,
    /// Anything else, including non-success HTTP responses.
    Other,
}

/// A failed request to the instance metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, thiserror::Error)]
#[error("request to {url} failed: {detail}")]
pub struct ImdsRequestError {
    /// Underlying failure category.
    pub cause: TransportCause,
    /// Message from the HTTP client.
    pub detail: String,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Requested URL.
    pub url: String,
}

impl ImdsRequestError {
    /// A failure with no HTTP status.
    pub fn new(cause: TransportCause, detail: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            cause,
            detail: detail.into(),
            status: None,
            url: url.into(),
        }
    }

    /// Attach the HTTP status of the response.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Classify this failure for the report reason.
    pub fn classify(&self) -> ImdsFailureKind {
        ImdsFailureKind::of(self)
    }

    /// Build from a [`reqwest::Error`].
    ///
    /// `url` is used when the client error does not carry one.
    #[cfg(feature = "reqwest")]
    pub fn from_reqwest(error: &reqwest::Error, url: &str) -> Self {
        let cause = if error.is_connect() && error.is_timeout() {
            TransportCause::ConnectTimeout
        } else if error.is_timeout() {
            TransportCause::ReadTimeout
        } else if error.is_connect() {
            TransportCause::Connection
        } else {
            TransportCause::Other
        };
        Self {
            cause,
            detail: error.to_string(),
            status: error.status().map(|s| s.as_u16()),
            url: error.url().map_or_else(|| url.to_owned(), |u| u.to_string()),
        }
    }
}

/// Reason classification for an [`ImdsRequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImdsFailureKind {
    /// Connect-phase timeout.
    ConnectionTimeout,
    /// Response-phase timeout.
    ReadTimeout,
    /// Connection failure.
    ConnectionError,
    /// HTTP error response with the given status.
    Http(u16),
    /// None of the above.
    Unexpected,
}

impl ImdsFailureKind {
    /// Classify `error`. Timeouts and connection failures take precedence
    /// over any HTTP status.
    pub fn of(error: &ImdsRequestError) -> Self {
        match (error.cause, error.status) {
            (TransportCause::ConnectTimeout, _) => Self::ConnectionTimeout,
            (TransportCause::ReadTimeout, _) => Self::ReadTimeout,
            (TransportCause::Connection, _) => Self::ConnectionError,
            (TransportCause::Other, Some(code)) => Self::Http(code),
            (TransportCause::Other, None) => Self::Unexpected,
        }
    }
}

impl fmt::Display for ImdsFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionTimeout => f.write_str("connection timeout querying IMDS"),
            Self::ReadTimeout => f.write_str("read timeout querying IMDS"),
            Self::ConnectionError => f.write_str("connection error querying IMDS"),
            Self::Http(code) => write!(f, "http error {code} querying IMDS"),
            Self::Unexpected => f.write_str("unexpected error querying IMDS"),
        }
    }
}
