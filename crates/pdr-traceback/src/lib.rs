// SPDX-License-Identifier: MIT OR Apache-2.0
//! Summary-first backtraces for the diagnostic channel.
//!
//! The host channel may truncate long values, so a captured trace is
//! reordered to put the most useful content first:
//!
//! ```text
//!
//! ParseIntError: invalid digit found in string
//! Caused by: ...
//!    0: my_crate::provision
//!              at ./src/lib.rs:10:5
//!    ...
//! stack backtrace:
//! ```
//!
//! That is: a blank line, the `<Type>: <message>` summary, the source chain,
//! the frames in their original order, and finally the generic
//! [`BACKTRACE_HEADER`]. The text is then base64-encoded so it survives the
//! report quoting rules untouched.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use tracing::debug;

/// Header line normally printed before the frames.
pub const BACKTRACE_HEADER: &str = "stack backtrace:";

/// Frame section used when no frames could be captured.
pub const UNAVAILABLE_FRAMES: &str = "<backtrace unavailable>";

/// A captured, reorderable backtrace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Traceback {
    summary: String,
    causes: Vec<String>,
    frames: Vec<String>,
}

impl Traceback {
    /// Capture the current stack for `error`.
    ///
    /// Capture is forced regardless of `RUST_BACKTRACE`.
    pub fn capture<E: Error + ?Sized>(error: &E) -> Self {
        Self::with_backtrace(error, &Backtrace::force_capture())
    }

    /// Build a traceback for `error` from an already captured backtrace.
    pub fn with_backtrace<E: Error + ?Sized>(error: &E, backtrace: &Backtrace) -> Self {
        let frames = match backtrace.status() {
            BacktraceStatus::Captured => backtrace
                .to_string()
                .lines()
                .filter(|l| !l.trim().is_empty() && l.trim() != BACKTRACE_HEADER)
                .map(str::to_owned)
                .collect(),
            status => {
                debug!(?status, "no backtrace frames available");
                Vec::new()
            }
        };
        Self::from_parts(summary_line(error), source_chain(error), frames)
    }

    /// Assemble a traceback from already rendered pieces.
    pub fn from_parts(
        summary: impl Into<String>,
        causes: Vec<String>,
        frames: Vec<String>,
    ) -> Self {
        Self {
            summary: summary.into(),
            causes,
            frames,
        }
    }

    /// The `<Type>: <message>` line.
    pub fn summary(&self) -> &str {
        &self.summary
    }

    /// Messages of the error's source chain, outermost first.
    pub fn causes(&self) -> &[String] {
        &self.causes
    }

    /// Frame lines in capture order.
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Render the reordered, multi-line text.
    pub fn render(&self) -> String {
        let mut text = String::from("\n");
        text.push_str(&self.summary);
        text.push('\n');
        for cause in &self.causes {
            text.push_str("Caused by: ");
            text.push_str(cause);
            text.push('\n');
        }
        if self.frames.is_empty() {
            text.push_str(UNAVAILABLE_FRAMES);
            text.push('\n');
        }
        for frame in &self.frames {
            text.push_str(frame);
            text.push('\n');
        }
        text.push_str(BACKTRACE_HEADER);
        text
    }

    /// Base64 of [`render`](Self::render).
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.render())
    }
}

/// Capture and encode a traceback for `error` in one step.
pub fn capture_traceback<E: Error + ?Sized>(error: &E) -> String {
    Traceback::capture(error).to_base64()
}

/// `<Type>: <message>` for `error`.
///
/// For a trait object (`&dyn Error`, as handed out by `Box<dyn Error>` or
/// `anyhow::Error::as_ref`) the static type says nothing, so the name is
/// read from the leading identifier of the `Debug` rendering instead. When
/// that rendering does not start with one (a boxed `String`, say) the name
/// falls back to `Error`.
pub fn summary_line<E: Error + ?Sized>(error: &E) -> String {
    format!("{}: {error}", type_label(error))
}

fn type_label<E: Error + ?Sized>(error: &E) -> String {
    if std::any::type_name::<E>().starts_with("dyn ") {
        let debug = format!("{error:?}");
        let ident: String = debug
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == '_')
            .collect();
        if ident.starts_with(|c: char| c.is_ascii_uppercase()) {
            return ident;
        }
    }
    short_type_name::<E>().to_owned()
}

/// Unqualified name of `T`: `core::num::error::ParseIntError` becomes
/// `ParseIntError`, `dyn core::error::Error + Send` becomes `Error`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let head = full.strip_prefix("dyn ").unwrap_or(full);
    let head = head.split(" + ").next().unwrap_or(head);
    let head = head.split('<').next().unwrap_or(head);
    head.rsplit("::").next().unwrap_or(head)
}

fn source_chain<E: Error + ?Sized>(error: &E) -> Vec<String> {
    let mut causes = Vec::new();
    let mut next = error.source();
    while let Some(cause) = next {
        causes.push(cause.to_string());
        next = cause.source();
    }
    causes
}
