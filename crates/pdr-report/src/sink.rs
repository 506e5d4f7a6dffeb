// SPDX-License-Identifier: MIT OR Apache-2.0

//! Destinations for encoded report lines.

use std::io::Write;

/// Errors a [`ReportSink`] can return.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink cannot accept reports right now.
    #[error("report sink unavailable: {0}")]
    Unavailable(String),

    /// The sink refused this particular line.
    #[error("report rejected by sink: {reason}")]
    Rejected {
        /// Why the line was refused.
        reason: String,
    },

    /// Writing to the underlying stream failed.
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport for encoded report lines.
pub trait ReportSink {
    /// Deliver one line.
    fn write_report(&mut self, line: &str) -> Result<(), SinkError>;
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn write_report(&mut self, line: &str) -> Result<(), SinkError> {
        (**self).write_report(line)
    }
}

/// Collects lines in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySink {
    lines: Vec<String>,
}

impl MemorySink {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines received so far, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines received.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether no line has been received.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Consume the sink, returning its lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl ReportSink for MemorySink {
    fn write_report(&mut self, line: &str) -> Result<(), SinkError> {
        self.lines.push(line.to_owned());
        Ok(())
    }
}

/// Writes each line, newline-terminated, to an [`std::io::Write`].
#[derive(Debug)]
pub struct WriterSink<W> {
    inner: W,
}

impl<W: Write> WriterSink<W> {
    /// Wrap `inner`.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the underlying writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> ReportSink for WriterSink<W> {
    fn write_report(&mut self, line: &str) -> Result<(), SinkError> {
        writeln!(self.inner, "{line}")?;
        self.inner.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_order() {
        let mut sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.write_report("a").unwrap();
        sink.write_report("b").unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.into_lines(), ["a", "b"]);
    }

    #[test]
    fn writer_sink_terminates_lines() {
        let mut sink = WriterSink::new(Vec::new());
        sink.write_report("result=success").unwrap();
        sink.write_report("x'y").unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "result=success\nx'y\n");
    }

    #[test]
    fn mut_ref_forwards() {
        fn deliver<S: ReportSink>(mut sink: S) {
            sink.write_report("line").unwrap();
        }
        let mut sink = MemorySink::new();
        deliver(&mut sink);
        assert_eq!(sink.lines(), ["line"]);
    }

    #[test]
    fn io_error_converts() {
        let err: SinkError = std::io::Error::other("disk full").into();
        assert!(matches!(err, SinkError::Io(_)));
        assert!(err.to_string().contains("disk full"));
    }
}
