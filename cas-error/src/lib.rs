//! Contains the common [`ErrorKind`] trait used by all errors to display user-facing error
//! messages.
//!
//! Errors in the rewriting engine are raised while rules are being **built**, never while they are
//! being applied. The source code an error points into is therefore the human-readable description
//! of the offending rule, and the spans of an [`Error`] are byte ranges into that description.

use ariadne::{Color, Report, Source};
use std::{any::Any, fmt::{self, Debug}, ops::Range};

#[cfg(test)]
extern crate self as cas_error;

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur during some operation.
pub trait ErrorKind: Debug + Send {
    /// Returns the error as [`Any`], so callers can downcast to the concrete kind.
    fn as_any(&self) -> &dyn Any;

    /// The one-line message describing this error, without any source code attached.
    fn message(&self) -> String;

    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)>;
}

/// An error associated with regions of a source text that can be highlighted.
#[derive(Debug)]
pub struct Error {
    /// The text the spans point into.
    pub source: String,

    /// The regions of the source text that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given source text, spans, and kind.
    ///
    /// If no spans are given, the error points at the whole source text.
    pub fn new(
        source: impl Into<String>,
        mut spans: Vec<Range<usize>>,
        kind: impl ErrorKind + 'static,
    ) -> Self {
        let source = source.into();
        if spans.is_empty() {
            spans.push(0..source.len());
        }
        Self { source, spans, kind: Box::new(kind) }
    }

    /// Returns the kind of this error as the concrete type `T`, if it is one.
    pub fn downcast_ref<T: ErrorKind + 'static>(&self) -> Option<&T> {
        self.kind.as_any().downcast_ref()
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<(&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }

    /// Renders the report for this error into a string, including ANSI color codes.
    pub fn report_to_string(&self, src_id: &str) -> String {
        let mut buf = Vec::new();
        self.build_report(src_id)
            .write((src_id, Source::from(&self.source)), &mut buf)
            .expect("writing to a Vec cannot fail");
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Report this error to stderr.
    ///
    /// The `ariadne` crate's [`Report`] type actually does not have a `Display` implementation, so
    /// we can only use its `eprint` method to print to stderr.
    pub fn report_to_stderr(&self, src_id: &str) {
        // a closed stderr is not worth failing over
        let _ = self.build_report(src_id).eprint((src_id, Source::from(&self.source)));
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.message())
    }
}

impl std::error::Error for Error {}
