use effectc_syntax::SourceLocation;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// The severity of a diagnostic.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Severity {
    /// Informational. Does not block packaging.
    Warning,
    /// Blocks packaging of the effect.
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => f.write_str("warning"),
            Severity::Error => f.write_str("error"),
        }
    }
}

/// A problem found in effect source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub location: SourceLocation,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}: {}", self.location, self.severity, self.message)
    }
}

/// Receives diagnostics.
///
/// Sinks are shared between effects compiled in parallel and must only ever append.
pub trait DiagnosticSink: Sync {
    fn report(&self, severity: Severity, location: SourceLocation, message: String);

    fn error(&self, location: SourceLocation, message: String) {
        self.report(Severity::Error, location, message)
    }

    fn warning(&self, location: SourceLocation, message: String) {
        self.report(Severity::Warning, location, message)
    }
}

/// An append-only list of diagnostics.
#[derive(Debug, Default)]
pub struct DiagnosticList {
    entries: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticList {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_entries<R>(&self, f: impl FnOnce(&mut Vec<Diagnostic>) -> R) -> R {
        // A poisoned list still holds every diagnostic appended before the panic.
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut entries)
    }

    pub fn len(&self) -> usize {
        self.with_entries(|entries| entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    fn count(&self, severity: Severity) -> usize {
        self.with_entries(|entries| entries.iter().filter(|d| d.severity == severity).count())
    }

    /// A copy of the diagnostics reported so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.with_entries(|entries| entries.clone())
    }

    /// Forward every diagnostic in this list to another sink, in report order.
    pub fn forward_to(&self, sink: &dyn DiagnosticSink) {
        for diagnostic in self.snapshot() {
            sink.report(diagnostic.severity, diagnostic.location, diagnostic.message);
        }
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl DiagnosticSink for DiagnosticList {
    fn report(&self, severity: Severity, location: SourceLocation, message: String) {
        self.with_entries(|entries| {
            entries.push(Diagnostic {
                severity,
                location,
                message,
            })
        })
    }
}

/// Forwards to another sink while counting errors.
pub(crate) struct ErrorCounter<'a> {
    inner: &'a dyn DiagnosticSink,
    errors: AtomicUsize,
}

impl<'a> ErrorCounter<'a> {
    pub fn new(inner: &'a dyn DiagnosticSink) -> Self {
        ErrorCounter {
            inner,
            errors: AtomicUsize::new(0),
        }
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::Relaxed)
    }
}

impl DiagnosticSink for ErrorCounter<'_> {
    fn report(&self, severity: Severity, location: SourceLocation, message: String) {
        if severity == Severity::Error {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
        self.inner.report(severity, location, message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn counts_by_severity() {
        let list = DiagnosticList::new();
        list.warning(SourceLocation::new(1, 1), "first".into());
        list.error(SourceLocation::new(2, 1), "second".into());
        assert_eq!(list.len(), 2);
        assert_eq!(list.warning_count(), 1);
        assert!(list.has_errors());

        let entries = list.into_vec();
        assert_eq!(entries[0].message, "first");
        assert_eq!(entries[1].to_string(), "2:1: error: second");
    }

    #[test]
    fn counter_forwards() {
        let list = DiagnosticList::new();
        let counter = ErrorCounter::new(&list);
        counter.warning(SourceLocation::default(), "w".into());
        counter.error(SourceLocation::default(), "e".into());
        assert_eq!(counter.errors(), 1);
        assert_eq!(list.len(), 2);
    }
}
