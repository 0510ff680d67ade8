/// Configuration problem found while binding sources.
/// Reported, never raised: the caller decides whether to carry on.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Diagnostic {
    #[error("All sources must have the same resolution (source 0: {expected:?}, source {source_index}: {found:?})")]
    ResolutionMismatch {
        expected: Option<u32>,
        found: Option<u32>,
        source_index: usize,
    },
}

/// Receiver for configuration diagnostics
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Sink that writes each diagnostic to the `log` facade at warn level
#[derive(Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
    }
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}
