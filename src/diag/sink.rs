use rustc_hash::FxHashSet;

use super::message::{DedupKey, Message, Severity};

/// Append-only diagnostic sink.
///
/// Messages accumulate across a phase; [`MessageSink::sort_and_dedup`] is
/// called once per invocation (not per phase) so that final message order is
/// deterministic regardless of which pass happened to emit a duplicate
/// first, keeping diagnostic ordering stable across runs.
#[derive(Debug, Default)]
pub struct MessageSink {
    messages: Vec<Message>,
    seen: FxHashSet<DedupKey>,
}

impl MessageSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `message` unless an identical `(file, line, col, code)` was
    /// already recorded.
    pub fn push(&mut self, message: Message) {
        if self.seen.insert(message.dedup_key()) {
            tracing::trace!(code = message.code, "diagnostic recorded");
            self.messages.push(message);
        }
    }

    pub fn error_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.severity == Severity::Error)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Sorts by `(file, line, col)` for a deterministic rendering order,
    /// independent of emission order across phases.
    pub fn sort_and_dedup(&mut self) {
        self.messages.sort_by(|a, b| {
            (a.file, a.span.start.line, a.span.start.column, a.code).cmp(&(
                b.file,
                b.span.start.line,
                b.span.start.column,
                b.code,
            ))
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Raises a fatal [`crate::CompileError`] if any error-severity message
    /// has been recorded; used at phase boundaries to enforce a "fatal
    /// threshold" propagation policy.
    pub fn check_fatal(&mut self) -> Result<(), Vec<Message>> {
        if self.has_errors() {
            self.sort_and_dedup();
            Err(self.messages.clone())
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileId, Span};

    fn file() -> FileId {
        let mut table = crate::base::FileTable::new();
        table.intern("a.cds")
    }

    #[test]
    fn duplicate_diagnostics_at_the_same_location_are_collapsed() {
        let mut sink = MessageSink::new();
        let f = file();
        let span = Span::point(crate::base::Position::new(0, 0));
        sink.push(Message::error("duplicate-definition", f, span, "first"));
        sink.push(Message::error("duplicate-definition", f, span, "second"));
        assert_eq!(sink.messages().len(), 1);
    }

    #[test]
    fn check_fatal_only_trips_on_errors() {
        let mut sink = MessageSink::new();
        let f = file();
        let span = Span::point(crate::base::Position::new(0, 0));
        sink.push(Message::warning("extend-unrelated-layer", f, span, "w"));
        assert!(sink.check_fatal().is_ok());
        sink.push(Message::error("ref-undefined", f, span, "e"));
        assert!(sink.check_fatal().is_err());
    }
}
