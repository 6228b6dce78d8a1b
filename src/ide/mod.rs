//! Editor probe: thin wrappers over the compiler's own diagnostics for an
//! editor's `complete`/`find`/`lint` commands. `line`/`col` are 1-based,
//! matching this crate's CLI convention.
//!
//! Node spans aren't tracked anywhere in [`crate::model`] (only diagnostic
//! locations are), so `complete`/`find` work by matching a diagnostic at the
//! requested position rather than by re-deriving a cursor-to-node index —
//! consistent with this module's explicitly reduced scope.

use tracing::debug;

use crate::base::{FileId, Position};
use crate::diag::Message;

#[derive(Debug, Clone, Default)]
pub struct CompletionResult {
    pub expected_tokens: Vec<String>,
    pub valid_names: Vec<String>,
}

/// Reports `expectedTokens`/`validNames` from the diagnostic whose span
/// starts at `(line, col)` in `file`, if any.
pub fn complete(messages: &[Message], file: FileId, line: usize, col: usize) -> CompletionResult {
    let pos = Position::new(line.saturating_sub(1), col.saturating_sub(1));
    debug!(?file, line, col, "editor probe: complete");
    let Some(hit) = messages.iter().find(|m| m.file == file && m.span.start == pos) else {
        return CompletionResult::default();
    };
    CompletionResult {
        expected_tokens: vec![hit.code.to_string()],
        valid_names: hit
            .valid_names
            .as_ref()
            .map(|v| v.names.iter().map(|n| n.to_string()).collect())
            .unwrap_or_default(),
    }
}

#[derive(Debug, Clone)]
pub struct FindResult {
    pub home: crate::model::NodeId,
}

/// Goto-definition: the `home` artifact of the diagnostic located at
/// `(line, col)` in `file`, if the compiler recorded one.
pub fn find(messages: &[Message], file: FileId, line: usize, col: usize) -> Option<FindResult> {
    let pos = Position::new(line.saturating_sub(1), col.saturating_sub(1));
    debug!(?file, line, col, "editor probe: find");
    messages
        .iter()
        .find(|m| m.file == file && m.span.start == pos)
        .and_then(|m| m.home)
        .map(|home| FindResult { home })
}

/// Every diagnostic in `file`, rendered the same way the CLI renders them
/// (the `lint` command). Callers compile with `lint_mode` set so the model
/// is still produced for sources with unresolved references.
pub fn lint(messages: &[Message], files: &crate::base::FileTable, file: FileId) -> Vec<String> {
    debug!(?file, "editor probe: lint");
    let file_name = files
        .path(file)
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|| "<unknown>".to_string());
    messages.iter().filter(|m| m.file == file).map(|m| m.render(&file_name)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::{FileTable, Span};
    use crate::diag::codes;

    #[test]
    fn complete_reports_valid_names_at_the_cursor() {
        let file = FileId::SYNTHETIC;
        let msg = Message::error(codes::REF_UNDEFINED, file, Span::point(Position::new(2, 4)), "'Foo' is not defined")
            .with_valid_names(vec![std::rc::Rc::from("Books"), std::rc::Rc::from("Authors")]);
        let result = complete(&[msg], file, 3, 5);
        assert_eq!(result.valid_names, vec!["Books".to_string(), "Authors".to_string()]);
    }

    #[test]
    fn lint_renders_only_diagnostics_for_the_requested_file() {
        let mut files = FileTable::new();
        let file = files.intern("books.cds");
        let other = files.intern("authors.cds");
        let a = Message::error(codes::REF_UNDEFINED, file, Span::point(Position::new(0, 0)), "boom");
        let b = Message::error(codes::REF_UNDEFINED, other, Span::point(Position::new(0, 0)), "boom2");
        let rendered = lint(&[a, b], &files, file);
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].contains("books.cds"));
    }
}
