//! Reserved-namespace checks at ingest time.

use crate::base::{FileId, Span, is_reserved_namespace};
use crate::diag::{Message, codes};

/// Returns the message id to raise for `absolute_name`, if any.
pub fn check(absolute_name: &str) -> Option<&'static str> {
    if !is_reserved_namespace(absolute_name) {
        return None;
    }
    if absolute_name == "localized" || absolute_name.starts_with("localized.") {
        Some(codes::RESERVED_NAMESPACE_LOCALIZED)
    } else {
        Some(codes::RESERVED_NAMESPACE_CDS)
    }
}

pub fn diagnostic(absolute_name: &str, file: FileId, span: Span) -> Option<Message> {
    check(absolute_name).map(|code| {
        Message::error(
            code,
            file,
            span,
            format!("'{absolute_name}' is in a reserved namespace"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_cds_namespace_is_flagged() {
        assert_eq!(check("cds.T"), Some(codes::RESERVED_NAMESPACE_CDS));
    }

    #[test]
    fn cds_foundation_is_not_flagged() {
        assert_eq!(check("cds.foundation.Currency"), None);
    }

    #[test]
    fn localized_namespace_uses_its_own_code() {
        assert_eq!(check("localized.Books"), Some(codes::RESERVED_NAMESPACE_LOCALIZED));
    }
}
