//! Reserved-namespace rules.
//!
//! Definitions in reserved namespaces fail ingest with a stable message id
//! (`reserved-namespace-cds` / `reserved-namespace-localized`), except for
//! the `cds.foundation` subtree, which is allowed.

/// Namespace prefixes that cannot be used for user-authored top-level
/// artifacts.
const RESERVED_PREFIXES: &[&str] = &["cds", "localized"];

/// Subtrees under a reserved prefix that are explicitly carved out and
/// remain addressable.
const RESERVED_PREFIX_EXCEPTIONS: &[&str] = &["cds.foundation"];

/// Returns `true` if `absolute_name` falls under a reserved namespace and
/// is not covered by an exception.
pub fn is_reserved_namespace(absolute_name: &str) -> bool {
    let under_reserved = RESERVED_PREFIXES
        .iter()
        .any(|prefix| is_prefix_of(prefix, absolute_name));
    if !under_reserved {
        return false;
    }
    !RESERVED_PREFIX_EXCEPTIONS
        .iter()
        .any(|exception| is_prefix_of(exception, absolute_name))
}

fn is_prefix_of(prefix: &str, name: &str) -> bool {
    name == prefix || name.starts_with(&format!("{prefix}."))
}

/// Predefined scalar types: these
/// never have a [`crate::model::Node`] of their own, so a `type`/`target`
/// reference naming one resolves as "known builtin, no definition to link
/// to" rather than `ref-undefined`.
const BUILTIN_SCALAR_TYPES: &[&str] = &[
    "cds.UUID",
    "cds.Boolean",
    "cds.Integer",
    "cds.Integer64",
    "cds.Int16",
    "cds.Int32",
    "cds.Int64",
    "cds.UInt8",
    "cds.Decimal",
    "cds.DecimalFloat",
    "cds.Double",
    "cds.Date",
    "cds.Time",
    "cds.DateTime",
    "cds.Timestamp",
    "cds.String",
    "cds.LargeString",
    "cds.Binary",
    "cds.LargeBinary",
    "cds.Vector",
    "cds.Map",
    "cds.Association",
    "cds.Composition",
];

pub fn is_builtin_scalar_type(name: &str) -> bool {
    BUILTIN_SCALAR_TYPES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cds_namespace_is_reserved() {
        assert!(is_reserved_namespace("cds"));
        assert!(is_reserved_namespace("cds.String"));
    }

    #[test]
    fn cds_foundation_is_exempt() {
        assert!(!is_reserved_namespace("cds.foundation"));
        assert!(!is_reserved_namespace("cds.foundation.Currency"));
    }

    #[test]
    fn localized_namespace_is_reserved() {
        assert!(is_reserved_namespace("localized"));
        assert!(is_reserved_namespace("localized.data"));
    }

    #[test]
    fn unrelated_namespace_is_not_reserved() {
        assert!(!is_reserved_namespace("my.app.Books"));
        assert!(!is_reserved_namespace("cdsish.Thing"));
    }
}
