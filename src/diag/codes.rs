//! Stable message ids forming this crate's diagnostic registry.
//!
//! Grouped by the phase that raises them. Ids are part of the external
//! contract (tooling and tests match on them), so never renumber or repurpose
//! one — add a new id instead.

// ---- Invocation --------------------------------------------------------
pub const MISSING_FILE: &str = "missing-file";
pub const DUPLICATE_FILE_NAME: &str = "duplicate-file-name";
pub const UNKNOWN_EXTENSION: &str = "unknown-extension";

// ---- Definition ----------------------------------------------------------
pub const DUPLICATE_DEFINITION: &str = "duplicate-definition";
pub const RESERVED_NAMESPACE_CDS: &str = "reserved-namespace-cds";
pub const RESERVED_NAMESPACE_LOCALIZED: &str = "reserved-namespace-localized";
pub const ILLEGAL_SUB_ARTIFACT: &str = "illegal-sub-artifact";

// ---- Extension -------------------------------------------------------
pub const EXTEND_UNDEFINED: &str = "extend-undefined";
pub const EXTEND_COLUMNS: &str = "extend-columns";
pub const EXTEND_FOR_GENERATED: &str = "extend-for-generated";
pub const EXTEND_REQ_ACTIONS_ONLY: &str = "extend-req-actions-only";
pub const EXTEND_UNRELATED_LAYER: &str = "extend-unrelated-layer";
pub const EXTEND_REPEATED_INTRALAYER: &str = "extend-repeated-intralayer";

// ---- Query / alias ------------------------------------------------------
pub const QUERY_REQ_ALIAS: &str = "query-req-alias";

// ---- Reference -------------------------------------------------------
pub const REF_UNDEFINED: &str = "ref-undefined";
pub const REF_UNDEFINED_TYPEOF: &str = "ref-undefined-typeof";
pub const CIRCULAR_TYPE_REFERENCE: &str = "circular-type-reference";
pub const INCONSISTENT_TARGET_ASPECT: &str = "inconsistent-target-aspect";

// ---- Shape -------------------------------------------------------------
pub const FOREIGN_KEYS_WITH_MANAGED_ASPECT: &str = "foreign-keys-with-managed-aspect";
pub const ON_CONDITION_ON_MANAGED_ASPECT: &str = "on-condition-on-managed-aspect";
pub const DEFAULT_ON_ENUM_OR_ASSOC: &str = "default-on-enum-or-assoc";
pub const ASPECT_COMPOSITION_CYCLE: &str = "aspect-composition-cycle";
pub const ASPECT_HAS_UP_ELEMENT: &str = "aspect-has-up-element";
pub const ASPECT_TARGET_NAME_EXISTS: &str = "aspect-target-name-exists";
pub const ASPECT_KEY_COLLISION: &str = "aspect-key-collision";

// ---- Late / info ---------------------------------------------------------
pub const ANNO_BUILTIN: &str = "anno-builtin";
pub const UNUSED_EXTENSION: &str = "unused-extension";
pub const TEXTS_ENTITY_EXISTS: &str = "texts-entity-exists";
pub const RECALCULATED_LOCALIZED: &str = "recalculated-localized";

// ---- I18n ----------------------------------------------------------------
pub const I18N_DIFFERENT_VALUE: &str = "i18n-different-value";

// ---- Syntax (tolerated, surfaced by the upstream parser) -----------------
pub const SYNTAX_DOLLAR_IDENT: &str = "syntax-dollar-ident";

// ---- Layer -----------------------------------------------------------
pub const USING_FROM_NOT_FOUND: &str = "using-from-not-found";
