//! Message sink: structured diagnostics with severity, location, message id,
//! and substitution parameters. Deduplicates and raises a fatal error once a
//! phase boundary is crossed with unrecoverable messages pending.

pub mod codes;
mod message;
mod sink;

pub use message::{Message, Severity, ValidNames};
pub use sink::MessageSink;
