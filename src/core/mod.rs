//! Shared low-level utilities: string interning.

pub mod interner;

pub use interner::{IStr, Interner};
