//! Languages and grammars
//!
//! - [`Grammar`] - type classification, slot schema, emptyables
//! - [`Language`] - grammar plus dependencies and cooked-value hook
//! - [`Context`] - registry resolving language names and aliases

mod grammar;
mod registry;

pub use grammar::{Grammar, GrammarBuilder, GrammarError, NodeSchema, SlotKind, TypeKind};
pub use registry::{Context, CookFn, Language};
