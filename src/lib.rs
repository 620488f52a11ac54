//! # tagweave
//!
//! Speculative grammar-execution engine producing a universal tagged parse
//! tree.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! strategy  → Productions as Rust functions, Cx, one-call parse
//!   ↓
//! engine    → Evaluator: instructions, frames, states, lazy emission
//!   ↓
//! language  → Grammar schema, language registry, cooked-value hooks
//!   ↓
//! pattern   → Literal and regex patterns, lexical guards
//!   ↓
//! source    → Forkable character cursors with gaps
//!   ↓
//! tree      → Tags, persistent children, node arena, printer, rowan CST
//!   ↓
//! core      → Syntax kind interning for rowan
//!   ↓
//! base      → Primitives (Position, TextSize)
//! ```

// ============================================================================
// MODULES (dependency order: base → core → tree → source → pattern → language → engine → strategy)
// ============================================================================

/// Foundation types: Position, TextSize
pub mod base;

/// Syntax kind interning
pub mod core;

/// Tags, node arena, printer, CST
pub mod tree;

/// Source cursors
pub mod source;

/// Literal and regex patterns
pub mod pattern;

/// Grammars and the language registry
pub mod language;

/// The evaluator
pub mod engine;

/// Production tables and the parse entry point
pub mod strategy;

// Re-export commonly needed items
pub use engine::{
    Effects, Emitted, EngineError, ErrorKind, Evaluator, FrameOptions, Instruction, Options,
    Outcome, Program, PropertyMatcher, Script,
};
pub use language::{Context, Grammar, Language};
pub use pattern::Pattern;
pub use source::{Chr, Source, TextSource};
pub use strategy::{Cx, Halt, Parse, Strategy, parse};
pub use tree::{AttrValue, NodeView, Printer, ReferenceTag, Tag};

// Re-export foundation types
pub use base::{Position, TextRange, TextSize};
