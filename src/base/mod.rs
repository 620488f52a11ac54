//! Foundation types for the engine.
//!
//! - [`Position`] - Line/column positions for error context
//! - [`offset_size`] - offset conversion into [`TextSize`]
//!
//! This module has NO dependencies on other tagweave modules.

mod position;

pub use position::{Position, offset_size};

// Re-export text-size types for convenience
pub use text_size::{TextRange, TextSize};
