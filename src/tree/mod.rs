//! Tree storage and tag model
//!
//! ```text
//! tags      → Tag, attribute values, reference flavors
//! sequence  → PersistentSeq (structurally shared children)
//! node      → Tree arena, fork/merge, NodeView
//! print     → text rendering of a tag stream
//! cst       → lossless rowan view of a tag stream
//! ```

pub mod cst;
mod node;
mod print;
mod sequence;
mod tags;

pub use node::{NodeId, NodeView, Tree, TreeError};
pub use print::Printer;
pub use sequence::{Iter, PersistentSeq};
pub use tags::{
    AttrValue, Attributes, COOKED_ATTRIBUTE, COOKED_REFERENCE, DoctypeTag, NodeFlags,
    OpenNodeTag, ReferenceFlags, ReferenceTag, Tag, TagKind, source_len,
};
