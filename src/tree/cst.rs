//! Lossless rowan view of a tag stream
//!
//! Every open/close pair becomes a rowan node whose kind is the interned node
//! type; literals become tokens. References and gaps are kept as zero-width
//! tokens so the tree text is exactly the consumed source.

use rowan::{GreenNode, GreenNodeBuilder};

use super::tags::Tag;
use crate::core::{KindInterner, SyntaxKind};

/// Language definition for Rowan
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagLanguage {}

impl rowan::Language for TagLanguage {
    type Kind = SyntaxKind;

    fn kind_from_raw(raw: rowan::SyntaxKind) -> Self::Kind {
        raw.into()
    }

    fn kind_to_raw(kind: Self::Kind) -> rowan::SyntaxKind {
        kind.into()
    }
}

/// Type aliases for convenience
pub type SyntaxNode = rowan::SyntaxNode<TagLanguage>;
pub type SyntaxToken = rowan::SyntaxToken<TagLanguage>;

/// Build a green tree rooted at a `DOCUMENT` node.
///
/// Unmatched close tags are ignored and unclosed nodes are closed at the end,
/// so any stream yields a tree.
pub fn build_green<'a>(
    tags: impl IntoIterator<Item = &'a Tag>,
    interner: &mut KindInterner,
) -> GreenNode {
    let mut builder = GreenNodeBuilder::new();
    let mut depth = 0usize;

    builder.start_node(SyntaxKind::DOCUMENT.into());
    for tag in tags {
        match tag {
            Tag::OpenNode(open) => {
                builder.start_node(interner.intern(&open.ty).into());
                depth += 1;
            }
            Tag::CloseNode if depth > 0 => {
                builder.finish_node();
                depth -= 1;
            }
            Tag::Literal(text) => builder.token(SyntaxKind::LITERAL.into(), text),
            Tag::Reference(_) => builder.token(SyntaxKind::REFERENCE.into(), ""),
            Tag::Gap => builder.token(SyntaxKind::GAP.into(), ""),
            _ => {}
        }
    }
    for _ in 0..depth {
        builder.finish_node();
    }
    builder.finish_node();
    builder.finish()
}

/// Build a rowan syntax tree for a tag stream.
pub fn build<'a>(tags: impl IntoIterator<Item = &'a Tag>, interner: &mut KindInterner) -> SyntaxNode {
    SyntaxNode::new_root(build_green(tags, interner))
}
