//! Tag model
//!
//! Tags are the universal, immutable events a parse is expressed in. A node's
//! children are a sequence of tags; the engine's output is a flat, well-nested
//! tag stream in document order.

use indexmap::IndexMap;
use smol_str::SmolStr;

use super::node::NodeId;

/// Name of the reference slot whose node receives a cooked value on close.
pub const COOKED_REFERENCE: &str = "@";

/// Attribute key the cooked value is bound under.
pub const COOKED_ATTRIBUTE: &str = "cooked";

/// Ordered attribute map carried by open tags.
pub type Attributes = IndexMap<SmolStr, AttrValue>;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    Bool(bool),
    String(SmolStr),
    Null,
}

impl AttrValue {
    /// JavaScript-like truthiness: `false`, `null` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Bool(b) => *b,
            AttrValue::String(s) => !s.is_empty(),
            AttrValue::Null => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::String(value.into())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::String(value.into())
    }
}

impl From<Option<String>> for AttrValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(AttrValue::Null, AttrValue::from)
    }
}

/// Flags carried by an open tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeFlags {
    /// The node is a token: its children are literals, not child nodes.
    pub token: bool,
    /// The node is trivia (whitespace, comments).
    pub trivia: bool,
    /// The node contains a gap somewhere in its subtree.
    pub has_gap: bool,
}

impl NodeFlags {
    pub const TOKEN: NodeFlags = NodeFlags {
        token: true,
        trivia: false,
        has_gap: false,
    };
}

/// Flags carried by a reference tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceFlags {
    /// The slot holds a grammar-expression result rather than lexically
    /// intrinsic content.
    pub expression: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DoctypeTag {
    pub language: SmolStr,
    pub attributes: Attributes,
}

impl DoctypeTag {
    pub fn new(language: impl Into<SmolStr>) -> Self {
        Self {
            language: language.into(),
            attributes: Attributes::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpenNodeTag {
    pub flags: NodeFlags,
    pub language: SmolStr,
    pub ty: SmolStr,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReferenceTag {
    pub name: SmolStr,
    pub is_array: bool,
    pub flags: ReferenceFlags,
}

impl ReferenceTag {
    pub fn new(name: impl Into<SmolStr>) -> Self {
        Self {
            name: name.into(),
            is_array: false,
            flags: ReferenceFlags::default(),
        }
    }

    pub fn array(name: impl Into<SmolStr>) -> Self {
        Self {
            is_array: true,
            ..Self::new(name)
        }
    }

    pub fn cooked() -> Self {
        Self::new(COOKED_REFERENCE)
    }

    pub fn expression(mut self) -> Self {
        self.flags.expression = true;
        self
    }

    /// Intrinsic references point at lexical content rather than at the
    /// result of a grammar expression.
    pub fn is_intrinsic(&self) -> bool {
        !self.flags.expression
    }

    pub fn is_cooked(&self) -> bool {
        self.name == COOKED_REFERENCE
    }
}

/// A parse event.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Tag {
    Doctype(DoctypeTag),
    OpenNode(OpenNodeTag),
    CloseNode,
    Literal(SmolStr),
    Gap,
    Reference(ReferenceTag),
    Shift,
    EmbeddedNode(NodeId),
    Null,
    ArrayInitializer,
}

impl Tag {
    pub fn literal(text: impl Into<SmolStr>) -> Self {
        Tag::Literal(text.into())
    }

    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Doctype(_) => TagKind::Doctype,
            Tag::OpenNode(_) => TagKind::OpenNode,
            Tag::CloseNode => TagKind::CloseNode,
            Tag::Literal(_) => TagKind::Literal,
            Tag::Gap => TagKind::Gap,
            Tag::Reference(_) => TagKind::Reference,
            Tag::Shift => TagKind::Shift,
            Tag::EmbeddedNode(_) => TagKind::EmbeddedNode,
            Tag::Null => TagKind::Null,
            Tag::ArrayInitializer => TagKind::ArrayInitializer,
        }
    }

    /// Number of source positions the tag accounts for.
    pub fn source_len(&self) -> usize {
        match self {
            Tag::Literal(text) => text.chars().count(),
            Tag::Gap => 1,
            _ => 0,
        }
    }
}

/// Discriminant of a [`Tag`], used in diagnostics and tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Doctype,
    OpenNode,
    CloseNode,
    Literal,
    Gap,
    Reference,
    Shift,
    EmbeddedNode,
    Null,
    ArrayInitializer,
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TagKind::Doctype => "Doctype",
            TagKind::OpenNode => "OpenNode",
            TagKind::CloseNode => "CloseNode",
            TagKind::Literal => "Literal",
            TagKind::Gap => "Gap",
            TagKind::Reference => "Reference",
            TagKind::Shift => "Shift",
            TagKind::EmbeddedNode => "EmbeddedNode",
            TagKind::Null => "Null",
            TagKind::ArrayInitializer => "ArrayInitializer",
        };
        f.write_str(name)
    }
}

/// Total source length covered by a sequence of tags.
pub fn source_len<'a>(tags: impl IntoIterator<Item = &'a Tag>) -> usize {
    tags.into_iter().map(Tag::source_len).sum()
}
