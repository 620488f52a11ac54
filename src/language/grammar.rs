//! Grammar schema
//!
//! A grammar classifies every production type as a node, a cover or a
//! fragment, lists the child slots each node type may bind, and names the
//! types allowed to match empty input.
//!
//! ```text
//! Expression (cover) ──┬── String (node: open, content, close)
//!                      ├── Number (node: digits[])
//!                      └── ...
//! ```

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use thiserror::Error;

use crate::tree::COOKED_REFERENCE;

/// Grammar construction errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("`{name}` is not a valid identifier")]
    InvalidName { name: SmolStr },

    #[error("type `{ty}` is declared more than once")]
    DuplicateType { ty: SmolStr },

    #[error("slot `{slot}` is declared more than once on `{ty}`")]
    DuplicateSlot { ty: SmolStr, slot: SmolStr },

    #[error("cover `{cover}` names unknown type `{member}`")]
    UnknownCoverMember { cover: SmolStr, member: SmolStr },

    #[error("emptyable type `{ty}` is not declared")]
    UnknownEmptyable { ty: SmolStr },

    #[error("cover `{cover}` has no members")]
    EmptyCover { cover: SmolStr },
}

/// How a production type materializes in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Has its own open/close tags.
    Node,
    /// Abstract grouping of node types; never appears in output.
    Cover,
    /// Writes straight into its parent's node.
    Fragment,
}

/// Whether a slot holds one child or a list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotKind {
    Single,
    Array,
}

#[derive(Debug, Clone, Default)]
pub struct NodeSchema {
    token: bool,
    slots: IndexMap<SmolStr, SlotKind>,
}

impl NodeSchema {
    pub fn is_token(&self) -> bool {
        self.token
    }

    /// The declared slot named `name`. The cooked slot is always available.
    pub fn slot(&self, name: &str) -> Option<SlotKind> {
        if name == COOKED_REFERENCE {
            return Some(SlotKind::Single);
        }
        self.slots.get(name).copied()
    }

    pub fn slots(&self) -> impl Iterator<Item = (&str, SlotKind)> {
        self.slots.iter().map(|(name, kind)| (name.as_str(), *kind))
    }
}

/// A validated grammar.
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    nodes: FxHashMap<SmolStr, NodeSchema>,
    covers: FxHashMap<SmolStr, FxHashSet<SmolStr>>,
    fragments: FxHashSet<SmolStr>,
    emptyables: FxHashSet<SmolStr>,
}

impl Grammar {
    pub fn builder() -> GrammarBuilder {
        GrammarBuilder::default()
    }

    /// Classify a type; node wins over cover, cover over fragment.
    pub fn classify(&self, ty: &str) -> Option<TypeKind> {
        if self.nodes.contains_key(ty) {
            Some(TypeKind::Node)
        } else if self.covers.contains_key(ty) {
            Some(TypeKind::Cover)
        } else if self.fragments.contains(ty) {
            Some(TypeKind::Fragment)
        } else {
            None
        }
    }

    pub fn schema(&self, ty: &str) -> Option<&NodeSchema> {
        self.nodes.get(ty)
    }

    pub fn is_emptyable(&self, ty: &str) -> bool {
        self.emptyables.contains(ty)
    }

    /// True when `cover` includes `ty`, directly or through nested covers.
    pub fn covers(&self, cover: &str, ty: &str) -> bool {
        let mut seen = FxHashSet::default();
        let mut pending = vec![cover];
        while let Some(current) = pending.pop() {
            let Some(members) = self.covers.get(current) else {
                continue;
            };
            if members.contains(ty) {
                return true;
            }
            for member in members {
                if seen.insert(member.as_str()) {
                    pending.push(member.as_str());
                }
            }
        }
        false
    }
}

#[derive(Debug, Clone)]
enum Declaration {
    Node {
        ty: SmolStr,
        token: bool,
        slots: Vec<SmolStr>,
    },
    Cover {
        ty: SmolStr,
        members: Vec<SmolStr>,
    },
    Fragment {
        ty: SmolStr,
    },
    Emptyable {
        ty: SmolStr,
    },
}

/// Builder for [`Grammar`]; validation happens in [`GrammarBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct GrammarBuilder {
    declarations: Vec<Declaration>,
}

impl GrammarBuilder {
    /// Declare a node type. Array slots are written `name[]`.
    pub fn node<'a>(mut self, ty: &str, slots: impl IntoIterator<Item = &'a str>) -> Self {
        self.declarations.push(Declaration::Node {
            ty: ty.into(),
            token: false,
            slots: slots.into_iter().map(SmolStr::new).collect(),
        });
        self
    }

    /// Declare a token type: a node whose children are literals.
    pub fn token(mut self, ty: &str) -> Self {
        self.declarations.push(Declaration::Node {
            ty: ty.into(),
            token: true,
            slots: Vec::new(),
        });
        self
    }

    pub fn cover<'a>(mut self, ty: &str, members: impl IntoIterator<Item = &'a str>) -> Self {
        self.declarations.push(Declaration::Cover {
            ty: ty.into(),
            members: members.into_iter().map(SmolStr::new).collect(),
        });
        self
    }

    pub fn fragment(mut self, ty: &str) -> Self {
        self.declarations.push(Declaration::Fragment { ty: ty.into() });
        self
    }

    pub fn emptyable(mut self, ty: &str) -> Self {
        self.declarations.push(Declaration::Emptyable { ty: ty.into() });
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let mut grammar = Grammar::default();
        let mut declared = FxHashSet::default();
        let mut emptyables = Vec::new();

        for declaration in self.declarations {
            let ty = match &declaration {
                Declaration::Emptyable { ty } => {
                    emptyables.push(ty.clone());
                    continue;
                }
                Declaration::Node { ty, .. }
                | Declaration::Cover { ty, .. }
                | Declaration::Fragment { ty } => ty.clone(),
            };
            validate_name(&ty)?;
            if !declared.insert(ty.clone()) {
                return Err(GrammarError::DuplicateType { ty });
            }

            match declaration {
                Declaration::Node { token, slots, .. } => {
                    let mut schema = NodeSchema {
                        token,
                        slots: IndexMap::new(),
                    };
                    for slot in slots {
                        let (name, kind) = match slot.strip_suffix("[]") {
                            Some(name) => (SmolStr::new(name), SlotKind::Array),
                            None => (slot.clone(), SlotKind::Single),
                        };
                        validate_name(&name)?;
                        if schema.slots.insert(name.clone(), kind).is_some() {
                            return Err(GrammarError::DuplicateSlot { ty, slot: name });
                        }
                    }
                    grammar.nodes.insert(ty, schema);
                }
                Declaration::Cover { members, .. } => {
                    if members.is_empty() {
                        return Err(GrammarError::EmptyCover { cover: ty });
                    }
                    grammar.covers.insert(ty, members.into_iter().collect());
                }
                Declaration::Fragment { .. } => {
                    grammar.fragments.insert(ty);
                }
                Declaration::Emptyable { .. } => {}
            }
        }

        for (cover, members) in &grammar.covers {
            for member in members {
                if !declared.contains(member) {
                    return Err(GrammarError::UnknownCoverMember {
                        cover: cover.clone(),
                        member: member.clone(),
                    });
                }
            }
        }
        for ty in emptyables {
            if !declared.contains(&ty) {
                return Err(GrammarError::UnknownEmptyable { ty });
            }
            grammar.emptyables.insert(ty);
        }

        tracing::debug!(
            "[GRAMMAR] built: {} nodes, {} covers, {} fragments",
            grammar.nodes.len(),
            grammar.covers.len(),
            grammar.fragments.len()
        );
        Ok(grammar)
    }
}

fn validate_name(name: &str) -> Result<(), GrammarError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| unicode_ident::is_xid_start(first) || first == '_')
        && chars.all(unicode_ident::is_xid_continue);
    if valid {
        Ok(())
    } else {
        Err(GrammarError::InvalidName { name: name.into() })
    }
}
