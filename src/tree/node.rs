//! Node arena
//!
//! Every node built during a parse lives in a [`Tree`] and is addressed by a
//! [`NodeId`]. A speculative branch never writes to a node it shares with its
//! parent: it writes to a *fork* of that node (a new id whose children share
//! structure with the original). Accepting the branch replays the fork's new
//! tail onto the original; rejecting it simply leaves the fork unreachable.

use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use thiserror::Error;

use super::sequence::PersistentSeq;
use super::tags::{Attributes, AttrValue, NodeFlags, OpenNodeTag, ReferenceTag, Tag};

/// Index of a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Structural errors raised by the node arena.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("property `{name}` is already bound")]
    DoubleBinding { name: SmolStr },

    #[error("attribute `{key}` is not awaiting a binding")]
    NotAwaitingBinding { key: SmolStr },

    #[error("node has no open tag")]
    NodeNotOpen,

    #[error("node is already closed")]
    NodeClosed,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) flags: NodeFlags,
    pub(crate) language: SmolStr,
    pub(crate) ty: SmolStr,
    pub(crate) attributes: Attributes,
    pub(crate) children: PersistentSeq<Tag>,
    /// Attributes declared at open time that still await `bind_attribute`.
    pub(crate) unbound: FxHashSet<SmolStr>,
    /// References seen per property name.
    pub(crate) counters: FxHashMap<SmolStr, usize>,
    /// The reference this node is bound under in its parent.
    pub(crate) reference: Option<ReferenceTag>,
    pub(crate) closed: bool,
    pub(crate) origin: Option<NodeId>,
    pub(crate) revision: u32,
}

impl NodeData {
    fn new(language: SmolStr, ty: SmolStr) -> Self {
        Self {
            flags: NodeFlags::default(),
            language,
            ty,
            attributes: Attributes::default(),
            children: PersistentSeq::new(),
            unbound: FxHashSet::default(),
            counters: FxHashMap::default(),
            reference: None,
            closed: false,
            origin: None,
            revision: 0,
        }
    }
}

/// Arena owning every node of a parse.
#[derive(Debug, Default)]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate the document container node.
    pub(crate) fn alloc_document(&mut self, language: &str) -> NodeId {
        self.push(NodeData::new(language.into(), SmolStr::default()))
    }

    /// Allocate a node for an open tag. The open tag itself is appended by
    /// the caller so that it flows through the normal write path.
    pub(crate) fn alloc(&mut self, open: &OpenNodeTag, reference: Option<ReferenceTag>) -> NodeId {
        let mut data = NodeData::new(open.language.clone(), open.ty.clone());
        data.flags = open.flags;
        data.attributes = open.attributes.clone();
        data.reference = reference;
        self.push(data)
    }

    /// Create a fork of `id` sharing all of its children.
    pub(crate) fn fork(&mut self, id: NodeId) -> NodeId {
        let mut data = self.data(id).clone();
        data.origin = Some(id);
        self.push(data)
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(data);
        id
    }

    pub(crate) fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    pub fn view(&self, id: NodeId) -> NodeView<'_> {
        NodeView { tree: self, id }
    }

    /// True when `candidate` is `id` or was (transitively) forked from it.
    pub(crate) fn is_version_of(&self, candidate: NodeId, id: NodeId) -> bool {
        let mut current = Some(candidate);
        while let Some(node) = current {
            if node == id {
                return true;
            }
            current = self.data(node).origin;
        }
        false
    }

    /// Append `tag` to the children of `id`, returning its index.
    pub(crate) fn append(&mut self, id: NodeId, tag: Tag) -> Result<usize, TreeError> {
        let has_gap = match &tag {
            Tag::EmbeddedNode(child) => self.data(*child).flags.has_gap,
            Tag::Gap => true,
            _ => false,
        };
        let node = self.data_mut(id);
        if node.closed {
            return Err(TreeError::NodeClosed);
        }
        match &tag {
            Tag::Reference(reference) => {
                let count = node.counters.entry(reference.name.clone()).or_default();
                if !reference.is_array && *count > 0 {
                    return Err(TreeError::DoubleBinding {
                        name: reference.name.clone(),
                    });
                }
                *count += 1;
            }
            Tag::CloseNode => node.closed = true,
            _ => {}
        }
        node.flags.has_gap |= has_gap;
        node.children.push(tag);
        Ok(node.children.len() - 1)
    }

    /// Replay everything `from` appended since it was forked from `into`.
    pub(crate) fn merge(&mut self, into: NodeId, from: NodeId) -> Result<(), TreeError> {
        let base = self.data(into).children.len();
        let source = self.data(from);
        let tail: Vec<Tag> = source.children.iter().skip(base).cloned().collect();
        let rewritten_open = (source.revision != self.data(into).revision)
            .then(|| source.children.get(0).cloned())
            .flatten();
        let attributes = source.attributes.clone();
        let unbound = source.unbound.clone();
        let revision = source.revision;

        for tag in tail {
            self.append(into, tag)?;
        }

        let node = self.data_mut(into);
        if let Some(open) = rewritten_open {
            node.children.set(0, open);
        }
        node.attributes = attributes;
        node.unbound = unbound;
        node.revision = revision;
        Ok(())
    }

    /// Mark a node complete without writing a close tag (the document).
    pub(crate) fn seal(&mut self, id: NodeId) {
        self.data_mut(id).closed = true;
    }

    pub(crate) fn declare_unbound(&mut self, id: NodeId, key: SmolStr) {
        self.data_mut(id).unbound.insert(key);
    }

    /// Bind an attribute that was declared unbound, rewriting the open tag.
    pub(crate) fn bind_attribute(
        &mut self,
        id: NodeId,
        key: SmolStr,
        value: AttrValue,
    ) -> Result<(), TreeError> {
        let node = self.data_mut(id);
        let Some(Tag::OpenNode(open)) = node.children.get(0) else {
            return Err(TreeError::NodeNotOpen);
        };
        let mut open = open.clone();
        if !node.unbound.remove(&key) {
            return Err(TreeError::NotAwaitingBinding { key });
        }
        open.attributes.insert(key.clone(), value.clone());
        node.attributes.insert(key, value);
        node.children.set(0, Tag::OpenNode(open));
        node.revision += 1;
        Ok(())
    }
}

/// Read-only view of a node.
#[derive(Clone, Copy)]
pub struct NodeView<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl std::fmt::Debug for NodeView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeView")
            .field("id", &self.id)
            .field("ty", &self.ty())
            .field("len", &self.len())
            .finish()
    }
}

impl<'a> NodeView<'a> {
    fn data(&self) -> &'a NodeData {
        self.tree.data(self.id)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn ty(&self) -> &'a str {
        &self.data().ty
    }

    pub fn language(&self) -> &'a str {
        &self.data().language
    }

    pub fn flags(&self) -> NodeFlags {
        self.data().flags
    }

    pub fn attributes(&self) -> &'a Attributes {
        &self.data().attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&'a AttrValue> {
        self.data().attributes.get(key)
    }

    pub fn unbound_attributes(&self) -> impl Iterator<Item = &'a SmolStr> {
        self.data().unbound.iter()
    }

    pub fn reference(&self) -> Option<&'a ReferenceTag> {
        self.data().reference.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.data().closed
    }

    pub fn len(&self) -> usize {
        self.data().children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().children.is_empty()
    }

    pub fn child(&self, index: usize) -> Option<&'a Tag> {
        self.data().children.get(index)
    }

    pub fn children(&self) -> impl Iterator<Item = &'a Tag> {
        self.data().children.iter()
    }

    /// Snapshot of the children, for comparisons in tests and diagnostics.
    pub fn tags(&self) -> Vec<Tag> {
        self.children().cloned().collect()
    }

    /// Source text covered by this node, recursing into embedded nodes.
    pub fn text(&self) -> String {
        let mut text = String::new();
        self.collect_text(&mut text);
        text
    }

    fn collect_text(&self, out: &mut String) {
        for tag in self.children() {
            match tag {
                Tag::Literal(literal) => out.push_str(literal),
                Tag::EmbeddedNode(child) => self.tree.view(*child).collect_text(out),
                _ => {}
            }
        }
    }

    /// The nodes bound under property `name`, in order.
    pub fn get_all(&self, name: &str) -> Vec<NodeView<'a>> {
        let mut found = Vec::new();
        let mut pending = false;
        for tag in self.children() {
            match tag {
                Tag::Reference(reference) => pending = reference.name == name,
                Tag::EmbeddedNode(child) if pending => {
                    found.push(self.tree.view(*child));
                    pending = false;
                }
                _ => pending = false,
            }
        }
        found
    }

    /// The node bound under singular property `name`.
    pub fn get(&self, name: &str) -> Option<NodeView<'a>> {
        self.get_all(name).into_iter().next()
    }

    /// True when property `name` has been given any value, null included.
    pub fn has(&self, name: &str) -> bool {
        self.data().counters.contains_key(name)
    }
}
