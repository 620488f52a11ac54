//! Read-only views of engine internals
//!
//! Programs only ever hold opaque [`FrameHandle`]s and [`StateHandle`]s; the
//! views resolve them against the evaluator's arenas on demand.

use std::ops::Range;

use smol_str::SmolStr;

use super::frame::{FrameData, FrameKind, FrameOutcome};
use super::instruction::{Effects, PropertyMatcher};
use super::state::{StateData, Status, live_node, live_state};
use crate::base::Position;
use crate::tree::{NodeId, NodeView, ReferenceTag, Tag, Tree};

/// Opaque reference to a frame of one evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub(crate) u32);

impl FrameHandle {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

/// Opaque reference to a state of one evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHandle(pub(crate) u32);

impl StateHandle {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        Self(u32::try_from(index).unwrap_or(u32::MAX))
    }
}

#[derive(Clone, Copy)]
pub struct FrameView<'a> {
    pub(crate) frames: &'a [FrameData],
    pub(crate) states: &'a [StateData],
    pub(crate) tree: &'a Tree,
    pub(crate) handle: FrameHandle,
}

impl std::fmt::Debug for FrameView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameView")
            .field("handle", &self.handle)
            .field("ty", &self.ty())
            .field("kind", &self.kind())
            .field("outcome", &self.outcome())
            .finish()
    }
}

impl<'a> FrameView<'a> {
    fn data(&self) -> &'a FrameData {
        &self.frames[self.handle.index()]
    }

    pub fn handle(&self) -> FrameHandle {
        self.handle
    }

    pub fn language(&self) -> &'a str {
        &self.data().language
    }

    pub fn ty(&self) -> &'a str {
        self.data().matcher.ty()
    }

    pub fn matcher(&self) -> &'a PropertyMatcher {
        &self.data().matcher
    }

    pub fn kind(&self) -> FrameKind {
        self.data().kind
    }

    pub fn constructs_node(&self) -> bool {
        self.data().constructs_node
    }

    pub fn effects(&self) -> Effects {
        self.data().effects
    }

    pub fn outcome(&self) -> FrameOutcome {
        self.data().outcome
    }

    /// Consumed input or is emptyable; meaningful once the frame has ended.
    pub fn matched(&self) -> bool {
        self.data().matched
    }

    /// True once the frame ended without being rejected.
    pub fn captured(&self) -> bool {
        self.data().outcome == FrameOutcome::Accepted && self.data().range.is_some()
    }

    pub fn node(&self) -> Option<NodeView<'a>> {
        self.data().node.map(|node| self.tree.view(node))
    }

    /// Children of the owning node this frame produced, as indices into that
    /// node's tags.
    pub fn range(&self) -> Option<(NodeId, Range<usize>)> {
        let data = self.data();
        let range = data.range.clone()?;
        let owner = data.owner?;
        Some((live_node(self.states, data.state, owner), range))
    }

    /// The range's tags.
    pub fn tags(&self) -> Vec<Tag> {
        self.range()
            .map(|(owner, range)| {
                let view = self.tree.view(owner);
                range.filter_map(|index| view.child(index).cloned()).collect()
            })
            .unwrap_or_default()
    }

    pub fn parent(&self) -> Option<FrameView<'a>> {
        self.data().parent.map(|handle| FrameView { handle, ..*self })
    }

    /// The state now carrying this frame's work.
    pub fn state(&self) -> StateHandle {
        live_state(self.states, self.data().state)
    }
}

#[derive(Clone, Copy)]
pub struct StateView<'a> {
    pub(crate) states: &'a [StateData],
    pub(crate) tree: &'a Tree,
    pub(crate) handle: StateHandle,
}

impl std::fmt::Debug for StateView<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateView")
            .field("handle", &self.handle)
            .field("depth", &self.depth())
            .field("status", &self.status())
            .field("offset", &self.offset())
            .finish()
    }
}

impl<'a> StateView<'a> {
    fn data(&self) -> &'a StateData {
        &self.states[self.handle.index()]
    }

    pub fn handle(&self) -> StateHandle {
        self.handle
    }

    /// Number of speculative branches below the root.
    pub fn depth(&self) -> usize {
        self.data().depth
    }

    pub fn status(&self) -> Status {
        self.data().status
    }

    pub fn span(&self) -> SmolStr {
        self.data()
            .spans
            .peek()
            .map(|span| span.name.clone())
            .unwrap_or_default()
    }

    pub fn holding(&self) -> bool {
        self.data().source.holding()
    }

    pub fn offset(&self) -> usize {
        self.data().source.offset()
    }

    pub fn position(&self) -> Position {
        self.data().source.position()
    }

    pub fn done(&self) -> bool {
        self.data().source.done()
    }

    /// Innermost open node.
    pub fn node(&self) -> Option<NodeView<'a>> {
        self.data().top().map(|node| self.tree.view(node))
    }

    pub fn reference(&self) -> Option<&'a ReferenceTag> {
        self.data().reference.as_ref()
    }

    pub fn result(&self) -> Option<&'a Tag> {
        self.data().result.as_ref()
    }

    pub fn parent(&self) -> Option<StateView<'a>> {
        self.data().parent.map(|handle| StateView { handle, ..*self })
    }
}
