//! Parse states
//!
//! A state is everything a speculative branch may change: its source cursor,
//! span and balance stacks, the path of open nodes, and the pending
//! reference. Branching copies the stacks in O(1) and forks only the node on
//! top of the path; the nodes below it are unreachable for writes because a
//! branch may not close below its floor.

use tracing::debug;

use super::errors::ErrorKind;
use super::facade::StateHandle;
use super::instruction::WriteEffect;
use super::spans::{BalancedStack, Span, SpanStack};
use crate::pattern::{Pattern, find_guarded};
use crate::source::Source;
use crate::tree::{NodeId, ReferenceTag, Tag, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Active,
    Accepted,
    Rejected,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Active => "active",
            Status::Accepted => "accepted",
            Status::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub(crate) struct StateData {
    pub(crate) source: Box<dyn Source>,
    pub(crate) spans: SpanStack,
    pub(crate) balanced: BalancedStack,
    /// Open nodes, outermost first. `path[0]` is the document.
    pub(crate) path: Vec<NodeId>,
    /// Minimum path length; nodes below it belong to an ancestor state.
    pub(crate) floor: usize,
    pub(crate) reference: Option<ReferenceTag>,
    /// The last tag advanced in this state.
    pub(crate) result: Option<Tag>,
    /// Write effects held back until the state is no longer speculative.
    pub(crate) effects: Vec<WriteEffect>,
    pub(crate) depth: usize,
    pub(crate) parent: Option<StateHandle>,
    /// `(original, fork)` of the path top forked when branching.
    pub(crate) fork: Option<(NodeId, NodeId)>,
    pub(crate) status: Status,
}

impl StateData {
    pub(crate) fn root(source: Box<dyn Source>) -> Self {
        Self {
            source,
            spans: SpanStack::new().push(Span::bare()),
            balanced: BalancedStack::new(),
            path: Vec::new(),
            floor: 1,
            reference: None,
            result: None,
            effects: Vec::new(),
            depth: 0,
            parent: None,
            fork: None,
            status: Status::Active,
        }
    }

    pub(crate) fn top(&self) -> Option<NodeId> {
        self.path.last().copied()
    }

    /// A child state of `this` (whose handle is `handle`).
    pub(crate) fn branch(&self, handle: StateHandle, tree: &mut Tree) -> Self {
        let mut path = self.path.clone();
        let fork = path.last_mut().map(|top| {
            let original = *top;
            *top = tree.fork(original);
            (original, *top)
        });
        Self {
            source: self.source.branch(),
            spans: self.spans.clone(),
            balanced: self.balanced.clone(),
            floor: path.len(),
            path,
            reference: self.reference.clone(),
            result: self.result.clone(),
            effects: Vec::new(),
            depth: self.depth + 1,
            parent: Some(handle),
            fork,
            status: Status::Active,
        }
    }

    /// Match `pattern` at the cursor, cut short by the top span's guard
    /// unless `unguarded`.
    pub(crate) fn guarded_match(&self, pattern: &Pattern, unguarded: bool) -> Option<String> {
        let guard = if unguarded {
            None
        } else {
            self.spans.peek().and_then(|span| span.guard.as_ref())
        };
        let ahead = self.source.ahead();
        let found = match guard {
            Some(guard) => find_guarded(pattern, &ahead, guard),
            None => pattern.find(&ahead),
        };
        found.map(str::to_owned)
    }
}

/// Fold an active branch back into its parent.
pub(crate) fn accept(
    states: &mut [StateData],
    branch: StateHandle,
    tree: &mut Tree,
) -> Result<(), ErrorKind> {
    let index = branch.index();
    let parent = states[index].parent.ok_or(ErrorKind::RootTransition)?;
    let (head, tail) = states.split_at_mut(index);
    let parent_state = &mut head[parent.index()];
    let state = &mut tail[0];

    if state.status != Status::Active {
        return Err(ErrorKind::StateTransition {
            status: state.status,
        });
    }
    if state.path.len() != parent_state.path.len() {
        return Err(ErrorKind::DepthMismatch {
            expected: parent_state.path.len(),
            found: state.path.len(),
        });
    }

    if let (Some(into), Some(from)) = (parent_state.top(), state.top()) {
        if into != from {
            tree.merge(into, from)?;
        }
    }
    parent_state.spans = state.spans.clone();
    parent_state.balanced = state.balanced.clone();
    parent_state.reference = state.reference.take();
    parent_state.result = state.result.clone();
    parent_state.effects.append(&mut state.effects);
    parent_state.source.accept(&*state.source);
    state.status = Status::Accepted;

    debug!(
        "[STATE] accept {} into {} at offset {}",
        index,
        parent.index(),
        parent_state.source.offset()
    );
    Ok(())
}

/// Abandon a branch. Rejecting twice is a no-op.
pub(crate) fn reject(states: &mut [StateData], branch: StateHandle) -> Result<(), ErrorKind> {
    let state = &mut states[branch.index()];
    if state.parent.is_none() {
        return Err(ErrorKind::RootTransition);
    }
    match state.status {
        Status::Rejected => Ok(()),
        Status::Accepted => Err(ErrorKind::StateTransition {
            status: Status::Accepted,
        }),
        Status::Active => {
            state.source.reject();
            state.effects.clear();
            state.status = Status::Rejected;
            debug!("[STATE] reject {}", branch.index());
            Ok(())
        }
    }
}

/// The state that now carries the work of `state`: follows accepted states
/// up to the first one still active or rejected.
pub(crate) fn live_state(states: &[StateData], mut state: StateHandle) -> StateHandle {
    while let Some(data) = states.get(state.index()) {
        match (data.status, data.parent) {
            (Status::Accepted, Some(parent)) => state = parent,
            _ => break,
        }
    }
    state
}

/// The node that now carries the content of `node`, which was written in
/// `state`: maps forks of accepted states back to their originals.
pub(crate) fn live_node(states: &[StateData], mut state: StateHandle, mut node: NodeId) -> NodeId {
    while let Some(data) = states.get(state.index()) {
        let (Status::Accepted, Some(parent)) = (data.status, data.parent) else {
            break;
        };
        if let Some((original, fork)) = data.fork {
            if node == fork {
                node = original;
            }
        }
        state = parent;
    }
    node
}
