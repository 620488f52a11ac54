//! Match frames
//!
//! One frame per production invocation. A frame whose effects can be undone
//! runs in its own branched state; ending it decides whether that state is
//! folded back into its parent.
//!
//! ```text
//! StartFrame ── classify ── branch? ── owner/start offset
//! EndFrame   ── matched? ── accept | reject ── adopt into cover ── pop
//! Throw      ── reject ── backfill ── pop
//! ```

use std::ops::Range;

use smol_str::SmolStr;
use tracing::debug;

use super::errors::ErrorKind;
use super::evaluate::Evaluator;
use super::facade::{FrameHandle, StateHandle};
use super::instruction::{Effects, Failure, FrameOptions, Outcome, PropertyMatcher, Success};
use super::state::{self, Status};
use crate::language::{NodeSchema, TypeKind};
use crate::tree::{NodeId, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// The frame holding the document itself.
    Document,
    Node,
    Cover,
    Fragment,
}

impl From<TypeKind> for FrameKind {
    fn from(kind: TypeKind) -> Self {
        match kind {
            TypeKind::Node => FrameKind::Node,
            TypeKind::Cover => FrameKind::Cover,
            TypeKind::Fragment => FrameKind::Fragment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameOutcome {
    Running,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone)]
pub(crate) struct FrameData {
    pub(crate) language: SmolStr,
    pub(crate) matcher: Box<PropertyMatcher>,
    pub(crate) effects: Effects,
    pub(crate) options: FrameOptions,
    pub(crate) kind: FrameKind,
    pub(crate) constructs_node: bool,
    pub(crate) parent: Option<FrameHandle>,
    pub(crate) state: StateHandle,
    pub(crate) branched: bool,
    /// Node the frame's tags are written into.
    pub(crate) owner: Option<NodeId>,
    /// Node the frame built or adopted.
    pub(crate) node: Option<NodeId>,
    pub(crate) start: usize,
    pub(crate) start_offset: usize,
    pub(crate) range: Option<Range<usize>>,
    pub(crate) matched: bool,
    pub(crate) outcome: FrameOutcome,
}

impl FrameData {
    pub(crate) fn document(language: SmolStr, document: NodeId, state: StateHandle) -> Self {
        Self {
            matcher: Box::new(PropertyMatcher::new(SmolStr::default())),
            language,
            effects: Effects::EAT,
            options: FrameOptions::default(),
            kind: FrameKind::Document,
            constructs_node: true,
            parent: None,
            state,
            branched: false,
            owner: Some(document),
            node: Some(document),
            start: 0,
            start_offset: 0,
            range: None,
            matched: false,
            outcome: FrameOutcome::Running,
        }
    }
}

impl Evaluator<'_> {
    pub(super) fn start_frame(
        &mut self,
        matcher: Box<PropertyMatcher>,
        effects: Effects,
        options: FrameOptions,
    ) -> Result<Outcome, ErrorKind> {
        let parent = self.frame.ok_or(ErrorKind::NoDocument)?;
        let parent_data = &self.frames[parent.index()];

        let language = self
            .ctx
            .resolve(&parent_data.language, &matcher.node.language)
            .ok_or_else(|| ErrorKind::UnknownLanguage {
                name: matcher.node.language.join(".").into(),
            })?;
        let grammar = language.grammar();
        let ty = matcher.ty();
        let kind = grammar
            .classify(ty)
            .ok_or_else(|| ErrorKind::UnknownProduction {
                language: language.name().into(),
                ty: ty.into(),
            })?;
        if matcher.node.flags.token && !grammar.schema(ty).is_some_and(NodeSchema::is_token) {
            return Err(ErrorKind::ExpectedToken { ty: ty.into() });
        }

        let kind = FrameKind::from(kind);
        let covered = parent_data.kind == FrameKind::Cover
            && self
                .ctx
                .get(&parent_data.language)
                .is_some_and(|parent_language| parent_language.grammar().covers(parent_data.matcher.ty(), ty));
        let constructs_node = match kind {
            FrameKind::Node => parent_data.kind == FrameKind::Document || !covered,
            FrameKind::Cover | FrameKind::Document => true,
            FrameKind::Fragment => false,
        };
        let language = SmolStr::new(language.name());

        let branched = effects.should_branch();
        if branched {
            self.branch();
        }
        let current = self.current();
        let owner = current.top();
        let start = owner.map_or(0, |node| self.tree.view(node).len());
        let start_offset = current.source.offset();

        let handle = FrameHandle::from_index(self.frames.len());
        debug!(
            "[FRAME] start {} `{}` ({:?}, branched: {})",
            handle.index(),
            ty,
            kind,
            branched
        );
        self.frames.push(FrameData {
            language,
            matcher,
            effects,
            options,
            kind,
            constructs_node,
            parent: Some(parent),
            state: self.state,
            branched,
            owner,
            node: None,
            start,
            start_offset,
            range: None,
            matched: false,
            outcome: FrameOutcome::Running,
        });
        self.frame = Some(handle);
        Ok(Outcome::Frame(Some(handle)))
    }

    pub(super) fn end_frame(&mut self) -> Result<Outcome, ErrorKind> {
        let handle = self.ended_frame()?;
        let data = &self.frames[handle.index()];
        let state = &self.states[data.state.index()];

        let consumed = state.source.offset() > data.start_offset;
        let emptyable = self
            .ctx
            .get(&data.language)
            .is_some_and(|language| language.grammar().is_emptyable(data.matcher.ty()));
        let matched = consumed || emptyable;
        let end = data.owner.map_or(0, |node| self.tree.view(node).len());

        let committed = if data.branched {
            let commit = matched && state.status != Status::Rejected && data.effects.success == Success::Eat;
            let branch = data.state;
            if commit {
                state::accept(&mut self.states, branch, &mut self.tree)?;
            } else {
                state::reject(&mut self.states, branch)?;
            }
            self.leave(branch);
            commit
        } else {
            // written straight into the parent state, nothing to undo
            true
        };

        let data = &mut self.frames[handle.index()];
        data.matched = matched;
        if committed {
            data.outcome = FrameOutcome::Accepted;
            data.range = Some(data.start..end);
        } else {
            data.outcome = FrameOutcome::Rejected;
            data.range = None;
        }
        debug!(
            "[FRAME] end {} `{}` (matched: {}, committed: {})",
            handle.index(),
            data.matcher.ty(),
            matched,
            committed
        );

        let (kind, constructs_node, node, parent) = (data.kind, data.constructs_node, data.node, data.parent);
        if let Some(parent) = parent {
            let parent = &mut self.frames[parent.index()];
            if committed && kind == FrameKind::Node && !constructs_node && parent.kind == FrameKind::Cover {
                parent.node = node;
            }
        }

        self.frame = parent;
        self.emit_if_settled();
        Ok(Outcome::Frame(parent))
    }

    pub(super) fn throw(&mut self) -> Result<Outcome, ErrorKind> {
        let handle = self.ended_frame()?;
        let data = &self.frames[handle.index()];
        let (branched, branch, effects, backfill) = (data.branched, data.state, data.effects, data.options.backfill);
        let reference = data.matcher.reference.clone();
        let parent = data.parent;

        if branched {
            state::reject(&mut self.states, branch)?;
            self.leave(branch);
        }

        let data = &mut self.frames[handle.index()];
        data.outcome = FrameOutcome::Rejected;
        data.range = None;
        debug!("[FRAME] throw {} `{}`", handle.index(), data.matcher.ty());

        if let Some(reference) = reference {
            if backfill && branched && effects.failure == Failure::None {
                self.backfill(reference)?;
            }
        }

        self.frame = parent;
        self.emit_if_settled();
        Ok(Outcome::Frame(parent))
    }

    /// Fill a slot a failed optional production left unset.
    fn backfill(&mut self, reference: crate::tree::ReferenceTag) -> Result<(), ErrorKind> {
        let state = self.current();
        let Some(top) = state.top() else {
            return Ok(());
        };
        if state.reference.is_some() || self.tree.view(top).has(&reference.name) {
            return Ok(());
        }
        let placeholder = if reference.is_array {
            Tag::ArrayInitializer
        } else {
            Tag::Null
        };
        debug!("[FRAME] backfill `{}`", reference.name);
        self.tree.append(top, Tag::Reference(reference))?;
        self.tree.append(top, placeholder.clone())?;
        self.current_mut().result = Some(placeholder);
        Ok(())
    }

    /// The current frame, which must not be the document frame.
    fn ended_frame(&self) -> Result<FrameHandle, ErrorKind> {
        let handle = self.frame.ok_or(ErrorKind::NoFrame)?;
        if self.frames[handle.index()].kind == FrameKind::Document {
            return Err(ErrorKind::NoFrame);
        }
        Ok(handle)
    }

    /// Make the parent of `branch` current again.
    fn leave(&mut self, branch: StateHandle) {
        if let Some(parent) = self.states[branch.index()].parent {
            self.state = parent;
        }
    }

    /// Frames still open above the document frame.
    pub(super) fn open_frames(&self) -> usize {
        std::iter::successors(self.frame, |frame| self.frames[frame.index()].parent)
            .filter(|frame| self.frames[frame.index()].kind != FrameKind::Document)
            .count()
    }
}
