//! The evaluator
//!
//! Executes one [`Instruction`] at a time against the tree, the states and
//! the frames, and answers with an [`Outcome`]. A grammar is anything that
//! produces instructions: a [`Program`] driven by [`Evaluator::run`], or
//! Rust code calling [`Evaluator::dispatch`] directly (see `strategy`).

use std::collections::VecDeque;

use smol_str::SmolStr;
use tracing::{debug, trace};

use super::emit::Emitter;
use super::errors::{EngineError, ErrorContext, ErrorKind};
use super::facade::{FrameHandle, FrameView, StateHandle, StateView};
use super::frame::{FrameData, FrameOutcome};
use super::instruction::{Emitted, Instruction, MatchTarget, Options, Outcome, WriteEffect};
use super::spans::{self, Span, SpanKind};
use super::state::{StateData, live_state};
use crate::base::offset_size;
use crate::language::{Context, SlotKind};
use crate::pattern::Pattern;
use crate::source::{Chr, Source};
use crate::tree::{
    AttrValue, Attributes, COOKED_ATTRIBUTE, DoctypeTag, NodeId, OpenNodeTag, ReferenceTag, Tag,
    Tree,
};

/// Produces instructions, one per outcome of the previous instruction.
pub trait Program {
    /// Receives the outcome of the last instruction (`Outcome::Unit` first)
    /// and returns the next one, or `None` when the program is finished.
    fn resume(&mut self, outcome: Outcome) -> Option<Instruction>;
}

/// A fixed list of instructions. Records every outcome it receives.
#[derive(Debug, Clone, Default)]
pub struct Script {
    instructions: VecDeque<Instruction>,
    outcomes: Vec<Outcome>,
}

impl Script {
    pub fn new(instructions: impl IntoIterator<Item = Instruction>) -> Self {
        Self {
            instructions: instructions.into_iter().collect(),
            outcomes: Vec::new(),
        }
    }

    /// Outcomes of the instructions executed so far, in order.
    pub fn outcomes(&self) -> &[Outcome] {
        self.outcomes.get(1..).unwrap_or_default()
    }
}

impl Program for Script {
    fn resume(&mut self, outcome: Outcome) -> Option<Instruction> {
        self.outcomes.push(outcome);
        self.instructions.pop_front()
    }
}

pub struct Evaluator<'c> {
    pub(super) ctx: &'c Context,
    pub(super) options: Options,
    pub(super) tree: Tree,
    pub(super) frames: Vec<FrameData>,
    pub(super) states: Vec<StateData>,
    pub(super) frame: Option<FrameHandle>,
    pub(super) state: StateHandle,
    pub(super) document: Option<NodeId>,
    pub(super) emitter: Option<Emitter>,
    pub(super) output: VecDeque<Emitted>,
}

impl std::fmt::Debug for Evaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator")
            .field("frames", &self.frames.len())
            .field("states", &self.states.len())
            .field("frame", &self.frame)
            .field("state", &self.state)
            .field("nodes", &self.tree.len())
            .finish()
    }
}

impl<'c> Evaluator<'c> {
    pub fn new(ctx: &'c Context, source: Box<dyn Source>, options: Options) -> Self {
        Self {
            ctx,
            options,
            tree: Tree::new(),
            frames: Vec::new(),
            states: vec![StateData::root(source)],
            frame: None,
            state: StateHandle::from_index(0),
            document: None,
            emitter: None,
            output: VecDeque::new(),
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn context(&self) -> &'c Context {
        self.ctx
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn document(&self) -> Option<NodeId> {
        self.document
    }

    pub fn current_frame(&self) -> Option<FrameHandle> {
        self.frame
    }

    pub fn current_state(&self) -> StateHandle {
        self.state
    }

    pub fn frame(&self, handle: FrameHandle) -> FrameView<'_> {
        FrameView {
            frames: &self.frames,
            states: &self.states,
            tree: &self.tree,
            handle,
        }
    }

    pub fn state(&self, handle: StateHandle) -> StateView<'_> {
        StateView {
            states: &self.states,
            tree: &self.tree,
            handle,
        }
    }

    /// Output emitted so far and not yet drained.
    pub fn pending(&self) -> impl Iterator<Item = &Emitted> {
        self.output.iter()
    }

    pub fn drain(&mut self) -> Vec<Emitted> {
        self.output.drain(..).collect()
    }

    /// Give up the evaluator, keeping its node arena.
    pub fn into_tree(self) -> Tree {
        self.tree
    }

    pub(super) fn current(&self) -> &StateData {
        &self.states[self.state.index()]
    }

    pub(super) fn current_mut(&mut self) -> &mut StateData {
        &mut self.states[self.state.index()]
    }

    fn top(&self) -> Result<NodeId, ErrorKind> {
        if self.document.is_none() {
            return Err(ErrorKind::NoDocument);
        }
        self.current().top().ok_or(ErrorKind::NoOpenNode)
    }

    // ========================================================================
    // Driving
    // ========================================================================

    /// Execute one instruction.
    pub fn dispatch(&mut self, instruction: Instruction) -> Result<Outcome, EngineError> {
        trace!("[EVAL] {}", instruction.verb());
        let result = match instruction {
            Instruction::Advance(tag) => self.advance(tag),
            Instruction::Match(target) => self.guarded_match(&target),
            Instruction::StartFrame {
                matcher,
                effects,
                options,
            } => self.start_frame(matcher, effects, options),
            Instruction::EndFrame => self.end_frame(),
            Instruction::BindAttribute { frame, key, value } => {
                self.bind_attribute(frame, key, value)
            }
            Instruction::Throw => self.throw(),
            Instruction::OpenSpan(name) => {
                let state = self.current_mut();
                state.spans = state.spans.push(Span::new(SpanKind::Instruction, name));
                Ok(Outcome::Unit)
            }
            Instruction::CloseSpan => {
                spans::pop(&mut self.current_mut().spans, SpanKind::Instruction).map(|()| Outcome::Unit)
            }
            Instruction::Write { text, options } => {
                self.write(text, options);
                Ok(Outcome::Unit)
            }
            Instruction::GetState => Ok(Outcome::State(self.state)),
        };
        result.map_err(|kind| self.error(kind))
    }

    /// Drive `program` until it stops producing instructions.
    pub fn run(&mut self, program: &mut dyn Program) -> Result<(), EngineError> {
        let mut outcome = Outcome::Unit;
        while let Some(instruction) = program.resume(outcome) {
            outcome = self.dispatch(instruction)?;
        }
        Ok(())
    }

    /// Check the document-level invariants and emit the rest of the document.
    pub fn finish(&mut self) -> Result<(), EngineError> {
        self.finish_document().map_err(|kind| self.error(kind))
    }

    fn finish_document(&mut self) -> Result<(), ErrorKind> {
        let document = self.document.ok_or(ErrorKind::NoDocument)?;
        let open = self.open_frames();
        if open > 0 || self.current().depth > 0 {
            return Err(ErrorKind::FramesOpen { depth: open });
        }
        let state = self.current();
        if !state.source.done() {
            return Err(ErrorKind::SourceNotDone);
        }
        if !state.balanced.is_empty() {
            return Err(ErrorKind::BalancedNotEmpty {
                count: state.balanced.len(),
            });
        }

        self.tree.seal(document);
        self.emit_if_settled();
        if !self.emitter.as_ref().is_some_and(Emitter::is_done) {
            return Err(ErrorKind::EmissionIncomplete);
        }
        debug!("[EVAL] finished with {} nodes", self.tree.len());
        Ok(())
    }

    pub(crate) fn error(&self, kind: ErrorKind) -> EngineError {
        let state = self.current();
        let node_type = state
            .top()
            .filter(|node| Some(*node) != self.document)
            .map(|node| SmolStr::new(self.tree.view(node).ty()));
        EngineError::new(kind).with_context(ErrorContext {
            node_type,
            offset: offset_size(state.source.offset()),
            position: state.source.position(),
        })
    }

    pub(super) fn branch(&mut self) {
        let parent = self.state;
        let data = self.states[parent.index()].branch(parent, &mut self.tree);
        self.state = StateHandle::from_index(self.states.len());
        debug!(
            "[STATE] branch {} from {} at depth {}",
            self.state.index(),
            parent.index(),
            data.depth
        );
        self.states.push(data);
    }

    /// Emit whatever is settled when the current state is not speculative.
    pub(super) fn emit_if_settled(&mut self) {
        if self.current().depth != 0 {
            return;
        }
        let effects = std::mem::take(&mut self.current_mut().effects);
        self.output.extend(effects.into_iter().map(Emitted::Effect));
        if let Some(emitter) = &mut self.emitter {
            emitter.emit(&self.tree, &mut self.output);
        }
    }

    // ========================================================================
    // Advance
    // ========================================================================

    fn advance(&mut self, tag: Tag) -> Result<Outcome, ErrorKind> {
        match &tag {
            Tag::Doctype(doctype) => self.advance_doctype(doctype)?,
            Tag::Reference(reference) => self.advance_reference(reference)?,
            Tag::OpenNode(open) => self.advance_open(open)?,
            Tag::CloseNode => self.advance_close()?,
            Tag::Literal(text) => self.advance_literal(text)?,
            Tag::Gap => {
                let top = self.top()?;
                let source = &mut self.current_mut().source;
                if source.holding() {
                    source.unshift();
                } else if source.value() == Some(Chr::Gap) && !source.done() {
                    source.advance(1);
                } else {
                    return Err(ErrorKind::GapExpected);
                }
                self.tree.append(top, Tag::Gap)?;
            }
            Tag::Shift => {
                let top = self.top()?;
                self.current_mut().source.shift();
                self.tree.append(top, Tag::Shift)?;
            }
            Tag::EmbeddedNode(_) => return Err(ErrorKind::UnexpectedEmbeddedNode),
            Tag::Null | Tag::ArrayInitializer => {
                let top = self.top()?;
                self.tree.append(top, tag.clone())?;
            }
        }

        let state = self.current_mut();
        if !matches!(tag, Tag::Reference(_)) {
            state.reference = None;
        }
        state.result = Some(tag.clone());
        trace!("[EVAL] advanced {}", tag.kind());
        self.emit_if_settled();
        Ok(Outcome::Tag(tag))
    }

    fn advance_doctype(&mut self, doctype: &DoctypeTag) -> Result<(), ErrorKind> {
        if self.document.is_some() {
            return Err(ErrorKind::DuplicateDoctype);
        }
        if self.ctx.get(&doctype.language).is_none() {
            return Err(ErrorKind::UnknownLanguage {
                name: doctype.language.clone(),
            });
        }
        let document = self.tree.alloc_document(&doctype.language);
        self.tree.append(document, Tag::Doctype(doctype.clone()))?;
        self.current_mut().path = vec![document];
        self.document = Some(document);

        let frame = FrameHandle::from_index(self.frames.len());
        self.frames
            .push(FrameData::document(doctype.language.clone(), document, self.state));
        self.frame = Some(frame);
        self.emitter = Some(Emitter::new(document));
        debug!("[EVAL] document in `{}`", doctype.language);
        Ok(())
    }

    fn advance_reference(&mut self, reference: &ReferenceTag) -> Result<(), ErrorKind> {
        let top = self.top()?;
        if Some(top) != self.document {
            let view = self.tree.view(top);
            let slot = self
                .ctx
                .get(view.language())
                .and_then(|language| language.grammar().schema(view.ty()))
                .and_then(|schema| schema.slot(&reference.name));
            let expected = if reference.is_array {
                SlotKind::Array
            } else {
                SlotKind::Single
            };
            if slot != Some(expected) {
                return Err(ErrorKind::UnknownProperty {
                    ty: view.ty().into(),
                    name: reference.name.clone(),
                });
            }
        }
        if let Some(pending) = &self.current().reference {
            return Err(ErrorKind::DanglingReference {
                name: pending.name.clone(),
            });
        }
        self.tree.append(top, Tag::Reference(reference.clone()))?;
        self.current_mut().reference = Some(reference.clone());
        Ok(())
    }

    fn advance_open(&mut self, open: &OpenNodeTag) -> Result<(), ErrorKind> {
        let top = self.top()?;
        let state = self.current_mut();
        let reference = state.reference.take();
        if reference.is_none() && state.path.len() > 1 {
            return Err(ErrorKind::MissingReference {
                ty: open.ty.clone(),
            });
        }

        let node = self.tree.alloc(open, reference.clone());
        self.tree.append(top, Tag::EmbeddedNode(node))?;
        self.tree.append(node, Tag::OpenNode(open.clone()))?;
        if reference.as_ref().is_some_and(ReferenceTag::is_cooked) {
            self.tree.declare_unbound(node, COOKED_ATTRIBUTE.into());
        }
        if let Some(frame) = self.frame {
            let data = &mut self.frames[frame.index()];
            data.node = Some(node);
            for key in &data.options.unbound {
                self.tree.declare_unbound(node, key.clone());
            }
        }

        let state = self.current_mut();
        state.path.push(node);
        spans::open(&mut state.spans, &open.ty, &open.attributes, reference.as_ref())
    }

    fn advance_close(&mut self) -> Result<(), ErrorKind> {
        let node = self.top()?;
        let state = self.current();
        if state.path.len() <= state.floor {
            return Err(ErrorKind::CloseOutsideBranch);
        }

        let view = self.tree.view(node);
        let awaiting_cooked = view.reference().is_some_and(ReferenceTag::is_cooked)
            && view.unbound_attributes().any(|key| key == COOKED_ATTRIBUTE);
        if awaiting_cooked {
            let cooked = if view.flags().has_gap {
                None
            } else {
                let span = state.spans.peek().map(|span| span.name.as_str()).unwrap_or_default();
                self.ctx
                    .get(view.language())
                    .and_then(|language| language.cooked(&view, span))
            };
            self.bind_attribute(None, COOKED_ATTRIBUTE.into(), AttrValue::from(cooked))?;
        }

        self.tree.append(node, Tag::CloseNode)?;
        let state = &mut self.states[self.state.index()];
        state.path.pop();
        spans::close(&mut state.spans, &mut state.balanced, &self.tree, node)?;

        if state.path.len() == 1 {
            if !state.source.done() {
                return Err(ErrorKind::SourceNotDone);
            }
            if !state.balanced.is_empty() {
                return Err(ErrorKind::BalancedNotEmpty {
                    count: state.balanced.len(),
                });
            }
        }
        Ok(())
    }

    fn advance_literal(&mut self, text: &SmolStr) -> Result<(), ErrorKind> {
        let top = self.top()?;
        let state = self.current();
        let closing_balancer = match &state.result {
            Some(Tag::OpenNode(open)) => open
                .attributes
                .get("balancer")
                .is_some_and(AttrValue::is_truthy),
            _ => false,
        };
        let unguarded = closing_balancer
            && state
                .balanced
                .peek()
                .and_then(|opener| self.tree.view(*opener).attribute("balanced"))
                .and_then(AttrValue::as_str)
                == Some(text.as_str());

        if state
            .guarded_match(&Pattern::Literal(text.clone()), unguarded)
            .is_none()
        {
            return Err(ErrorKind::LiteralMismatch { text: text.clone() });
        }
        self.current_mut().source.advance(text.chars().count());
        self.tree.append(top, Tag::Literal(text.clone()))?;
        Ok(())
    }

    // ========================================================================
    // Other instructions
    // ========================================================================

    fn guarded_match(&self, target: &MatchTarget) -> Result<Outcome, ErrorKind> {
        if self.document.is_none() {
            return Err(ErrorKind::NoDocument);
        }
        let state = self.current();
        let matched = match target {
            MatchTarget::Pattern(pattern) => state.guarded_match(pattern, false),
            MatchTarget::Property(matcher) => {
                let Some(intrinsic) = &matcher.node.intrinsic else {
                    return Err(ErrorKind::NotMatchable {
                        ty: matcher.node.ty.clone(),
                    });
                };
                let lexical = state
                    .spans
                    .peek()
                    .is_some_and(|span| span.kind == SpanKind::Lexical);
                state.guarded_match(
                    &Pattern::Literal(intrinsic.clone()),
                    lexical && matcher.suspends_guard(),
                )
            }
        };
        Ok(Outcome::Matched(matched.map(|text| vec![Tag::literal(text)])))
    }

    fn bind_attribute(
        &mut self,
        frame: Option<FrameHandle>,
        key: SmolStr,
        value: AttrValue,
    ) -> Result<Outcome, ErrorKind> {
        let node = match frame {
            Some(handle) => {
                let data = self.frames.get(handle.index()).ok_or(ErrorKind::NoFrame)?;
                if data.outcome == FrameOutcome::Rejected {
                    return Err(ErrorKind::FrameRejected);
                }
                if !self.frame(handle).captured() {
                    return Err(ErrorKind::FrameNotCaptured);
                }
                if live_state(&self.states, data.state) != self.state {
                    return Err(ErrorKind::FrameNotInState);
                }
                data.node
            }
            None => {
                let handle = self.frame.ok_or(ErrorKind::NoFrame)?;
                self.frames[handle.index()].node
            }
        };
        let node = node.ok_or(ErrorKind::FrameHasNoNode)?;
        let node = self
            .current()
            .path
            .iter()
            .rev()
            .copied()
            .find(|candidate| self.tree.is_version_of(*candidate, node))
            .unwrap_or(node);

        trace!("[EVAL] bind `{}` on node {}", key, node.index());
        self.tree.bind_attribute(node, key, value)?;
        self.emit_if_settled();
        Ok(Outcome::Unit)
    }

    fn write(&mut self, text: String, options: Attributes) {
        if !self.options.emit_effects {
            return;
        }
        trace!("[EVAL] write {:?}", text);
        self.current_mut()
            .effects
            .push(WriteEffect { text, options });
        self.emit_if_settled();
    }
}
