//! Production context

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tracing::trace;

use super::{Halt, Strategy};
use crate::engine::{
    Effects, ErrorKind, Evaluator, Failure, FrameHandle, FrameKind, FrameOptions, FrameOutcome,
    FrameView, Instruction, MatchTarget, Outcome, PropertyMatcher, StateView, Success,
};
use crate::pattern::Pattern;
use crate::tree::{AttrValue, Attributes, Tag};

/// Handle productions use to talk to the evaluator.
pub struct Cx<'e, 'c> {
    eval: &'e mut Evaluator<'c>,
    strategy: &'e Strategy,
    /// Regexes compiled by `eat_regex`, by source.
    regexes: FxHashMap<SmolStr, Pattern>,
}

impl std::fmt::Debug for Cx<'_, '_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cx").field("eval", &self.eval).finish()
    }
}

impl<'e, 'c> Cx<'e, 'c> {
    pub fn new(eval: &'e mut Evaluator<'c>, strategy: &'e Strategy) -> Self {
        Self {
            eval,
            strategy,
            regexes: FxHashMap::default(),
        }
    }

    pub fn evaluator(&self) -> &Evaluator<'c> {
        self.eval
    }

    // ========================================================================
    // Invocation
    // ========================================================================

    /// Consume `matcher` or fail.
    pub fn eat(&mut self, matcher: PropertyMatcher) -> Result<bool, Halt> {
        self.invoke(matcher, Effects::EAT, FrameOptions::default())
    }

    /// Consume `matcher` if it matches.
    pub fn eat_match(&mut self, matcher: PropertyMatcher) -> Result<bool, Halt> {
        self.invoke(matcher, Effects::EAT_MATCH, FrameOptions::default())
    }

    /// Whether `matcher` would match here. Consumes nothing.
    pub fn matches(&mut self, matcher: PropertyMatcher) -> Result<bool, Halt> {
        self.invoke(matcher, Effects::MATCH, FrameOptions::default())
    }

    /// Fail unless `matcher` would match here. Consumes nothing.
    pub fn guard(&mut self, matcher: PropertyMatcher) -> Result<bool, Halt> {
        self.invoke(matcher, Effects::GUARD, FrameOptions::default())
    }

    /// Run the production for `matcher` in a new frame.
    ///
    /// Returns whether it matched. A failure is returned as `Halt::Fail`
    /// only when `effects` propagate failure.
    pub fn invoke(
        &mut self,
        matcher: PropertyMatcher,
        effects: Effects,
        options: FrameOptions,
    ) -> Result<bool, Halt> {
        let outcome = self.dispatch(Instruction::StartFrame {
            matcher: Box::new(matcher.clone()),
            effects,
            options,
        })?;
        let Some(handle) = outcome.frame() else {
            return Err(self.fatal(ErrorKind::NoFrame));
        };

        match self.run_frame(handle, &matcher) {
            Ok(()) => {
                self.dispatch(Instruction::EndFrame)?;
                let frame = self.eval.frame(handle);
                let matched = if effects.success == Success::Eat {
                    frame.outcome() == FrameOutcome::Accepted && frame.matched()
                } else {
                    frame.matched()
                };
                trace!("[EVAL] `{}` matched: {}", matcher.ty(), matched);
                if !matched && effects.failure == Failure::Fail {
                    return Err(Halt::Fail);
                }
                Ok(matched)
            }
            Err(Halt::Fail) => {
                self.dispatch(Instruction::Throw)?;
                if effects.failure == Failure::Fail {
                    Err(Halt::Fail)
                } else {
                    Ok(false)
                }
            }
            Err(fatal) => Err(fatal),
        }
    }

    fn run_frame(&mut self, handle: FrameHandle, matcher: &PropertyMatcher) -> Result<(), Halt> {
        let frame = self.eval.frame(handle);
        let kind = frame.kind();
        let language = SmolStr::new(frame.language());

        if let Some(reference) = &matcher.reference {
            self.advance(Tag::Reference(reference.clone()))?;
        }
        if kind == FrameKind::Node {
            self.advance(Tag::OpenNode(matcher.open_tag(&language)))?;
        }

        match self.strategy.get(&language, matcher.ty()) {
            Some(production) => production(self, matcher)?,
            None => match &matcher.node.intrinsic {
                Some(_) => self.intrinsic(matcher)?,
                None => {
                    return Err(self.fatal(ErrorKind::UnknownProduction {
                        language,
                        ty: matcher.node.ty.clone(),
                    }));
                }
            },
        }

        if kind == FrameKind::Node {
            self.advance(Tag::CloseNode)?;
        }
        Ok(())
    }

    /// Body of a matcher that is fully described by its literal.
    fn intrinsic(&mut self, matcher: &PropertyMatcher) -> Result<(), Halt> {
        let matched = self.dispatch(Instruction::Match(MatchTarget::Property(Box::new(
            matcher.clone(),
        ))))?;
        match matched.matched_text() {
            Some(text) => self.advance(Tag::literal(text)).map(drop),
            None => Err(Halt::Fail),
        }
    }

    // ========================================================================
    // Text
    // ========================================================================

    /// Consume `text` into the current node or fail.
    pub fn literal(&mut self, text: &str) -> Result<(), Halt> {
        self.eat_pattern(&Pattern::literal(text)).map(drop)
    }

    /// Consume whatever `pattern` matches or fail.
    pub fn eat_pattern(&mut self, pattern: &Pattern) -> Result<String, Halt> {
        let Some(text) = self.match_pattern(pattern)? else {
            return Err(Halt::Fail);
        };
        self.advance(Tag::literal(text.as_str()))?;
        Ok(text)
    }

    /// Compile `source` and consume what it matches, or fail.
    pub fn eat_regex(&mut self, source: &str) -> Result<String, Halt> {
        let pattern = match self.regexes.get(source) {
            Some(pattern) => pattern.clone(),
            None => {
                let pattern =
                    Pattern::regex(source).map_err(|error| self.fatal(ErrorKind::from(error)))?;
                self.regexes.insert(source.into(), pattern.clone());
                pattern
            }
        };
        self.eat_pattern(&pattern)
    }

    /// The text `pattern` matches at the cursor, without consuming it.
    pub fn match_pattern(&mut self, pattern: &Pattern) -> Result<Option<String>, Halt> {
        let outcome = self.dispatch(Instruction::Match(MatchTarget::Pattern(pattern.clone())))?;
        Ok(outcome.matched_text())
    }

    // ========================================================================
    // Other instructions
    // ========================================================================

    pub fn advance(&mut self, tag: Tag) -> Result<Outcome, Halt> {
        self.dispatch(Instruction::Advance(tag))
    }

    pub fn open_span(&mut self, name: &str) -> Result<(), Halt> {
        self.dispatch(Instruction::OpenSpan(name.into())).map(drop)
    }

    pub fn close_span(&mut self) -> Result<(), Halt> {
        self.dispatch(Instruction::CloseSpan).map(drop)
    }

    pub fn write(&mut self, text: impl Into<String>, options: Attributes) -> Result<(), Halt> {
        self.dispatch(Instruction::Write {
            text: text.into(),
            options,
        })
        .map(drop)
    }

    /// Bind an attribute declared unbound on `frame`'s node, or on the current
    /// frame's node when `frame` is `None`.
    pub fn bind_attribute(
        &mut self,
        frame: Option<FrameHandle>,
        key: &str,
        value: impl Into<AttrValue>,
    ) -> Result<(), Halt> {
        self.dispatch(Instruction::BindAttribute {
            frame,
            key: key.into(),
            value: value.into(),
        })
        .map(drop)
    }

    pub fn state(&mut self) -> Result<StateView<'_>, Halt> {
        match self.dispatch(Instruction::GetState)? {
            Outcome::State(handle) => Ok(self.eval.state(handle)),
            _ => Err(self.fatal(ErrorKind::NoDocument)),
        }
    }

    pub fn frame(&self) -> Option<FrameView<'_>> {
        self.eval.current_frame().map(|handle| self.eval.frame(handle))
    }

    pub fn dispatch(&mut self, instruction: Instruction) -> Result<Outcome, Halt> {
        Ok(self.eval.dispatch(instruction)?)
    }

    fn fatal(&self, kind: ErrorKind) -> Halt {
        Halt::Fatal(self.eval.error(kind))
    }
}
