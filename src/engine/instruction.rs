//! Instruction set
//!
//! A grammar program talks to the evaluator exclusively through
//! [`Instruction`]s and receives one [`Outcome`] back per instruction.

use smol_str::SmolStr;

use super::facade::{FrameHandle, StateHandle};
use crate::pattern::Pattern;
use crate::tree::{AttrValue, Attributes, NodeFlags, OpenNodeTag, ReferenceTag, Tag};

// ============================================================================
// EFFECTS
// ============================================================================

/// What happens to a frame's work when it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Success {
    /// Keep the consumed input and built tree.
    Eat,
    /// Discard it (lookahead).
    None,
}

/// What happens to the caller when a frame fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Failure {
    /// The caller fails too.
    Fail,
    /// The failure is absorbed.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Effects {
    pub success: Success,
    pub failure: Failure,
}

impl Effects {
    pub const EAT: Effects = Effects {
        success: Success::Eat,
        failure: Failure::Fail,
    };
    pub const EAT_MATCH: Effects = Effects {
        success: Success::Eat,
        failure: Failure::None,
    };
    pub const MATCH: Effects = Effects {
        success: Success::None,
        failure: Failure::None,
    };
    pub const GUARD: Effects = Effects {
        success: Success::None,
        failure: Failure::Fail,
    };

    /// A frame branches whenever some outcome must be undoable.
    pub fn should_branch(self) -> bool {
        self.success == Success::None || self.failure == Failure::None
    }
}

/// Per-frame configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameOptions {
    /// On failure, fill the still-unset target slot with `null` or `[]`.
    pub backfill: bool,
    /// Attributes of the frame's node that hold back its emission until a
    /// `BindAttribute` supplies them.
    pub unbound: Vec<SmolStr>,
}

impl FrameOptions {
    pub fn with_backfill() -> Self {
        Self {
            backfill: true,
            ..Self::default()
        }
    }

    pub fn with_unbound<I>(keys: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<SmolStr>,
    {
        Self {
            unbound: keys.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

/// Parse-wide configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    /// Record `Write` instructions as effects in the output.
    pub emit_effects: bool,
}

// ============================================================================
// MATCHERS
// ============================================================================

/// Describes the node a production should produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeMatcher {
    /// Dependency aliases from the current language; empty for the current one.
    pub language: Vec<SmolStr>,
    pub ty: SmolStr,
    pub flags: NodeFlags,
    pub attributes: Attributes,
    /// Literal text the node consists of, when fixed.
    pub intrinsic: Option<SmolStr>,
}

/// A node matcher plus the slot its result is bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyMatcher {
    pub reference: Option<ReferenceTag>,
    pub node: NodeMatcher,
}

impl PropertyMatcher {
    pub fn new(ty: impl Into<SmolStr>) -> Self {
        Self {
            reference: None,
            node: NodeMatcher {
                language: Vec::new(),
                ty: ty.into(),
                flags: NodeFlags::default(),
                attributes: Attributes::default(),
                intrinsic: None,
            },
        }
    }

    /// Bind to the singular slot `name`.
    pub fn bind(mut self, name: impl Into<SmolStr>) -> Self {
        self.reference = Some(ReferenceTag::new(name));
        self
    }

    /// Bind to the array slot `name`.
    pub fn bind_array(mut self, name: impl Into<SmolStr>) -> Self {
        self.reference = Some(ReferenceTag::array(name));
        self
    }

    pub fn with_reference(mut self, reference: ReferenceTag) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn attr(mut self, key: impl Into<SmolStr>, value: impl Into<AttrValue>) -> Self {
        self.node.attributes.insert(key.into(), value.into());
        self
    }

    pub fn literal(mut self, text: impl Into<SmolStr>) -> Self {
        self.node.intrinsic = Some(text.into());
        self
    }

    pub fn token(mut self) -> Self {
        self.node.flags.token = true;
        self
    }

    pub fn trivia(mut self) -> Self {
        self.node.flags.trivia = true;
        self
    }

    pub fn in_language<'a>(mut self, path: impl IntoIterator<Item = &'a str>) -> Self {
        self.node.language = path.into_iter().map(SmolStr::new).collect();
        self
    }

    pub fn ty(&self) -> &str {
        &self.node.ty
    }

    /// The open tag a node frame for this matcher writes.
    pub fn open_tag(&self, language: &str) -> OpenNodeTag {
        OpenNodeTag {
            flags: self.node.flags,
            language: language.into(),
            ty: self.node.ty.clone(),
            attributes: self.node.attributes.clone(),
        }
    }

    /// Whether matching this token is exempt from the lexical guard.
    pub(crate) fn suspends_guard(&self) -> bool {
        let truthy = |key: &str| self.node.attributes.get(key).is_some_and(AttrValue::is_truthy);
        if self.node.flags.token {
            truthy("balancer") || truthy("balanced")
        } else {
            truthy("balancer")
        }
    }
}

/// What a `Match` instruction matches against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchTarget {
    Pattern(Pattern),
    /// An intrinsic property matcher; matched by its literal.
    Property(Box<PropertyMatcher>),
}

// ============================================================================
// INSTRUCTIONS AND OUTCOMES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Advance(Tag),
    Match(MatchTarget),
    StartFrame {
        matcher: Box<PropertyMatcher>,
        effects: Effects,
        options: FrameOptions,
    },
    EndFrame,
    BindAttribute {
        frame: Option<FrameHandle>,
        key: SmolStr,
        value: AttrValue,
    },
    Throw,
    OpenSpan(SmolStr),
    CloseSpan,
    Write {
        text: String,
        options: Attributes,
    },
    GetState,
}

impl Instruction {
    pub fn verb(&self) -> &'static str {
        match self {
            Instruction::Advance(_) => "advance",
            Instruction::Match(_) => "match",
            Instruction::StartFrame { .. } => "startFrame",
            Instruction::EndFrame => "endFrame",
            Instruction::BindAttribute { .. } => "bindAttribute",
            Instruction::Throw => "throw",
            Instruction::OpenSpan(_) => "openSpan",
            Instruction::CloseSpan => "closeSpan",
            Instruction::Write { .. } => "write",
            Instruction::GetState => "getState",
        }
    }

    pub fn start_frame(matcher: PropertyMatcher, effects: Effects) -> Self {
        Instruction::StartFrame {
            matcher: Box::new(matcher),
            effects,
            options: FrameOptions::default(),
        }
    }
}

/// Value handed back to the program for each instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Unit,
    /// The tag that was advanced.
    Tag(Tag),
    /// Tags matched by a `Match`, `None` when it failed.
    Matched(Option<Vec<Tag>>),
    /// The frame that is current after a frame instruction.
    Frame(Option<FrameHandle>),
    State(StateHandle),
}

impl Outcome {
    pub fn frame(&self) -> Option<FrameHandle> {
        match self {
            Outcome::Frame(frame) => *frame,
            _ => None,
        }
    }

    /// Text of a successful match.
    pub fn matched_text(&self) -> Option<String> {
        match self {
            Outcome::Matched(Some(tags)) => Some(
                tags.iter()
                    .filter_map(|tag| match tag {
                        Tag::Literal(text) => Some(text.as_str()),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        }
    }
}

// ============================================================================
// OUTPUT
// ============================================================================

/// A side-channel effect recorded by `Write`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteEffect {
    pub text: String,
    pub options: Attributes,
}

/// One item of the evaluator's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Emitted {
    Tag(Tag),
    Effect(WriteEffect),
}

impl Emitted {
    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Emitted::Tag(tag) => Some(tag),
            Emitted::Effect(_) => None,
        }
    }
}
