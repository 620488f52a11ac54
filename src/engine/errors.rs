//! Fatal engine errors
//!
//! Match failure is never an error: it is a `None` from matching or a
//! rejected branch. Everything here means the grammar program broke the
//! engine's contract, and aborts the parse.

use smol_str::SmolStr;
use text_size::TextSize;
use thiserror::Error;

use super::spans::SpanKind;
use super::state::Status;
use crate::base::Position;
use crate::pattern::PatternError;
use crate::tree::TreeError;

/// What went wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ErrorKind {
    // =========================================================================
    // Document and language resolution
    // =========================================================================
    #[error("no document has been started")]
    NoDocument,

    #[error("a document has already been started")]
    DuplicateDoctype,

    #[error("unknown language `{name}`")]
    UnknownLanguage { name: SmolStr },

    #[error("unknown production `{ty}` in language `{language}`")]
    UnknownProduction { language: SmolStr, ty: SmolStr },

    #[error("`{ty}` is not a token but the matcher requires one")]
    ExpectedToken { ty: SmolStr },

    #[error("`{ty}` cannot be matched as a pattern")]
    NotMatchable { ty: SmolStr },

    #[error("no match for `{ty}`")]
    NoMatch { ty: SmolStr },

    #[error(transparent)]
    Pattern(#[from] PatternError),

    // =========================================================================
    // Tree structure
    // =========================================================================
    #[error("`{ty}` has no property `{name}`")]
    UnknownProperty { ty: SmolStr, name: SmolStr },

    #[error("reference `{name}` is still waiting for a value")]
    DanglingReference { name: SmolStr },

    #[error("node `{ty}` opened without a reference")]
    MissingReference { ty: SmolStr },

    #[error("no open node")]
    NoOpenNode,

    #[error("cannot close a node opened outside the current branch")]
    CloseOutsideBranch,

    #[error("embedded nodes cannot be advanced directly")]
    UnexpectedEmbeddedNode,

    #[error(transparent)]
    Tree(#[from] TreeError),

    // =========================================================================
    // Source consumption
    // =========================================================================
    #[error("failed to advance literal {text:?}")]
    LiteralMismatch { text: SmolStr },

    #[error("failed to advance gap")]
    GapExpected,

    #[error("parser failed to consume input")]
    SourceNotDone,

    // =========================================================================
    // Spans and balance
    // =========================================================================
    #[error("balanced tokens must be intrinsic (`{ty}`)")]
    ExpressionBalanced { ty: SmolStr },

    #[error("`balancedSpan` requires `balanced` (`{ty}`)")]
    BalancedSpanWithoutBalanced { ty: SmolStr },

    #[error("balancer `{ty}` has no balanced token to close")]
    UnbalancedCloser { ty: SmolStr },

    #[error("innermost balanced entry `{ty}` is not balanced")]
    NotBalanced { ty: SmolStr },

    #[error("balancer text {found:?} does not match {expected:?}")]
    BalancerMismatch { expected: SmolStr, found: String },

    #[error("expected a {expected} span on top, found {found}")]
    SpanMismatch { expected: SpanKind, found: SpanKind },

    #[error("parser did not match all balanced nodes ({count} open)")]
    BalancedNotEmpty { count: usize },

    // =========================================================================
    // Frames and states
    // =========================================================================
    #[error("no frame to end")]
    NoFrame,

    #[error("state is already {status}")]
    StateTransition { status: Status },

    #[error("the root state cannot be accepted or rejected")]
    RootTransition,

    #[error("branch is at tree depth {found}, parent at {expected}")]
    DepthMismatch { expected: usize, found: usize },

    #[error("frame has been rejected")]
    FrameRejected,

    #[error("frame is not captured yet")]
    FrameNotCaptured,

    #[error("frame belongs to another state")]
    FrameNotInState,

    #[error("frame has no node")]
    FrameHasNoNode,

    #[error("{depth} frame(s) still open")]
    FramesOpen { depth: usize },

    #[error("emission did not reach the end of the document")]
    EmissionIncomplete,
}

/// Where the engine was when a fatal error happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Type of the innermost open node, if any.
    pub node_type: Option<SmolStr>,
    pub offset: TextSize,
    pub position: Position,
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "at {} (offset {})", self.position, u32::from(self.offset))?;
        if let Some(ty) = &self.node_type {
            write!(f, " in `{ty}`")?;
        }
        Ok(())
    }
}

/// A fatal error with the context it was raised in.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}{}", .context.as_ref().map_or_else(String::new, |c| format!(" {c}")))]
pub struct EngineError {
    pub kind: ErrorKind,
    pub context: Option<ErrorContext>,
}

impl EngineError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }
}

impl From<ErrorKind> for EngineError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}
