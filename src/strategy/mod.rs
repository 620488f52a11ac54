//! Productions as Rust functions
//!
//! A [`Strategy`] maps `(language, type)` to a [`Production`]. Productions
//! drive the evaluator through a [`Cx`], which wraps every invocation in the
//! frame protocol:
//!
//! ```text
//! StartFrame → Reference? → OpenNode? → production body → CloseNode? → EndFrame
//!                                             │ Halt::Fail
//!                                             ▼
//!                                           Throw
//! ```

mod cx;
mod parse;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::engine::{EngineError, PropertyMatcher};

pub use cx::Cx;
pub use parse::{Parse, parse};

/// Why a production stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Halt {
    /// The production did not match; recoverable by the caller.
    Fail,
    /// The engine contract was broken; aborts the parse.
    Fatal(EngineError),
}

impl From<EngineError> for Halt {
    fn from(error: EngineError) -> Self {
        Halt::Fatal(error)
    }
}

/// Body of a production. Runs inside the frame opened for `matcher`.
pub type Production = fn(&mut Cx<'_, '_>, &PropertyMatcher) -> Result<(), Halt>;

/// Production table for one or more languages.
#[derive(Clone, Default)]
pub struct Strategy {
    productions: FxHashMap<(SmolStr, SmolStr), Production>,
}

impl std::fmt::Debug for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.productions.keys()).finish()
    }
}

impl Strategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, language: &str, ty: &str, production: Production) -> Self {
        self.insert(language, ty, production);
        self
    }

    pub fn insert(&mut self, language: &str, ty: &str, production: Production) {
        self.productions
            .insert((SmolStr::new(language), SmolStr::new(ty)), production);
    }

    pub fn get(&self, language: &str, ty: &str) -> Option<Production> {
        self.productions
            .get(&(SmolStr::new(language), SmolStr::new(ty)))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.productions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.productions.is_empty()
    }
}
