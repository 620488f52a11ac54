//! Source cursors
//!
//! A [`Source`] is a character cursor the engine reads through. Branching
//! produces an independent cursor at the same position; accepting a branch
//! moves the parent to wherever the branch got to. A source may contain
//! *gaps*: positions holding no character, standing for input that is bound
//! elsewhere.

use std::borrow::Cow;
use std::rc::Rc;

use crate::base::Position;

/// One position of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chr {
    Char(char),
    Gap,
}

impl Chr {
    pub fn as_char(self) -> Option<char> {
        match self {
            Chr::Char(c) => Some(c),
            Chr::Gap => None,
        }
    }
}

/// A forkable character cursor.
pub trait Source: std::fmt::Debug {
    /// The position `k` places ahead of the cursor, `None` past the end.
    fn peek(&self, k: usize) -> Option<Chr>;

    /// The position under the cursor.
    fn value(&self) -> Option<Chr> {
        self.peek(0)
    }

    /// The characters from the cursor up to the first gap or the end.
    fn ahead(&self) -> Cow<'_, str> {
        Cow::Owned(
            (0..)
                .map_while(|k| self.peek(k).and_then(Chr::as_char))
                .collect(),
        )
    }

    fn done(&self) -> bool;

    /// Move the cursor `n` positions forward.
    fn advance(&mut self, n: usize);

    /// An independent cursor at the same position.
    fn branch(&self) -> Box<dyn Source>;

    /// Take over the position and hold state of an accepted branch.
    fn accept(&mut self, branch: &dyn Source);

    /// Mark this cursor as abandoned.
    fn reject(&mut self);

    /// Positions consumed so far.
    fn offset(&self) -> usize;

    /// Line/column of the cursor.
    fn position(&self) -> Position;

    fn holding(&self) -> bool;

    /// Hold the current position so a following gap can re-bind it.
    fn shift(&mut self);

    /// Release a held position.
    fn unshift(&mut self);
}

/// In-memory source over text, optionally with gaps.
#[derive(Debug, Clone)]
pub struct TextSource {
    chrs: Rc<[Chr]>,
    /// The characters without gaps.
    text: Rc<str>,
    /// Byte offset into `text` of every position, plus one for the end.
    starts: Rc<[usize]>,
    /// Positions holding a gap, ascending.
    gaps: Rc<[usize]>,
    index: usize,
    held: bool,
    rejected: bool,
}

impl TextSource {
    pub fn new(text: &str) -> Self {
        Self::from_chrs(text.chars().map(Chr::Char))
    }

    pub fn from_chrs(chrs: impl IntoIterator<Item = Chr>) -> Self {
        let chrs: Rc<[Chr]> = chrs.into_iter().collect();
        let mut text = String::new();
        let mut starts = Vec::with_capacity(chrs.len() + 1);
        let mut gaps = Vec::new();
        for (index, chr) in chrs.iter().enumerate() {
            starts.push(text.len());
            match chr {
                Chr::Char(c) => text.push(*c),
                Chr::Gap => gaps.push(index),
            }
        }
        starts.push(text.len());
        Self {
            chrs,
            text: text.into(),
            starts: starts.into(),
            gaps: gaps.into(),
            index: 0,
            held: false,
            rejected: false,
        }
    }

    pub fn is_rejected(&self) -> bool {
        self.rejected
    }
}

impl Source for TextSource {
    fn peek(&self, k: usize) -> Option<Chr> {
        self.index
            .checked_add(k)
            .and_then(|i| self.chrs.get(i))
            .copied()
    }

    fn ahead(&self) -> Cow<'_, str> {
        let next_gap = self.gaps.partition_point(|&gap| gap < self.index);
        let end = self
            .gaps
            .get(next_gap)
            .map_or(self.text.len(), |&gap| self.starts[gap]);
        Cow::Borrowed(&self.text[self.starts[self.index]..end])
    }

    fn done(&self) -> bool {
        self.index >= self.chrs.len()
    }

    fn advance(&mut self, n: usize) {
        self.index = self.index.saturating_add(n).min(self.chrs.len());
    }

    fn branch(&self) -> Box<dyn Source> {
        Box::new(TextSource {
            chrs: Rc::clone(&self.chrs),
            text: Rc::clone(&self.text),
            starts: Rc::clone(&self.starts),
            gaps: Rc::clone(&self.gaps),
            index: self.index,
            held: self.held,
            rejected: false,
        })
    }

    fn accept(&mut self, branch: &dyn Source) {
        self.index = branch.offset();
        self.held = branch.holding();
    }

    fn reject(&mut self) {
        self.rejected = true;
    }

    fn offset(&self) -> usize {
        self.index
    }

    fn position(&self) -> Position {
        Position::after(self.chrs[..self.index].iter().map(|c| c.as_char()))
    }

    fn holding(&self) -> bool {
        self.held
    }

    fn shift(&mut self) {
        self.held = true;
    }

    fn unshift(&mut self) {
        self.held = false;
    }
}
