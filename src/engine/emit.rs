//! Lazy emission
//!
//! The emitter walks the committed document from where it last stopped and
//! hands out every tag that can no longer change. It waits at an open tag
//! with attributes still to be bound, and at an embedded node that has not
//! closed yet.

use std::collections::VecDeque;

use tracing::trace;

use super::instruction::Emitted;
use crate::tree::{NodeId, Tag, Tree};

#[derive(Debug, Clone)]
pub(crate) struct Emitter {
    /// `(node, index of the next child to emit)`, outermost first.
    stack: Vec<(NodeId, usize)>,
}

impl Emitter {
    pub(crate) fn new(document: NodeId) -> Self {
        Self {
            stack: vec![(document, 0)],
        }
    }

    /// True once the whole document has been emitted.
    pub(crate) fn is_done(&self) -> bool {
        self.stack.is_empty()
    }

    /// Emit everything that is settled, returning how many tags were emitted.
    pub(crate) fn emit(&mut self, tree: &Tree, out: &mut VecDeque<Emitted>) -> usize {
        let mut emitted = 0;
        while let Some(&(node, index)) = self.stack.last() {
            let view = tree.view(node);
            match view.child(index) {
                None => {
                    if !view.is_closed() {
                        break;
                    }
                    self.stack.pop();
                    self.step();
                }
                Some(Tag::OpenNode(_)) if view.unbound_attributes().next().is_some() => break,
                Some(Tag::EmbeddedNode(child)) => {
                    if !tree.view(*child).is_closed() {
                        break;
                    }
                    self.stack.push((*child, 0));
                }
                Some(tag) => {
                    trace!("[EVAL] emit {}", tag.kind());
                    out.push_back(Emitted::Tag(tag.clone()));
                    emitted += 1;
                    self.step();
                }
            }
        }
        emitted
    }

    fn step(&mut self) {
        if let Some((_, index)) = self.stack.last_mut() {
            *index += 1;
        }
    }
}
