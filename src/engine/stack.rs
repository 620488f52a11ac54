//! Persistent linked stack
//!
//! Push and pop return new stacks sharing their tail with the original, so a
//! branched state copies its span and balance stacks in O(1).

use std::rc::Rc;

#[derive(Debug)]
struct Link<T> {
    value: T,
    next: Option<Rc<Link<T>>>,
}

#[derive(Debug)]
pub struct Stack<T> {
    head: Option<Rc<Link<T>>>,
    size: usize,
}

impl<T> Clone for Stack<T> {
    fn clone(&self) -> Self {
        Self {
            head: self.head.clone(),
            size: self.size,
        }
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self { head: None, size: 0 }
    }
}

impl<T> Stack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn push(&self, value: T) -> Self {
        Self {
            head: Some(Rc::new(Link {
                value,
                next: self.head.clone(),
            })),
            size: self.size + 1,
        }
    }

    /// The stack without its top; popping an empty stack yields an empty stack.
    #[must_use]
    pub fn pop(&self) -> Self {
        match &self.head {
            Some(link) => Self {
                head: link.next.clone(),
                size: self.size - 1,
            },
            None => Self::new(),
        }
    }

    pub fn peek(&self) -> Option<&T> {
        self.head.as_deref().map(|link| &link.value)
    }

    pub fn len(&self) -> usize {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Top to bottom.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        std::iter::successors(self.head.as_deref(), |link| link.next.as_deref()).map(|link| &link.value)
    }
}
