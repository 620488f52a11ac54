//! Persistent, structurally shared sequence
//!
//! A 32-way path-copying trie. Cloning a sequence (`fork`) is O(1): both
//! handles point at the same chunks, and a chunk is only copied when one of
//! the handles writes through it while it is still shared. Reads, appends and
//! replacements are O(log n).
//!
//! ```text
//!            root (shift = 5)
//!           /      |       \
//!      leaf[0..32] leaf[32..64] leaf[64..]
//! ```

use std::rc::Rc;

const BITS: u32 = 5;
const WIDTH: usize = 1 << BITS;
const MASK: usize = WIDTH - 1;

#[derive(Debug, Clone)]
enum Chunk<T> {
    Branch(Vec<Rc<Chunk<T>>>),
    Leaf(Vec<T>),
}

/// An append-mostly persistent vector.
#[derive(Debug, Clone)]
pub struct PersistentSeq<T> {
    len: usize,
    shift: u32,
    root: Rc<Chunk<T>>,
}

impl<T: Clone> Default for PersistentSeq<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> PersistentSeq<T> {
    pub fn new() -> Self {
        Self {
            len: 0,
            shift: 0,
            root: Rc::new(Chunk::Leaf(Vec::new())),
        }
    }

    /// Number of elements (the "sum" of the trie).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Create a new handle sharing all structure with this one.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// True when both handles still share the same root chunk.
    pub fn shares_root(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.root, &other.root)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        let mut chunk = &*self.root;
        let mut level = self.shift;
        loop {
            match chunk {
                Chunk::Branch(children) => {
                    chunk = &*children[(index >> level) & MASK];
                    level -= BITS;
                }
                Chunk::Leaf(items) => return items.get(index & MASK),
            }
        }
    }

    pub fn last(&self) -> Option<&T> {
        self.len.checked_sub(1).and_then(|index| self.get(index))
    }

    /// Append an element, copying only the chunks on the path to the tail.
    pub fn push(&mut self, value: T) {
        if self.len == capacity(self.shift) {
            let old = Rc::clone(&self.root);
            self.root = Rc::new(Chunk::Branch(vec![old]));
            self.shift += BITS;
        }
        push_into(&mut self.root, self.shift, self.len, value);
        self.len += 1;
    }

    /// Replace the element at `index`, returning `false` when out of bounds.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        if index >= self.len {
            return false;
        }
        let mut chunk = &mut self.root;
        let mut level = self.shift;
        loop {
            match Rc::make_mut(chunk) {
                Chunk::Branch(children) => {
                    chunk = &mut children[(index >> level) & MASK];
                    level -= BITS;
                }
                Chunk::Leaf(items) => {
                    items[index & MASK] = value;
                    return true;
                }
            }
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            seq: self,
            front: 0,
            back: self.len,
        }
    }
}

fn capacity(shift: u32) -> usize {
    1usize << (shift + BITS)
}

fn push_into<T: Clone>(chunk: &mut Rc<Chunk<T>>, level: u32, index: usize, value: T) {
    match Rc::make_mut(chunk) {
        Chunk::Leaf(items) => items.push(value),
        Chunk::Branch(children) => {
            let slot = (index >> level) & MASK;
            if slot == children.len() {
                children.push(Rc::new(new_path(level - BITS, value)));
            } else {
                push_into(&mut children[slot], level - BITS, index, value);
            }
        }
    }
}

fn new_path<T>(level: u32, value: T) -> Chunk<T> {
    if level == 0 {
        Chunk::Leaf(vec![value])
    } else {
        Chunk::Branch(vec![Rc::new(new_path(level - BITS, value))])
    }
}

/// Borrowing iterator over a [`PersistentSeq`].
pub struct Iter<'a, T> {
    seq: &'a PersistentSeq<T>,
    front: usize,
    back: usize,
}

impl<'a, T: Clone> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        let item = self.seq.get(self.front);
        self.front += 1;
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.back - self.front;
        (remaining, Some(remaining))
    }
}

impl<T: Clone> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front >= self.back {
            return None;
        }
        self.back -= 1;
        self.seq.get(self.back)
    }
}

impl<T: Clone> ExactSizeIterator for Iter<'_, T> {}

impl<T: Clone> FromIterator<T> for PersistentSeq<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = PersistentSeq::new();
        for item in iter {
            seq.push(item);
        }
        seq
    }
}

impl<T: Clone + PartialEq> PartialEq for PersistentSeq<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && (self.shares_root(other) || self.iter().eq(other.iter()))
    }
}
