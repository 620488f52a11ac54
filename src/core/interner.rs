//! Node-type interner for syntax kinds.
//!
//! Maps node type names onto dense `SyntaxKind` values so tag streams can be
//! materialized as rowan trees. The first few kinds are reserved for the
//! structural elements every stream shares; interning the same type twice
//! returns the same kind.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

/// A rowan-compatible kind. Reserved kinds are associated constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxKind(pub u16);

impl SyntaxKind {
    /// The document container.
    pub const DOCUMENT: SyntaxKind = SyntaxKind(0);
    /// A literal token (consumed source text).
    pub const LITERAL: SyntaxKind = SyntaxKind(1);
    /// A zero-width reference marker.
    pub const REFERENCE: SyntaxKind = SyntaxKind(2);
    /// A zero-width gap marker.
    pub const GAP: SyntaxKind = SyntaxKind(3);

    const RESERVED: [&'static str; 4] = ["#document", "#literal", "#reference", "#gap"];

    /// Kind for the `index`th interned name, saturating at the last
    /// representable kind.
    fn from_index(index: usize) -> Self {
        SyntaxKind(u16::try_from(index).unwrap_or(u16::MAX))
    }

    pub fn is_reserved(self) -> bool {
        usize::from(self.0) < Self::RESERVED.len()
    }
}

impl From<SyntaxKind> for rowan::SyntaxKind {
    fn from(kind: SyntaxKind) -> Self {
        rowan::SyntaxKind(kind.0)
    }
}

impl From<rowan::SyntaxKind> for SyntaxKind {
    fn from(raw: rowan::SyntaxKind) -> Self {
        SyntaxKind(raw.0)
    }
}

/// Interner from node type names to syntax kinds.
#[derive(Debug, Clone)]
pub struct KindInterner {
    kinds: FxHashMap<SmolStr, SyntaxKind>,
    names: Vec<SmolStr>,
}

impl Default for KindInterner {
    fn default() -> Self {
        let names: Vec<SmolStr> = SyntaxKind::RESERVED.iter().map(|n| SmolStr::new(n)).collect();
        let kinds = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), SyntaxKind::from_index(i)))
            .collect();
        Self { kinds, names }
    }
}

impl KindInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a node type, returning its kind.
    pub fn intern(&mut self, ty: &str) -> SyntaxKind {
        if let Some(kind) = self.kinds.get(ty) {
            return *kind;
        }
        let kind = SyntaxKind::from_index(self.names.len());
        let name = SmolStr::new(ty);
        self.kinds.insert(name.clone(), kind);
        self.names.push(name);
        kind
    }

    /// Get the kind of a type if it was interned, without creating it.
    pub fn get(&self, ty: &str) -> Option<SyntaxKind> {
        self.kinds.get(ty).copied()
    }

    /// The type name a kind was interned from.
    pub fn name(&self, kind: SyntaxKind) -> Option<&str> {
        self.names.get(usize::from(kind.0)).map(SmolStr::as_str)
    }

    /// Number of kinds, reserved ones included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
