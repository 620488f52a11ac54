pub mod interner;

pub use interner::{KindInterner, SyntaxKind};
