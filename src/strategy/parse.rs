//! One-call parsing

use smol_str::SmolStr;
use tracing::debug;

use super::{Cx, Halt, Strategy};
use crate::core::KindInterner;
use crate::engine::{EngineError, Emitted, ErrorKind, Evaluator, Options, PropertyMatcher, WriteEffect};
use crate::language::Context;
use crate::source::Source;
use crate::tree::cst::{self, SyntaxNode};
use crate::tree::{DoctypeTag, NodeId, NodeView, Printer, Tag, Tree};

/// Parse `source` as `matcher` in `language`.
///
/// A root production that does not match is reported as
/// [`ErrorKind::NoMatch`].
pub fn parse(
    ctx: &Context,
    strategy: &Strategy,
    language: &str,
    source: Box<dyn Source>,
    matcher: PropertyMatcher,
    options: Options,
) -> Result<Parse, EngineError> {
    let mut eval = Evaluator::new(ctx, source, options);
    let ty = SmolStr::new(matcher.ty());

    let result = {
        let mut cx = Cx::new(&mut eval, strategy);
        cx.advance(Tag::Doctype(DoctypeTag::new(language)))
            .and_then(|_| cx.eat(matcher))
    };
    match result {
        Ok(_) => {}
        Err(Halt::Fail) => return Err(eval.error(ErrorKind::NoMatch { ty })),
        Err(Halt::Fatal(error)) => return Err(error),
    }
    eval.finish()?;

    let output = eval.drain();
    let document = eval.document();
    debug!("[EVAL] parsed `{}` into {} items", ty, output.len());
    Ok(Parse {
        output,
        document,
        tree: eval.into_tree(),
    })
}

/// The result of a successful [`parse`].
#[derive(Debug)]
pub struct Parse {
    output: Vec<Emitted>,
    document: Option<NodeId>,
    tree: Tree,
}

impl Parse {
    /// Everything emitted, tags and write effects, in order.
    pub fn emitted(&self) -> &[Emitted] {
        &self.output
    }

    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.output.iter().filter_map(Emitted::as_tag)
    }

    pub fn effects(&self) -> impl Iterator<Item = &WriteEffect> {
        self.output.iter().filter_map(|item| match item {
            Emitted::Effect(effect) => Some(effect),
            Emitted::Tag(_) => None,
        })
    }

    /// The emitted tags rendered with the default [`Printer`].
    pub fn print(&self) -> String {
        Printer::new().print(self.tags())
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// The node the root matcher produced.
    pub fn root(&self) -> Option<NodeView<'_>> {
        let document = self.tree.view(self.document?);
        document.children().find_map(|tag| match tag {
            Tag::EmbeddedNode(node) => Some(self.tree.view(*node)),
            _ => None,
        })
    }

    /// A rowan tree over the emitted tags, interning kinds into `interner`.
    pub fn syntax_with(&self, interner: &mut KindInterner) -> SyntaxNode {
        cst::build(self.tags(), interner)
    }

    pub fn syntax(&self) -> SyntaxNode {
        self.syntax_with(&mut KindInterner::new())
    }
}
