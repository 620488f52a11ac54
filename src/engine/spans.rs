//! Span and balance tracking
//!
//! Node attributes drive two persistent stacks:
//!
//! ```text
//! open:  openSpan   → push Explicit
//!        span       → push Inner
//! close: balanced   → push node on balanced stack, push Lexical (guarded)
//!        balancer   → pop balanced stack, pop Lexical
//!        closeSpan  → pop Explicit
//!        span       → pop Inner
//! ```
//!
//! The top span's guard cuts every match short where the guard matches, so
//! the content of a string cannot run over its closing quote.

use smol_str::SmolStr;

use super::errors::ErrorKind;
use super::stack::Stack;
use crate::pattern::Pattern;
use crate::tree::{AttrValue, Attributes, NodeId, ReferenceTag, Tree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanKind {
    Bare,
    Explicit,
    Inner,
    Lexical,
    Instruction,
}

impl std::fmt::Display for SpanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SpanKind::Bare => "Bare",
            SpanKind::Explicit => "Explicit",
            SpanKind::Inner => "Inner",
            SpanKind::Lexical => "Lexical",
            SpanKind::Instruction => "Instruction",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    pub name: SmolStr,
    pub guard: Option<Pattern>,
}

impl Span {
    pub fn bare() -> Self {
        Self::new(SpanKind::Bare, "Bare")
    }

    pub fn new(kind: SpanKind, name: impl Into<SmolStr>) -> Self {
        Self {
            kind,
            name: name.into(),
            guard: None,
        }
    }
}

pub type SpanStack = Stack<Span>;
pub type BalancedStack = Stack<NodeId>;

fn attr<'a>(attributes: &'a Attributes, key: &str) -> Option<&'a AttrValue> {
    attributes.get(key).filter(|value| value.is_truthy())
}

fn name_of(value: &AttrValue) -> SmolStr {
    value.as_str().map(SmolStr::new).unwrap_or_default()
}

/// Apply the open-phase span effects of a node.
pub(crate) fn open(
    spans: &mut SpanStack,
    ty: &str,
    attributes: &Attributes,
    reference: Option<&ReferenceTag>,
) -> Result<(), ErrorKind> {
    let intrinsic = reference.is_none_or(ReferenceTag::is_intrinsic);
    let balanced = attr(attributes, "balanced");

    if !intrinsic && (balanced.is_some() || attr(attributes, "balancer").is_some()) {
        return Err(ErrorKind::ExpressionBalanced { ty: ty.into() });
    }
    if attr(attributes, "balancedSpan").is_some() && balanced.is_none() {
        return Err(ErrorKind::BalancedSpanWithoutBalanced { ty: ty.into() });
    }

    if let Some(name) = attr(attributes, "openSpan") {
        *spans = spans.push(Span::new(SpanKind::Explicit, name_of(name)));
    }
    if let Some(name) = attr(attributes, "span") {
        *spans = spans.push(Span::new(SpanKind::Inner, name_of(name)));
    }
    Ok(())
}

/// Apply the close-phase span effects of a node.
pub(crate) fn close(
    spans: &mut SpanStack,
    balanced: &mut BalancedStack,
    tree: &Tree,
    node: NodeId,
) -> Result<(), ErrorKind> {
    let view = tree.view(node);
    let attributes = view.attributes();
    let ty = view.ty();

    if let Some(value) = attr(attributes, "balanced") {
        *balanced = balanced.push(node);
        let name = attr(attributes, "balancedSpan")
            .or_else(|| attr(attributes, "innerSpan"))
            .map(name_of)
            .or_else(|| spans.peek().map(|span| span.name.clone()))
            .unwrap_or_default();
        let guard = match value {
            AttrValue::String(text) => Some(Pattern::literal(text.clone())),
            _ => None,
        };
        *spans = spans.push(Span {
            kind: SpanKind::Lexical,
            name,
            guard,
        });
    }

    if attr(attributes, "balancer").is_some() {
        let Some(&opener) = balanced.peek() else {
            return Err(ErrorKind::UnbalancedCloser { ty: ty.into() });
        };
        let opener = tree.view(opener);
        match opener.attribute("balanced") {
            Some(AttrValue::String(expected)) => {
                let found = view.text();
                if found != expected.as_str() {
                    return Err(ErrorKind::BalancerMismatch {
                        expected: expected.clone(),
                        found,
                    });
                }
            }
            Some(value) if value.is_truthy() => {}
            _ => {
                return Err(ErrorKind::NotBalanced {
                    ty: opener.ty().into(),
                });
            }
        }
        *balanced = balanced.pop();
        pop(spans, SpanKind::Lexical)?;
    }

    if attr(attributes, "closeSpan").is_some() {
        pop(spans, SpanKind::Explicit)?;
    }
    if attr(attributes, "span").is_some() {
        pop(spans, SpanKind::Inner)?;
    }
    Ok(())
}

/// Pop the top span, which must be of kind `expected`.
pub(crate) fn pop(spans: &mut SpanStack, expected: SpanKind) -> Result<(), ErrorKind> {
    match spans.peek() {
        Some(span) if span.kind == expected => {
            *spans = spans.pop();
            Ok(())
        }
        Some(span) => Err(ErrorKind::SpanMismatch {
            expected,
            found: span.kind,
        }),
        None => Err(ErrorKind::SpanMismatch {
            expected,
            found: SpanKind::Bare,
        }),
    }
}
