#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use rstest::rstest;
use tagweave::{Context, Cx, ErrorKind, Halt, Language, Options, PropertyMatcher, Strategy};

use crate::helpers::json::{self, LANGUAGE, element, punctuator, separator};
use crate::helpers::dedent;

// ============================================================================
// Alternatives sharing a prefix
// ============================================================================

/// `[` elements `|`: shares its opening with `Array` and fails late.
fn tuple(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat(punctuator("[").bind("open"))?;
    cx.eat(element())?;
    cx.eat(punctuator("|").bind("close"))?;
    Ok(())
}

/// Tries `Tuple` before the JSON alternatives and checks that a failed
/// attempt leaves the tree as it was.
fn tuple_first(cx: &mut Cx<'_, '_>, matcher: &PropertyMatcher) -> Result<(), Halt> {
    let before = cx.state()?.node().map(|node| node.tags());
    if cx.eat_match(PropertyMatcher::new("Tuple"))? {
        return Ok(());
    }
    let after = cx.state()?.node().map(|node| node.tags());
    assert_eq!(before, after);
    json::expression(cx, matcher)
}

fn tuple_context() -> Context {
    let grammar = json::builder(&["Tuple"])
        .node("Tuple", ["open", "elements[]", "close"])
        .build()
        .unwrap();
    Context::new().with_language(Language::new(LANGUAGE, grammar))
}

fn tuple_strategy() -> Strategy {
    json::strategy()
        .with(LANGUAGE, "Expression", tuple_first)
        .with(LANGUAGE, "Tuple", tuple)
}

#[rstest]
#[case("[1]")]
#[case("[[1],[]]")]
#[case(r#"{"a":[true]}"#)]
fn test_failed_alternative_leaves_no_trace(#[case] source: &str) {
    let parse = json::parse_with(&tuple_context(), &tuple_strategy(), source, Options::default())
        .unwrap();
    assert_eq!(parse.print(), json::parse(source).unwrap().print());
}

#[test]
fn test_later_alternative_wins_when_earlier_fails() {
    let parse =
        json::parse_with(&tuple_context(), &tuple_strategy(), "[1|", Options::default()).unwrap();
    let expected = r#"
    <Tuple>
      open:
      <Punctuator>
        '['
      </>
      elements[]:
      <Number>
        digits[]:
        <Digit>
          '1'
        </>
      </>
      close:
      <Punctuator>
        '|'
      </>
    </>
    "#;
    assert_eq!(parse.print(), dedent(expected));
}

#[test]
fn test_nested_backtracking() {
    let parse =
        json::parse_with(&tuple_context(), &tuple_strategy(), "[[2|]", Options::default()).unwrap();
    let root = parse.root().unwrap();
    assert_eq!(root.ty(), "Array");
    let elements = root.get_all("elements");
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].ty(), "Tuple");
    assert_eq!(elements[0].text(), "[2|");
}

// ============================================================================
// Lookahead
// ============================================================================

fn close() -> PropertyMatcher {
    punctuator("]").bind("close").attr("balancer", true)
}

/// `Array` that peeks for an immediate `]` instead of trying an element.
fn peeking_array(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat(punctuator("[").bind("open").attr("balanced", "]"))?;
    let offset = cx.state()?.offset();
    let empty = cx.matches(close())?;
    assert_eq!(cx.state()?.offset(), offset);
    if !empty {
        cx.eat(element())?;
        while cx.eat_match(separator())? {
            cx.eat(element())?;
        }
    }
    cx.eat(close())?;
    Ok(())
}

#[rstest]
#[case("[]")]
#[case("[1,[]]")]
fn test_matches_consumes_nothing(#[case] source: &str) {
    let strategy = json::strategy().with(LANGUAGE, "Array", peeking_array);
    let parse = json::parse_with(&json::context(), &strategy, source, Options::default()).unwrap();
    assert_eq!(parse.print(), json::parse(source).unwrap().print());
}

/// `Expression` that only admits arrays, checked with a guard.
fn arrays_only(cx: &mut Cx<'_, '_>, matcher: &PropertyMatcher) -> Result<(), Halt> {
    cx.guard(punctuator("["))?;
    json::expression(cx, matcher)
}

#[test]
fn test_guard_passes_without_consuming() {
    let strategy = json::strategy().with(LANGUAGE, "Expression", arrays_only);
    let parse = json::parse_with(&json::context(), &strategy, "[[]]", Options::default()).unwrap();
    assert_eq!(parse.print(), json::parse("[[]]").unwrap().print());
}

#[rstest]
#[case("true")]
#[case("[1]")]
fn test_failed_guard_fails_the_caller(#[case] source: &str) {
    let strategy = json::strategy().with(LANGUAGE, "Expression", arrays_only);
    let err = json::parse_with(&json::context(), &strategy, source, Options::default()).unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::NoMatch {
            ty: "Expression".into()
        }
    );
}
