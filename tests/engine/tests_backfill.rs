#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use rstest::rstest;
use tagweave::{Cx, Effects, FrameOptions, Halt, Options, PropertyMatcher, Strategy};

use crate::helpers::dedent;
use crate::helpers::json::{self, LANGUAGE, element, punctuator, separator};

fn array(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat(punctuator("[").bind("open").attr("balanced", "]"))?;
    if cx.invoke(element(), Effects::EAT_MATCH, FrameOptions::with_backfill())? {
        while cx.eat_match(separator())? {
            cx.eat(element())?;
        }
    }
    cx.eat(punctuator("]").bind("close").attr("balancer", true))?;
    Ok(())
}

fn string(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat(
        punctuator("\"")
            .bind("open")
            .attr("balanced", "\"")
            .attr("innerSpan", "String"),
    )?;
    let content = PropertyMatcher::new("StringContent").bind("content");
    cx.invoke(content, Effects::EAT_MATCH, FrameOptions::with_backfill())?;
    cx.eat(punctuator("\"").bind("close").attr("balancer", true))?;
    Ok(())
}

fn backfilling() -> Strategy {
    json::strategy()
        .with(LANGUAGE, "Array", array)
        .with(LANGUAGE, "String", string)
}

#[rstest]
#[case::empty_array(
    "[]",
    r#"
    <Array>
      open:
      <Punctuator balanced=']'>
        '['
      </>
      elements[]:
      []
      close:
      <Punctuator balancer>
        ']'
      </>
    </>
    "#
)]
#[case::empty_string(
    r#""""#,
    r#"
    <String>
      open:
      <Punctuator balanced='"' innerSpan='String'>
        '"'
      </>
      content:
      null
      close:
      <Punctuator balancer>
        '"'
      </>
    </>
    "#
)]
fn test_failed_optional_slot_is_backfilled(#[case] source: &str, #[case] expected: &str) {
    let parse = json::parse_with(&json::context(), &backfilling(), source, Options::default())
        .unwrap();
    assert_eq!(parse.print(), dedent(expected));
}

#[rstest]
#[case("[1,2]")]
#[case(r#""abc""#)]
fn test_matched_slot_is_not_backfilled(#[case] source: &str) {
    let parse = json::parse_with(&json::context(), &backfilling(), source, Options::default())
        .unwrap();
    assert_eq!(parse.print(), json::parse(source).unwrap().print());
}

#[test]
fn test_backfilled_slot_counts_as_set() {
    let parse = json::parse_with(&json::context(), &backfilling(), r#"["",[]]"#, Options::default())
        .unwrap();
    let root = parse.root().unwrap();
    let elements = root.get_all("elements");
    assert_eq!(elements.len(), 2);
    assert!(elements[0].has("content"));
    assert!(elements[0].get("content").is_none());
    assert!(elements[1].has("elements"));
    assert!(elements[1].get_all("elements").is_empty());
}
