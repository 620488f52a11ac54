#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use rstest::rstest;
use tagweave::engine::{Effects, Instruction, MatchTarget};
use tagweave::tree::TreeError;
use tagweave::{ErrorKind, Options, PropertyMatcher, Tag};

use crate::helpers::json::{self, LANGUAGE};
use crate::helpers::{
    array_reference, close, doctype, end, literal, open, punctuator, reference, run, start,
};

fn array() -> PropertyMatcher {
    PropertyMatcher::new("Array")
}

/// The document with an open `Array` node.
fn in_array() -> Vec<Instruction> {
    vec![
        doctype(LANGUAGE),
        start(array(), Effects::EAT),
        open(LANGUAGE, &array()),
    ]
}

fn with(mut head: Vec<Instruction>, tail: impl IntoIterator<Item = Instruction>) -> Vec<Instruction> {
    head.extend(tail);
    head
}

#[rstest]
#[case::duplicate_doctype(
    vec![doctype(LANGUAGE), doctype(LANGUAGE)],
    ErrorKind::DuplicateDoctype
)]
#[case::unknown_language(
    vec![doctype("xml")],
    ErrorKind::UnknownLanguage { name: "xml".into() }
)]
#[case::frame_before_document(
    vec![start(array(), Effects::EAT)],
    ErrorKind::NoDocument
)]
#[case::literal_before_document(vec![literal("[")], ErrorKind::NoDocument)]
#[case::unknown_production(
    vec![doctype(LANGUAGE), start(PropertyMatcher::new("Tuple"), Effects::EAT)],
    ErrorKind::UnknownProduction { language: LANGUAGE.into(), ty: "Tuple".into() }
)]
#[case::expected_token(
    vec![doctype(LANGUAGE), start(array().token(), Effects::EAT)],
    ErrorKind::ExpectedToken { ty: "Array".into() }
)]
#[case::unknown_property(
    with(in_array(), [reference("nope")]),
    ErrorKind::UnknownProperty { ty: "Array".into(), name: "nope".into() }
)]
#[case::array_reference_to_single_slot(
    with(in_array(), [array_reference("open")]),
    ErrorKind::UnknownProperty { ty: "Array".into(), name: "open".into() }
)]
#[case::missing_reference(
    with(in_array(), [start(punctuator("["), Effects::EAT), open(LANGUAGE, &punctuator("["))]),
    ErrorKind::MissingReference { ty: "Punctuator".into() }
)]
#[case::dangling_reference(
    with(in_array(), [reference("open"), reference("close")]),
    ErrorKind::DanglingReference { name: "open".into() }
)]
#[case::double_binding(
    with(in_array(), [reference("open"), Instruction::Advance(Tag::Null), reference("open")]),
    ErrorKind::Tree(TreeError::DoubleBinding { name: "open".into() })
)]
#[case::literal_mismatch(
    with(in_array(), [reference("open"), open(LANGUAGE, &punctuator("[")), literal("{")]),
    ErrorKind::LiteralMismatch { text: "{".into() }
)]
#[case::gap_expected(
    with(in_array(), [Instruction::Advance(Tag::Gap)]),
    ErrorKind::GapExpected
)]
#[case::close_below_root(vec![doctype(LANGUAGE), close()], ErrorKind::CloseOutsideBranch)]
#[case::close_below_branch(
    vec![doctype(LANGUAGE), start(array(), Effects::EAT_MATCH), close()],
    ErrorKind::CloseOutsideBranch
)]
#[case::not_matchable(
    vec![
        doctype(LANGUAGE),
        Instruction::Match(MatchTarget::Property(Box::new(array()))),
    ],
    ErrorKind::NotMatchable { ty: "Array".into() }
)]
#[case::end_without_frame(vec![doctype(LANGUAGE), end()], ErrorKind::NoFrame)]
#[case::throw_without_frame(vec![doctype(LANGUAGE), Instruction::Throw], ErrorKind::NoFrame)]
#[case::expression_balanced(
    with(
        in_array(),
        [
            Instruction::Advance(Tag::Reference(tagweave::ReferenceTag::new("open").expression())),
            open(LANGUAGE, &punctuator("[").attr("balanced", "]")),
        ]
    ),
    ErrorKind::ExpressionBalanced { ty: "Punctuator".into() }
)]
fn test_contract_violations(#[case] instructions: Vec<Instruction>, #[case] expected: ErrorKind) {
    let ctx = json::context();
    let (_, _, result) = run(&ctx, "[]", Options::default(), instructions);
    assert_eq!(result.unwrap_err().kind(), &expected);
}

#[test]
fn test_embedded_node_cannot_be_advanced() {
    let ctx = json::context();
    let (mut eval, _, result) = run(&ctx, "", Options::default(), vec![doctype(LANGUAGE)]);
    result.unwrap();
    let document = eval.document().unwrap();
    let err = eval
        .dispatch(Instruction::Advance(Tag::EmbeddedNode(document)))
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnexpectedEmbeddedNode);
}

#[rstest]
#[case::frames_open(in_array(), ErrorKind::FramesOpen { depth: 1 })]
#[case::source_not_done(vec![doctype(LANGUAGE)], ErrorKind::SourceNotDone)]
#[case::no_document(vec![], ErrorKind::NoDocument)]
fn test_finish_checks(#[case] instructions: Vec<Instruction>, #[case] expected: ErrorKind) {
    let ctx = json::context();
    let (mut eval, _, result) = run(&ctx, "[]", Options::default(), instructions);
    result.unwrap();
    assert_eq!(eval.finish().unwrap_err().kind(), &expected);
}

#[test]
fn test_error_carries_context() {
    let ctx = json::context();
    let (_, _, result) = run(
        &ctx,
        "[]",
        Options::default(),
        with(
            in_array(),
            [reference("open"), open(LANGUAGE, &punctuator("[")), literal("[")],
        )
        .into_iter()
        .chain([close(), reference("nope")])
        .collect(),
    );
    let err = result.unwrap_err();
    let context = err.context.clone().unwrap();
    assert_eq!(context.node_type.as_deref(), Some("Array"));
    assert_eq!(u32::from(context.offset), 1);
    assert_eq!(
        err.to_string(),
        "`Array` has no property `nope` at 1:2 (offset 1) in `Array`"
    );
}
