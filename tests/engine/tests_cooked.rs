#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use tagweave::engine::{Effects, Evaluator, Instruction, Script};
use tagweave::source::Chr;
use tagweave::tree::TreeError;
use tagweave::{
    AttrValue, Cx, ErrorKind, Halt, Options, PropertyMatcher, ReferenceTag, Strategy, Tag,
    TextSource,
};

use crate::helpers::{WORDS, close, dedent, doctype, end, open, reference, run, start, words_context};

fn phrase() -> PropertyMatcher {
    PropertyMatcher::new("Phrase")
}

fn word() -> PropertyMatcher {
    PropertyMatcher::new("Word").with_reference(ReferenceTag::cooked())
}

fn phrase_production(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat(word()).map(drop)
}

fn word_production(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat_regex("[a-z]+").map(drop)
}

fn words_strategy() -> Strategy {
    Strategy::new()
        .with(WORDS, "Phrase", phrase_production)
        .with(WORDS, "Word", word_production)
}

/// Open a phrase and a cooked word in it.
fn opened_word() -> Vec<Instruction> {
    vec![
        doctype(WORDS),
        start(phrase(), Effects::EAT),
        open(WORDS, &phrase()),
        start(word(), Effects::EAT),
        reference("@"),
        open(WORDS, &word()),
    ]
}

#[test]
fn test_cooked_value_is_bound_at_close() {
    let parse = tagweave::parse(
        &words_context(),
        &words_strategy(),
        WORDS,
        Box::new(TextSource::new("hi")),
        phrase(),
        Options::default(),
    )
    .unwrap();
    let expected = r#"
    <Phrase>
      @:
      <Word cooked='HI'>
        'hi'
      </>
    </>
    "#;
    assert_eq!(parse.print(), dedent(expected));
}

#[test]
fn test_cooked_phrase_emits_after_close() {
    let ctx = words_context();
    let mut instructions = opened_word();
    instructions.push(Instruction::Advance(Tag::literal("hi")));

    let (mut eval, _, result) = run(&ctx, "hi", Options::default(), instructions);
    result.unwrap();
    assert_eq!(eval.pending().count(), 1);

    eval.run(&mut Script::new([close(), end(), close(), end()]))
        .unwrap();
    eval.finish().unwrap();
    assert_eq!(eval.pending().count(), 7);
}

#[test]
fn test_gap_cooks_to_null() {
    let ctx = words_context();
    let mut eval = Evaluator::new(
        &ctx,
        Box::new(TextSource::from_chrs([Chr::Gap])),
        Options::default(),
    );
    let mut instructions = opened_word();
    instructions.extend([Instruction::Advance(Tag::Gap), close(), end()]);
    let mut script = Script::new(instructions);
    eval.run(&mut script).unwrap();

    let word = script.outcomes()[3].frame().unwrap();
    let node = eval.frame(word).node().unwrap();
    assert_eq!(node.attribute("cooked"), Some(&AttrValue::Null));
    assert!(node.flags().has_gap);
}

#[test]
fn test_cooked_value_cannot_be_rebound() {
    let ctx = words_context();
    let mut instructions = opened_word();
    instructions.extend([Instruction::Advance(Tag::literal("hi")), close(), end()]);
    let (mut eval, script, result) = run(&ctx, "hi", Options::default(), instructions);
    result.unwrap();

    let word = script.outcomes()[3].frame().unwrap();
    let err = eval
        .dispatch(Instruction::BindAttribute {
            frame: Some(word),
            key: "cooked".into(),
            value: "HEY".into(),
        })
        .unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::Tree(TreeError::NotAwaitingBinding {
            key: "cooked".into()
        })
    );
}

#[test]
fn test_binding_needs_a_captured_frame() {
    let ctx = words_context();
    let (mut eval, _, result) = run(&ctx, "hi", Options::default(), opened_word());
    result.unwrap();

    let running = eval.current_frame();
    let err = eval
        .dispatch(Instruction::BindAttribute {
            frame: running,
            key: "cooked".into(),
            value: "HI".into(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::FrameNotCaptured);
}

#[test]
fn test_binding_on_rejected_frame() {
    let ctx = words_context();
    let mut instructions = opened_word();
    instructions.truncate(3);
    instructions.extend([start(word(), Effects::EAT_MATCH), Instruction::Throw]);
    let (mut eval, script, result) = run(&ctx, "hi", Options::default(), instructions);
    result.unwrap();

    let rejected = script.outcomes()[3].frame().unwrap();
    let err = eval
        .dispatch(Instruction::BindAttribute {
            frame: Some(rejected),
            key: "cooked".into(),
            value: "HI".into(),
        })
        .unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::FrameRejected);
}
