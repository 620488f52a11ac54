#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use tagweave::engine::{Effects, Evaluator, FrameOptions, Instruction, Script};
use tagweave::{AttrValue, Options, PropertyMatcher, Tag, TextSource};

use crate::helpers::json::{self, LANGUAGE};
use crate::helpers::{close, doctype, drain_tags, empty_array, end, open, punctuator, run, start, token};

fn is_open(tag: &Tag) -> bool {
    matches!(tag, Tag::OpenNode(_))
}

#[test]
fn test_output_is_well_nested() {
    let parse = json::parse(r#"[1,{"a":[true,null]},"x"]"#).unwrap();
    let tags: Vec<&Tag> = parse.tags().collect();
    assert!(matches!(tags.first(), Some(Tag::Doctype(_))));

    let mut depth = 0i32;
    for (i, tag) in tags.iter().enumerate() {
        match tag {
            Tag::OpenNode(_) => depth += 1,
            Tag::CloseNode => depth -= 1,
            Tag::Reference(_) => {
                let next = tags.get(i + 1).copied();
                assert!(
                    next.is_some_and(|next| is_open(next)
                        || matches!(next, Tag::Null | Tag::ArrayInitializer)),
                    "reference at {i} is followed by {next:?}"
                );
            }
            _ => {}
        }
        assert!(depth >= 0, "close without open at {i}");
    }
    assert_eq!(depth, 0);
}

#[test]
fn test_emission_waits_for_root_node_to_close() {
    let ctx = json::context();
    let mut instructions = vec![doctype(LANGUAGE)];
    instructions.extend(empty_array(Effects::EAT));
    let (head, tail) = instructions.split_at(instructions.len() - 8);

    let (mut eval, _, result) = run(&ctx, "[]", Options::default(), head.to_vec());
    result.unwrap();
    let pending: Vec<&Tag> = eval.pending().filter_map(|item| item.as_tag()).collect();
    assert_eq!(pending.len(), 1);
    assert!(matches!(pending[0], Tag::Doctype(_)));

    eval.run(&mut Script::new(tail.to_vec())).unwrap();
    eval.finish().unwrap();
    let tags = drain_tags(&mut eval);
    assert_eq!(tags.len(), 11);
    assert_eq!(tags.iter().filter(|tag| is_open(tag)).count(), 3);
    assert_eq!(tags.last(), Some(&Tag::CloseNode));
}

#[test]
fn test_nothing_is_emitted_from_a_branch() {
    let ctx = json::context();
    let mut instructions = vec![doctype(LANGUAGE)];
    instructions.extend(empty_array(Effects::EAT_MATCH));
    let end = instructions.pop().unwrap();
    assert_eq!(end, Instruction::EndFrame);

    let (mut eval, _, result) = run(&ctx, "[]", Options::default(), instructions);
    result.unwrap();
    assert_eq!(eval.pending().count(), 1);
    assert_eq!(eval.state(eval.current_state()).depth(), 1);

    eval.dispatch(end).unwrap();
    assert_eq!(eval.state(eval.current_state()).depth(), 0);
    eval.finish().unwrap();
    assert_eq!(drain_tags(&mut eval).len(), 11);
}

#[test]
fn test_rejected_branch_emits_nothing() {
    let ctx = json::context();
    let array = tagweave::PropertyMatcher::new("Array");
    let mut eval = Evaluator::new(&ctx, Box::new(TextSource::new("[]")), Options::default());
    let mut script = Script::new([
        doctype(LANGUAGE),
        start(array.clone(), Effects::EAT_MATCH),
        open(LANGUAGE, &array),
        Instruction::Throw,
    ]);
    eval.run(&mut script).unwrap();

    assert_eq!(drain_tags(&mut eval).len(), 1);
    let document = eval.tree().view(eval.document().unwrap());
    assert_eq!(document.len(), 1);
    assert_eq!(eval.state(eval.current_state()).offset(), 0);
}

#[test]
fn test_emission_waits_for_declared_attribute() {
    let ctx = json::context();
    let array = PropertyMatcher::new("Array");
    let mut instructions = vec![
        doctype(LANGUAGE),
        Instruction::StartFrame {
            matcher: Box::new(array.clone()),
            effects: Effects::EAT,
            options: FrameOptions::with_unbound(["count"]),
        },
        open(LANGUAGE, &array),
    ];
    instructions.extend(token(LANGUAGE, "open", punctuator("[").attr("balanced", "]")));
    instructions.extend(token(LANGUAGE, "close", punctuator("]").attr("balancer", true)));
    instructions.extend([close(), end()]);

    let (mut eval, script, result) = run(&ctx, "[]", Options::default(), instructions);
    result.unwrap();
    assert_eq!(eval.pending().count(), 1);
    let array_frame = script.outcomes()[1].frame().unwrap();
    assert!(eval.frame(array_frame).node().unwrap().is_closed());

    eval.dispatch(Instruction::BindAttribute {
        frame: Some(array_frame),
        key: "count".into(),
        value: "0".into(),
    })
    .unwrap();
    eval.finish().unwrap();
    let tags = drain_tags(&mut eval);
    assert_eq!(tags.len(), 11);
    let Tag::OpenNode(open) = &tags[1] else {
        panic!("expected the array to open, got {:?}", tags[1]);
    };
    assert_eq!(open.attributes.get("count"), Some(&AttrValue::from("0")));
}

#[test]
fn test_unbound_attribute_blocks_finish() {
    let ctx = json::context();
    let null = PropertyMatcher::new("Null");
    let mut eval = Evaluator::new(&ctx, Box::new(TextSource::new("")), Options::default());
    let mut script = Script::new([
        doctype(LANGUAGE),
        Instruction::StartFrame {
            matcher: Box::new(null.clone()),
            effects: Effects::EAT,
            options: FrameOptions::with_unbound(["value"]),
        },
        open(LANGUAGE, &null),
        close(),
        end(),
    ]);
    eval.run(&mut script).unwrap();
    let err = eval.finish().unwrap_err();
    assert_eq!(err.kind(), &tagweave::ErrorKind::EmissionIncomplete);
}
