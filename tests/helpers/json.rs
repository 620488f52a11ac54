//! A JSON subset: strings without escapes, integers, arrays, objects,
//! booleans and null. No whitespace.

use tagweave::engine::Options;
use tagweave::language::GrammarBuilder;
use tagweave::{
    Context, Cx, EngineError, Grammar, Halt, Language, Parse, PropertyMatcher, Strategy, TextSource,
};

pub const LANGUAGE: &str = "json";

pub const MEMBERS: [&str; 6] = ["String", "Number", "Array", "Object", "Boolean", "Null"];

/// The JSON grammar, with `extra` types added to the `Expression` cover.
pub fn builder(extra: &[&'static str]) -> GrammarBuilder {
    Grammar::builder()
        .cover("Expression", MEMBERS.iter().chain(extra).copied())
        .node("String", ["open", "content", "close"])
        .token("StringContent")
        .node("Number", ["digits[]"])
        .token("Digit")
        .node("Array", ["open", "elements[]", "separators[]", "close"])
        .node("Object", ["open", "properties[]", "separators[]", "close"])
        .node("Property", ["key", "mapOperator", "value"])
        .node("Boolean", ["value"])
        .node("Null", ["value"])
        .token("Keyword")
        .token("Punctuator")
}

pub fn grammar() -> Grammar {
    builder(&[]).build().unwrap()
}

pub fn context() -> Context {
    Context::new().with_language(Language::new(LANGUAGE, grammar()))
}

pub fn strategy() -> Strategy {
    Strategy::new()
        .with(LANGUAGE, "Expression", expression)
        .with(LANGUAGE, "String", string)
        .with(LANGUAGE, "StringContent", string_content)
        .with(LANGUAGE, "Number", number)
        .with(LANGUAGE, "Digit", digit)
        .with(LANGUAGE, "Array", array)
        .with(LANGUAGE, "Object", object)
        .with(LANGUAGE, "Property", property)
        .with(LANGUAGE, "Boolean", boolean)
        .with(LANGUAGE, "Null", null)
}

pub fn parse(text: &str) -> Result<Parse, EngineError> {
    parse_with(&context(), &strategy(), text, Options::default())
}

pub fn parse_with(
    ctx: &Context,
    strategy: &Strategy,
    text: &str,
    options: Options,
) -> Result<Parse, EngineError> {
    tagweave::parse(
        ctx,
        strategy,
        LANGUAGE,
        Box::new(TextSource::new(text)),
        PropertyMatcher::new("Expression"),
        options,
    )
}

// ============================================================================
// Matchers
// ============================================================================

pub fn punctuator(text: &str) -> PropertyMatcher {
    PropertyMatcher::new("Punctuator").literal(text)
}

pub fn keyword(text: &str) -> PropertyMatcher {
    PropertyMatcher::new("Keyword").bind("value").literal(text)
}

pub fn element() -> PropertyMatcher {
    PropertyMatcher::new("Expression").bind_array("elements")
}

pub fn separator() -> PropertyMatcher {
    punctuator(",").bind_array("separators")
}

// ============================================================================
// Productions
// ============================================================================

pub fn expression(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    for ty in MEMBERS {
        if cx.eat_match(PropertyMatcher::new(ty))? {
            return Ok(());
        }
    }
    Err(Halt::Fail)
}

pub fn string(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat(
        punctuator("\"")
            .bind("open")
            .attr("balanced", "\"")
            .attr("innerSpan", "String"),
    )?;
    cx.eat_match(PropertyMatcher::new("StringContent").bind("content"))?;
    cx.eat(punctuator("\"").bind("close").attr("balancer", true))?;
    Ok(())
}

pub fn string_content(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat_regex("[^\\n]+").map(drop)
}

pub fn number(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    let digit = || PropertyMatcher::new("Digit").bind_array("digits");
    cx.eat(digit())?;
    while cx.eat_match(digit())? {}
    Ok(())
}

pub fn digit(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat_regex("[0-9]").map(drop)
}

pub fn array(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat(punctuator("[").bind("open").attr("balanced", "]"))?;
    if cx.eat_match(element())? {
        while cx.eat_match(separator())? {
            cx.eat(element())?;
        }
    }
    cx.eat(punctuator("]").bind("close").attr("balancer", true))?;
    Ok(())
}

pub fn object(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    let property = || PropertyMatcher::new("Property").bind_array("properties");
    cx.eat(punctuator("{").bind("open").attr("balanced", "}"))?;
    if cx.eat_match(property())? {
        while cx.eat_match(separator())? {
            cx.eat(property())?;
        }
    }
    cx.eat(punctuator("}").bind("close").attr("balancer", true))?;
    Ok(())
}

pub fn property(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat(PropertyMatcher::new("String").bind("key"))?;
    cx.eat(punctuator(":").bind("mapOperator"))?;
    cx.eat(PropertyMatcher::new("Expression").bind("value"))?;
    Ok(())
}

pub fn boolean(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    if !cx.eat_match(keyword("true"))? {
        cx.eat(keyword("false"))?;
    }
    Ok(())
}

pub fn null(cx: &mut Cx<'_, '_>, _: &PropertyMatcher) -> Result<(), Halt> {
    cx.eat(keyword("null")).map(drop)
}
