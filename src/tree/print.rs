//! Text rendering of a tag stream
//!
//! One tag per line, children indented under their open tag:
//!
//! ```text
//! <Array>
//!   open:
//!   <Punctuator balanced=']'>
//!     '['
//!   </>
//!   elements[]:
//!   null
//! </>
//! ```

use super::tags::{AttrValue, Attributes, NodeFlags, Tag};

/// Renders emitted tags as indented text.
#[derive(Debug, Clone)]
pub struct Printer {
    indent: usize,
    doctype: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self {
            indent: 2,
            doctype: false,
        }
    }
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the `<!0:cstml ...>` doctype line.
    pub fn with_doctype(mut self, doctype: bool) -> Self {
        self.doctype = doctype;
        self
    }

    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn print<'a>(&self, tags: impl IntoIterator<Item = &'a Tag>) -> String {
        let mut lines = Vec::new();
        let mut depth = 0usize;

        for tag in tags {
            let line = match tag {
                Tag::Doctype(doctype) => {
                    if !self.doctype {
                        continue;
                    }
                    let mut line = format!("<!0:cstml bablr-language='{}'", escape(&doctype.language));
                    push_attributes(&mut line, &doctype.attributes);
                    line.push('>');
                    line
                }
                Tag::OpenNode(open) => {
                    let mut line = format!("<{}{}", flag_sigils(open.flags), open.ty);
                    push_attributes(&mut line, &open.attributes);
                    line.push('>');
                    lines.push(self.indented(depth, &line));
                    depth += 1;
                    continue;
                }
                Tag::CloseNode => {
                    depth = depth.saturating_sub(1);
                    "</>".to_string()
                }
                Tag::Literal(text) => format!("'{}'", escape(text)),
                Tag::Gap => "<//>".to_string(),
                Tag::Shift => "^^^".to_string(),
                Tag::Reference(reference) => {
                    let brackets = if reference.is_array { "[]" } else { "" };
                    let sigil = if reference.flags.expression { "+" } else { "" };
                    format!("{}{sigil}{brackets}:", reference.name)
                }
                Tag::EmbeddedNode(id) => format!("<#{}>", id.index()),
                Tag::Null => "null".to_string(),
                Tag::ArrayInitializer => "[]".to_string(),
            };
            lines.push(self.indented(depth, &line));
        }

        lines.join("\n")
    }

    fn indented(&self, depth: usize, line: &str) -> String {
        format!("{:width$}{line}", "", width = depth * self.indent)
    }
}

fn flag_sigils(flags: NodeFlags) -> String {
    let mut sigils = String::new();
    if flags.trivia {
        sigils.push('#');
    }
    if flags.token {
        sigils.push('*');
    }
    if flags.has_gap {
        sigils.push('$');
    }
    sigils
}

fn push_attributes(line: &mut String, attributes: &Attributes) {
    for (key, value) in attributes {
        match value {
            AttrValue::Bool(true) => line.push_str(&format!(" {key}")),
            AttrValue::Bool(false) => line.push_str(&format!(" {key}=false")),
            AttrValue::String(s) => line.push_str(&format!(" {key}='{}'", escape(s))),
            AttrValue::Null => line.push_str(&format!(" {key}=null")),
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for chr in text.chars() {
        match chr {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(chr),
        }
    }
    out
}
