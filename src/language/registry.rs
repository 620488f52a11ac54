//! Language registry
//!
//! A [`Context`] maps language names to [`Language`]s. A language owns its
//! grammar, a table of dependency aliases used to resolve matchers that name
//! another language, and an optional hook computing cooked values.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::grammar::Grammar;
use crate::tree::NodeView;

/// Computes the cooked value of a closed node, given the active span name.
pub type CookFn = Box<dyn Fn(&NodeView<'_>, &str) -> Option<String>>;

pub struct Language {
    name: SmolStr,
    grammar: Grammar,
    dependencies: FxHashMap<SmolStr, SmolStr>,
    cook: Option<CookFn>,
}

impl std::fmt::Debug for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Language")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("cook", &self.cook.is_some())
            .finish()
    }
}

impl Language {
    pub fn new(name: impl Into<SmolStr>, grammar: Grammar) -> Self {
        Self {
            name: name.into(),
            grammar,
            dependencies: FxHashMap::default(),
            cook: None,
        }
    }

    /// Make `language` reachable from matchers as `alias`.
    pub fn with_dependency(mut self, alias: impl Into<SmolStr>, language: impl Into<SmolStr>) -> Self {
        self.dependencies.insert(alias.into(), language.into());
        self
    }

    pub fn with_cook(mut self, cook: impl Fn(&NodeView<'_>, &str) -> Option<String> + 'static) -> Self {
        self.cook = Some(Box::new(cook));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn dependency(&self, alias: &str) -> Option<&str> {
        self.dependencies.get(alias).map(SmolStr::as_str)
    }

    /// The cooked value of `node`, or `None` when the language has no hook.
    pub fn cooked(&self, node: &NodeView<'_>, span: &str) -> Option<String> {
        self.cook.as_ref().and_then(|cook| cook(node, span))
    }
}

/// Registry of languages available to a parse.
#[derive(Debug, Default)]
pub struct Context {
    languages: FxHashMap<SmolStr, Language>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.register(language);
        self
    }

    pub fn register(&mut self, language: Language) {
        self.languages.insert(language.name.clone(), language);
    }

    pub fn get(&self, name: &str) -> Option<&Language> {
        self.languages.get(name)
    }

    /// Resolve a language path relative to `from`.
    ///
    /// An empty path is `from` itself; each segment is looked up among the
    /// current language's dependency aliases. A single segment that is not an
    /// alias may also name a registered language directly.
    pub fn resolve(&self, from: &str, path: &[SmolStr]) -> Option<&Language> {
        let mut current = self.get(from)?;
        for segment in path {
            current = match current.dependency(segment) {
                Some(name) => self.get(name)?,
                None if path.len() == 1 => self.get(segment)?,
                None => return None,
            };
        }
        Some(current)
    }
}
