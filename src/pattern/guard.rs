//! Lexical guards
//!
//! A lexical span carries a guard pattern: content matched inside the span
//! may not run over the first position where the guard matches. This is how
//! string content stops at its closing delimiter.
//!
//! The guard is only searched for inside the unguarded match, so matching
//! costs the length of the match rather than the rest of the input. End
//! assertions (`$`, `\b`) see the end of the unguarded text.

use super::Pattern;

/// The non-empty prefix of `text` that `pattern` matches without running
/// into `guard`.
pub fn find_guarded<'t>(pattern: &Pattern, text: &'t str, guard: &Pattern) -> Option<&'t str> {
    let found = pattern.find(text)?;
    match guard_before(text, guard, found.len()) {
        Some(stop) => pattern.find(&text[..stop]),
        None => Some(found),
    }
}

/// First position before `limit` where `guard` matches.
fn guard_before(text: &str, guard: &Pattern, limit: usize) -> Option<usize> {
    text.char_indices()
        .map(|(at, _)| at)
        .take_while(|&at| at < limit)
        .find(|&at| guard.find(&text[at..]).is_some())
}
