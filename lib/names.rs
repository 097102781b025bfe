//! Path-segment text helpers shared by parsing, display and comparison.
use std::cmp::Ordering;

/// Extension that marks a shortcut.
pub const SHORTCUT_EXTENSION: &str = ".lnk";

/// Whether `c` separates path segments. Both separators are accepted everywhere.
#[must_use]
pub fn is_separator(c: char) -> bool {
    c == '\\' || c == '/'
}

/// Split the first segment off `text`.
///
/// The second value is `None` when no separator follows the segment, and `Some("")` when the
/// separator is the last character.
#[must_use]
pub fn next_segment(text: &str) -> (&str, Option<&str>) {
    match text.find(is_separator) {
        Some(at) => (&text[..at], Some(&text[at + 1..])),
        None => (text, None),
    }
}

/// The extension of `name`, starting at its last dot, or `""`.
///
/// A space or separator after the dot cancels it, so `"a.b c"` has no extension. A leading-dot
/// name is all extension.
#[must_use]
pub fn find_extension(name: &str) -> &str {
    let mut dot = None;
    for (i, c) in name.char_indices() {
        match c {
            '.' => dot = Some(i),
            ' ' | '\\' | '/' => dot = None,
            _ => {}
        }
    }
    dot.map_or("", |i| &name[i..])
}

/// `name` with its extension removed.
#[must_use]
pub fn strip_extension(name: &str) -> &str {
    &name[..name.len() - find_extension(name).len()]
}

/// Case-insensitive ordering on Unicode lowercase folding.
#[must_use]
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Case-insensitive equality on Unicode lowercase folding.
#[must_use]
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    cmp_ignore_case(a, b) == Ordering::Equal
}
