//! Text normalization shared by text filters and option matching.

/// Characters removed outright: zero-width space and directional marks.
const INVISIBLE: &[char] = &['\u{200b}', '\u{200e}', '\u{200f}'];

/// Collapses every whitespace run (NBSP included) into one space, drops
/// zero-width characters and trims both ends.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().filter(|c| !INVISIBLE.contains(c)) {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}
