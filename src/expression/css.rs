//! CSS selector helpers.

// ============================================================================
// Escaping
// ============================================================================

/// Escapes `value` for use as a CSS identifier (`#id`, `.class`).
///
/// Follows `CSS.escape`: a leading digit is written as a code point escape,
/// other characters outside `[a-zA-Z0-9_-]` and non-ASCII ranges get a
/// backslash.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    let mut chars = value.chars().peekable();

    if let Some(&first) = chars.peek()
        && (first == '-' || first == '_')
    {
        out.push(first);
        chars.next();
    }

    if let Some(first) = chars.next() {
        if is_name_start(first) {
            out.push(first);
        } else {
            push_escaped(&mut out, first);
        }
    }

    for c in chars {
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii() {
            out.push(c);
        } else {
            push_escaped(&mut out, c);
        }
    }

    out
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || !c.is_ascii()
}

fn push_escaped(out: &mut String, c: char) {
    if (' '..='~').contains(&c) && !c.is_ascii_alphanumeric() {
        out.push('\\');
        out.push(c);
    } else {
        out.push_str(&format!("\\{:06x}", u32::from(c)));
    }
}

/// Quotes an attribute value with single quotes.
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

// ============================================================================
// Splitting
// ============================================================================

/// Splits a selector list on its top-level commas.
///
/// Commas inside brackets, parentheses or quoted strings do not split.
#[must_use]
pub fn split(selector: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in selector.chars() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }

        match (quote, c) {
            (_, '\\') => {
                escaped = true;
                current.push(c);
            }
            (Some(q), c) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), _) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                current.push(c);
            }
            (None, '[' | '(') => {
                depth += 1;
                current.push(c);
            }
            (None, ']' | ')') => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            (None, ',') if depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            (None, _) => current.push(c),
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

/// Appends `suffix` to every selector in a list.
#[must_use]
pub fn append_to_each(selector: &str, suffix: &str) -> String {
    split(selector)
        .into_iter()
        .map(|part| format!("{part}{suffix}"))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_plain() {
        assert_eq!(escape("submit-button"), "submit-button");
        assert_eq!(escape("_x"), "_x");
    }

    #[test]
    fn test_escape_leading_digit() {
        assert_eq!(escape("1st"), "\\000031st");
    }

    #[test]
    fn test_escape_punctuation() {
        assert_eq!(escape("a.b"), "a\\.b");
        assert_eq!(escape("user:name"), "user\\:name");
    }

    #[test]
    fn test_split_top_level() {
        assert_eq!(
            split("input:not([type=submit]), textarea, select"),
            vec!["input:not([type=submit])", "textarea", "select"]
        );
    }

    #[test]
    fn test_split_ignores_nested_commas() {
        assert_eq!(
            split("a[title='x, y'], :is(b, c)"),
            vec!["a[title='x, y']", ":is(b, c)"]
        );
    }

    #[test]
    fn test_append_to_each() {
        assert_eq!(append_to_each("input, textarea", "#x"), "input#x, textarea#x");
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("it's"), "'it\\'s'");
    }
}
