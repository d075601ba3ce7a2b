//! Text and exact-text matching against candidate nodes.

use crate::node::normalize_whitespace;
use crate::value::FilterValue;

/// Matches normalized `actual` text against `expected`.
///
/// Text values are normalized and matched as a substring, or as the whole
/// text when `exact`. Patterns run against the normalized text as given;
/// with `exact` the match must span the entire text.
#[must_use]
pub fn text_matches(actual: &str, expected: &FilterValue, exact: bool) -> bool {
    match expected.as_pattern() {
        Some(re) if exact => re
            .find_iter(actual)
            .any(|m| m.start() == 0 && m.end() == actual.len()),
        Some(re) => re.is_match(actual),
        None => {
            let expected = normalize_whitespace(&expected.to_text());
            if exact {
                actual == expected
            } else {
                actual.contains(&expected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use regex::Regex;

    use super::*;

    #[test]
    fn test_substring() {
        assert!(text_matches("Sign in now", &"in".into(), false));
        assert!(!text_matches("Sign in now", &"in".into(), true));
    }

    #[test]
    fn test_expected_is_normalized() {
        assert!(text_matches("Sign in", &"  Sign\n in ".into(), true));
    }

    #[test]
    fn test_pattern() {
        let re = FilterValue::from(Regex::new(r"\d+ items").unwrap());
        assert!(text_matches("Cart: 3 items", &re, false));
        assert!(!text_matches("Cart: 3 items", &re, true));
        assert!(text_matches("3 items", &re, true));
    }
}
