//! Literal substrings required by a regular expression.
//!
//! XPath 1.0 and CSS have no regex support. To still narrow a query by a
//! pattern, the pattern is reduced to literal substrings that every match
//! must contain; the expression requires all of them and the node filter
//! applies the real pattern afterwards.
//!
//! Reduction is conservative: any construct that does not guarantee literal
//! text becomes a wildcard, and anything that cannot be reduced safely yields
//! an empty result. An empty result means "no pre-filter", never "no match".
//!
//! Flags set through `RegexBuilder` are not part of the pattern source and
//! are not seen here; use inline flags (`(?i)`) for case-insensitive patterns.

// ============================================================================
// Imports
// ============================================================================

use std::sync::LazyLock;

use regex::{Captures, Regex};
use rustc_hash::FxHashSet;

// ============================================================================
// Constants
// ============================================================================

/// Placeholder for "some unknown text".
const WILDCARD: &str = ".";

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("static pattern")
}

static PROPERTY_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"\\[pPxuU](?:\{[^}]*\}|[0-9a-fA-F]{1,8}|[A-Za-z])?"));
static REFERENCE_ESCAPE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\\[gk](?:<[^>]*>)?"));
static ESCAPE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)\\."));
static POSIX_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern(r"\[\[:\^?[a-z]+:\]\]"));
static CHAR_CLASS: LazyLock<Regex> = LazyLock::new(|| pattern(r"\[[^\[\]]+\]"));
static LOOKAROUND: LazyLock<Regex> = LazyLock::new(|| pattern(r"\(\?<?[=!][^)]*\)"));
static FLAGS: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"\(\?(?P<on>[a-zA-Z]*)(?:-[a-zA-Z]*)?(?P<end>[):])"));
static NAMED_OR_ATOMIC: LazyLock<Regex> = LazyLock::new(|| pattern(r"\(\?(?:P?<[^>]+>|>)"));
static GROUP: LazyLock<Regex> = LazyLock::new(|| {
    pattern(
        r"(?P<group>\([^()]*\))(?:(?:(?P<optional>[*?])|(?P<one_or_more>\+)|\{(?P<min_rep>\d*)(?:,(?P<max_rep>\d*))?\})\??)?",
    )
});
static OPTIONAL_CHAR: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s).[*?]\??"));
static ONE_OR_MORE_CHAR: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s).\+\??"));
static COUNTED_CHAR: LazyLock<Regex> = LazyLock::new(|| {
    pattern(r"(?s)(?P<char>.)\{(?P<min_rep>\d*)(?:,(?P<max_rep>\d*))?\}\??")
});

/// Characters that must not survive reduction.
const UNRESOLVED: &[char] = &['(', ')', '[', ']', '{', '}', '*', '+', '?', '\\'];

// ============================================================================
// RegexpDisassembler
// ============================================================================

/// Extracts the literal substrings every match of a pattern contains.
#[derive(Debug, Clone)]
pub struct RegexpDisassembler {
    source: String,
    casefold: bool,
    substrings: Vec<String>,
}

impl RegexpDisassembler {
    /// Disassembles `regex`.
    #[must_use]
    pub fn new(regex: &Regex) -> Self {
        Self::from_source(regex.as_str())
    }

    /// Disassembles a pattern given as source text.
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        let (substrings, casefold) = disassemble(source);
        Self {
            source: source.to_string(),
            casefold,
            substrings,
        }
    }

    /// Returns the pattern source.
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns `true` if the pattern matches case-insensitively.
    ///
    /// Substrings are then ASCII upper-cased and split wherever a character
    /// folds outside ASCII; compare them against ASCII upper-cased text.
    #[inline]
    #[must_use]
    pub fn is_casefold(&self) -> bool {
        self.casefold
    }

    /// Returns the required substrings, deduplicated in first-seen order.
    #[inline]
    #[must_use]
    pub fn substrings(&self) -> &[String] {
        &self.substrings
    }
}

/// Convenience wrapper returning only the substrings.
#[must_use]
pub fn substrings(regex: &Regex) -> Vec<String> {
    RegexpDisassembler::new(regex).substrings
}

// ============================================================================
// Reduction
// ============================================================================

fn disassemble(source: &str) -> (Vec<String>, bool) {
    let mut source = PROPERTY_ESCAPE.replace_all(source, WILDCARD).into_owned();
    source = REFERENCE_ESCAPE.replace_all(&source, WILDCARD).into_owned();
    source = ESCAPE.replace_all(&source, WILDCARD).into_owned();
    source = POSIX_CLASS.replace_all(&source, WILDCARD).into_owned();
    loop {
        let next = CHAR_CLASS.replace_all(&source, WILDCARD).into_owned();
        if next == source {
            break;
        }
        source = next;
    }
    source = LOOKAROUND.replace_all(&source, "").into_owned();

    let mut casefold = false;
    let mut verbose = false;
    for caps in FLAGS.captures_iter(&source) {
        let on = caps.name("on").map_or("", |m| m.as_str());
        casefold |= on.contains('i');
        verbose |= on.contains('x');
    }
    if verbose {
        return (Vec::new(), casefold);
    }
    source = FLAGS
        .replace_all(&source, |caps: &Captures<'_>| {
            if caps.name("end").is_some_and(|m| m.as_str() == ":") {
                "(".to_string()
            } else {
                String::new()
            }
        })
        .into_owned();
    source = NAMED_OR_ATOMIC.replace_all(&source, "(").into_owned();

    while GROUP.is_match(&source) {
        source = GROUP.replace_all(&source, simplify_group).into_owned();
    }

    source = OPTIONAL_CHAR.replace_all(&source, WILDCARD).into_owned();
    source = ONE_OR_MORE_CHAR.replace_all(&source, WILDCARD).into_owned();
    source = COUNTED_CHAR
        .replace_all(&source, |caps: &Captures<'_>| {
            let mut out = caps["char"].repeat(repetitions(caps));
            if caps.name("max_rep").is_some() {
                out.push_str(WILDCARD);
            }
            out
        })
        .into_owned();

    if source.contains('|') || source.contains(UNRESOLVED) {
        return (Vec::new(), casefold);
    }

    let source = source.replace(['^', '$'], WILDCARD);
    let mut seen = FxHashSet::default();
    let substrings = source
        .split(WILDCARD)
        .flat_map(|part| {
            let unfoldable: fn(char) -> bool = if casefold { folds_beyond_ascii } else { |_| false };
            part.split(unfoldable)
        })
        .filter(|part| !part.is_empty())
        .map(|part| {
            if casefold {
                part.to_ascii_uppercase()
            } else {
                part.to_string()
            }
        })
        .filter(|part| seen.insert(part.clone()))
        .collect();

    (substrings, casefold)
}

/// Whether `c` has case variants that ASCII folding cannot reach.
///
/// CSS `i` and XPath `translate()` only fold `a-z`. Under `(?i)` the regex
/// engine also matches the Kelvin sign for `k` and the long s for `s`, and
/// every cased character outside ASCII; those positions become wildcards.
fn folds_beyond_ascii(c: char) -> bool {
    if c.is_ascii() {
        matches!(c, 'k' | 'K' | 's' | 'S')
    } else {
        c.is_lowercase() || c.is_uppercase() || c.to_lowercase().ne(c.to_uppercase())
    }
}

fn simplify_group(caps: &Captures<'_>) -> String {
    let group = &caps["group"];
    let inner = &group[1..group.len() - 1];

    if group.contains('|') {
        WILDCARD.to_string()
    } else if caps.name("one_or_more").is_some() {
        format!("{inner}{WILDCARD}")
    } else if caps.name("optional").is_some() {
        WILDCARD.to_string()
    } else if caps.name("min_rep").is_some() {
        let mut out = group.repeat(repetitions(caps));
        if caps.name("max_rep").is_some() {
            out.push_str(WILDCARD);
        }
        out
    } else {
        inner.to_string()
    }
}

fn repetitions(caps: &Captures<'_>) -> usize {
    caps.name("min_rep")
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(source: &str) -> Vec<String> {
        RegexpDisassembler::from_source(source).substrings().to_vec()
    }

    #[test]
    fn test_plain_strings() {
        assert_eq!(subs("abcdef"), vec!["abcdef"]);
        assert_eq!(subs("abc def"), vec!["abc def"]);
    }

    #[test]
    fn test_one_or_more_char_is_wildcard() {
        assert_eq!(subs("ab+c"), vec!["a", "c"]);
    }

    #[test]
    fn test_top_level_alternation() {
        assert!(subs("foo|bar").is_empty());
    }

    #[test]
    fn test_group_alternation() {
        assert_eq!(subs("ab(c|d)ef"), vec!["ab", "ef"]);
        assert_eq!(subs("ab(?:c|d)"), vec!["ab"]);
    }

    #[test]
    fn test_wildcards_and_optionals() {
        assert_eq!(subs("abc.*def"), vec!["abc", "def"]);
        assert_eq!(subs("abc?def?g"), vec!["ab", "de", "g"]);
        assert_eq!(subs("abc*?cde"), vec!["ab", "cde"]);
    }

    #[test]
    fn test_counted_repetition() {
        assert_eq!(subs("abc{3}d"), vec!["abcccd"]);
        assert_eq!(subs("abc{2,}"), vec!["abcc"]);
        assert_eq!(subs("(ab){2,3}cd"), vec!["abab", "cd"]);
        assert_eq!(subs("(abc){3}"), vec!["abcabcabc"]);
    }

    #[test]
    fn test_groups() {
        assert_eq!(subs("ab(cde)fg"), vec!["abcdefg"]);
        assert_eq!(subs("ab(?P<name>cd)ef"), vec!["abcdef"]);
        assert!(subs("(abc)?").is_empty());
        assert_eq!(subs("(abc)+?def"), vec!["abc", "def"]);
        assert_eq!(subs("(ab(cd)+){2}"), vec!["abcd"]);
    }

    #[test]
    fn test_classes_and_escapes() {
        assert_eq!(subs("abc[a-z]def[0-9]g"), vec!["abc", "def", "g"]);
        assert_eq!(subs("abc[[:alpha:]]"), vec!["abc"]);
        assert!(subs("[0-9]+").is_empty());
        assert_eq!(subs(r"abc\wdef"), vec!["abc", "def"]);
        assert_eq!(subs(r"ab\p{Alphabetic}cd"), vec!["ab", "cd"]);
        assert_eq!(subs(r"ab\pLcd"), vec!["ab", "cd"]);
        assert_eq!(subs(r"abc\.def"), vec!["abc", "def"]);
    }

    #[test]
    fn test_anchors() {
        assert_eq!(subs("^abc$"), vec!["abc"]);
        assert_eq!(subs(r"\Aabc\z"), vec!["abc"]);
    }

    #[test]
    fn test_casefold_flag() {
        let d = RegexpDisassembler::from_source("(?i)hello world");
        assert!(d.is_casefold());
        assert_eq!(d.substrings(), ["HELLO WORLD"]);
    }

    #[test]
    fn test_casefold_splits_at_non_ascii_letters() {
        let d = RegexpDisassembler::from_source("(?i)café");
        assert_eq!(d.substrings(), ["CAF"]);

        let d = RegexpDisassembler::from_source("(?i)straße");
        assert_eq!(d.substrings(), ["TRA", "E"]);

        let d = RegexpDisassembler::from_source("(?i)Öl 20 €");
        assert_eq!(d.substrings(), ["L 20 €"]);
    }

    #[test]
    fn test_casefold_splits_at_kelvin_and_long_s() {
        let d = RegexpDisassembler::from_source("(?i)kilo mass");
        assert_eq!(d.substrings(), ["ILO MA"]);

        let d = RegexpDisassembler::from_source("(?i)sky");
        assert_eq!(d.substrings(), ["Y"]);
    }

    #[test]
    fn test_case_sensitive_keeps_non_ascii() {
        assert_eq!(subs("café"), vec!["café"]);
    }

    #[test]
    fn test_scoped_flag_group() {
        let d = RegexpDisassembler::from_source("ab(?i:cd)ef");
        assert!(d.is_casefold());
        assert_eq!(d.substrings(), ["ABCDEF"]);
    }

    #[test]
    fn test_verbose_flag_gives_up() {
        assert!(subs("(?x) a b c").is_empty());
    }

    #[test]
    fn test_deduplicates() {
        assert_eq!(subs("ab.ab.cd"), vec!["ab", "cd"]);
    }
}
