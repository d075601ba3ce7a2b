//! XPath expression tree.
//!
//! Selectors build XPath as values and render late, so one compiled query can
//! produce both the exact and the loose form of its `is` comparisons.
//!
//! # Example
//!
//! ```ignore
//! use locator_engine::XPath;
//!
//! let button = XPath::descendant(&["button"])
//!     .with(XPath::string().normalize().is("Submit"));
//!
//! assert_eq!(
//!     button.render(true),
//!     ".//button[(normalize-space(string(.)) = 'Submit')]"
//! );
//! assert_eq!(
//!     button.render(false),
//!     ".//button[contains(normalize-space(string(.)), 'Submit')]"
//! );
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};

// ============================================================================
// Constants
// ============================================================================

const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

// ============================================================================
// Types
// ============================================================================

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `=`
    Equals,
    /// `!=`
    NotEquals,
    /// `and`
    And,
    /// `or`
    Or,
    /// `+`
    Plus,
}

impl BinaryOp {
    const fn symbol(self) -> &'static str {
        match self {
            Self::Equals => "=",
            Self::NotEquals => "!=",
            Self::And => "and",
            Self::Or => "or",
            Self::Plus => "+",
        }
    }
}

/// An XPath expression.
#[derive(Debug, Clone, PartialEq)]
pub enum XPath {
    /// The context node, `.`.
    Current,

    /// Caller supplied expression text, rendered as is.
    Raw(String),

    /// String literal.
    Literal(String),

    /// Integer literal.
    Number(i64),

    /// Location step along `axis`, optionally rooted at another path.
    Step {
        /// Path the step starts from; `.` when absent.
        from: Option<Box<XPath>>,
        /// Axis name.
        axis: String,
        /// Element names; empty matches any element.
        names: Vec<String>,
    },

    /// `//name` anywhere in the document.
    Anywhere {
        /// Element names; empty matches any element.
        names: Vec<String>,
    },

    /// Attribute access, `@name` or `path/@name`.
    Attribute {
        /// Owning path; the context node when absent.
        from: Option<Box<XPath>>,
        /// Attribute name.
        name: String,
    },

    /// Predicate, `base[condition]`.
    Where {
        /// Filtered expression.
        base: Box<XPath>,
        /// Predicate.
        condition: Box<XPath>,
    },

    /// Union of paths, `a | b`.
    Union(Vec<XPath>),

    /// Binary operation.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<XPath>,
        /// Right operand.
        rhs: Box<XPath>,
    },

    /// Equality when rendered exact, `contains()` when rendered loose.
    Is {
        /// Haystack.
        lhs: Box<XPath>,
        /// Needle.
        rhs: Box<XPath>,
    },

    /// Function call.
    Function {
        /// Function name.
        name: &'static str,
        /// Arguments.
        args: Vec<XPath>,
    },
}

// ============================================================================
// Constructors
// ============================================================================

impl XPath {
    /// The context node.
    #[inline]
    #[must_use]
    pub const fn current() -> Self {
        Self::Current
    }

    /// Caller supplied expression text.
    #[inline]
    pub fn raw(expression: impl Into<String>) -> Self {
        Self::Raw(expression.into())
    }

    /// String literal.
    #[inline]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// Descendants of the context node with one of `names`.
    #[must_use]
    pub fn descendant(names: &[&str]) -> Self {
        Self::axis_from(None, "descendant", names)
    }

    /// Children of the context node with one of `names`.
    #[must_use]
    pub fn child(names: &[&str]) -> Self {
        Self::axis_from(None, "child", names)
    }

    /// Nodes along `axis` from the context node.
    #[must_use]
    pub fn axis(axis: &str, names: &[&str]) -> Self {
        Self::axis_from(None, axis, names)
    }

    /// Elements anywhere in the document with one of `names`.
    #[must_use]
    pub fn anywhere(names: &[&str]) -> Self {
        Self::Anywhere {
            names: names.iter().map(|n| (*n).to_string()).collect(),
        }
    }

    /// Attribute of the context node.
    #[inline]
    pub fn attr(name: impl Into<String>) -> Self {
        Self::Attribute {
            from: None,
            name: name.into(),
        }
    }

    /// String value of the context node, `string(.)`.
    #[inline]
    #[must_use]
    pub fn string() -> Self {
        Self::function("string", vec![Self::Current])
    }

    /// Context position, `position()`.
    #[inline]
    #[must_use]
    pub fn position() -> Self {
        Self::function("position", Vec::new())
    }

    fn axis_from(from: Option<Box<XPath>>, axis: &str, names: &[&str]) -> Self {
        Self::Step {
            from,
            axis: axis.to_string(),
            names: names.iter().map(|n| (*n).to_string()).collect(),
        }
    }

    fn function(name: &'static str, args: Vec<XPath>) -> Self {
        Self::Function { name, args }
    }

    fn binary(op: BinaryOp, lhs: XPath, rhs: XPath) -> Self {
        Self::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

// ============================================================================
// Path Building
// ============================================================================

impl XPath {
    /// Adds a predicate. Unions receive the predicate on every branch.
    #[must_use]
    pub fn with(self, condition: impl Into<XPath>) -> Self {
        let condition = condition.into();
        match self {
            Self::Union(branches) => Self::Union(
                branches
                    .into_iter()
                    .map(|branch| branch.with(condition.clone()))
                    .collect(),
            ),
            base => Self::Where {
                base: Box::new(base),
                condition: Box::new(condition),
            },
        }
    }

    /// Adds a predicate when one is given.
    #[must_use]
    pub fn with_opt(self, condition: Option<XPath>) -> Self {
        match condition {
            Some(condition) => self.with(condition),
            None => self,
        }
    }

    /// Descendants of this path with one of `names`.
    #[must_use]
    pub fn descendants(self, names: &[&str]) -> Self {
        self.step("descendant", names)
    }

    /// Nodes along `axis` from this path.
    #[must_use]
    pub fn step(self, axis: &str, names: &[&str]) -> Self {
        match self {
            Self::Union(branches) => Self::Union(
                branches
                    .into_iter()
                    .map(|branch| branch.step(axis, names))
                    .collect(),
            ),
            from => Self::axis_from(Some(Box::new(from)), axis, names),
        }
    }

    /// Restricts this path to elements named `name` (`/self::name`).
    #[must_use]
    pub fn self_named(self, name: &str) -> Self {
        self.step("self", &[name])
    }

    /// Re-roots a relative path so it starts at `root`.
    ///
    /// `.//input[@id]` re-rooted at `.//label` becomes `.//label//input[@id]`.
    #[must_use]
    pub fn rooted_at(self, root: XPath) -> Self {
        match self {
            Self::Step { from: None, axis, names } => Self::Step {
                from: Some(Box::new(root)),
                axis,
                names,
            },
            Self::Step {
                from: Some(from),
                axis,
                names,
            } => Self::Step {
                from: Some(Box::new(from.rooted_at(root))),
                axis,
                names,
            },
            Self::Where { base, condition } => Self::Where {
                base: Box::new(base.rooted_at(root)),
                condition,
            },
            Self::Union(branches) => Self::Union(
                branches
                    .into_iter()
                    .map(|branch| branch.rooted_at(root.clone()))
                    .collect(),
            ),
            other => other,
        }
    }

    /// Attribute of the nodes selected by this path.
    #[must_use]
    pub fn attribute(self, name: impl Into<String>) -> Self {
        Self::Attribute {
            from: Some(Box::new(self)),
            name: name.into(),
        }
    }

    /// Union with another path. Nested unions are flattened.
    #[must_use]
    pub fn union(self, other: XPath) -> Self {
        let mut branches = match self {
            Self::Union(branches) => branches,
            single => vec![single],
        };
        match other {
            Self::Union(more) => branches.extend(more),
            single => branches.push(single),
        }
        Self::Union(branches)
    }
}

// ============================================================================
// Conditions
// ============================================================================

impl XPath {
    /// `self = other`.
    #[must_use]
    pub fn equals(self, other: impl Into<XPath>) -> Self {
        Self::binary(BinaryOp::Equals, self, other.into())
    }

    /// `self != other`.
    #[must_use]
    pub fn not_equals(self, other: impl Into<XPath>) -> Self {
        Self::binary(BinaryOp::NotEquals, self, other.into())
    }

    /// Exactness sensitive comparison.
    #[must_use]
    pub fn is(self, other: impl Into<XPath>) -> Self {
        Self::Is {
            lhs: Box::new(self),
            rhs: Box::new(other.into()),
        }
    }

    /// `contains(self, other)`.
    #[must_use]
    pub fn contains(self, other: impl Into<XPath>) -> Self {
        Self::function("contains", vec![self, other.into()])
    }

    /// `starts-with(self, other)`.
    #[must_use]
    pub fn starts_with(self, other: impl Into<XPath>) -> Self {
        Self::function("starts-with", vec![self, other.into()])
    }

    /// Whitespace separated word membership, as used for classes.
    #[must_use]
    pub fn contains_word(self, word: &str) -> Self {
        let padded = Self::function(
            "concat",
            vec![
                Self::literal(" "),
                self.normalize(),
                Self::literal(" "),
            ],
        );
        padded.contains(format!(" {word} "))
    }

    /// Equal to any of `values`.
    #[must_use]
    pub fn one_of(self, values: &[&str]) -> Self {
        values
            .iter()
            .map(|value| self.clone().equals(*value))
            .reduce(BitOr::bitor)
            .unwrap_or_else(|| Self::function("false", Vec::new()))
    }

    /// `normalize-space(self)`.
    #[must_use]
    pub fn normalize(self) -> Self {
        Self::function("normalize-space", vec![self])
    }

    /// ASCII upper-casing through `translate()`.
    #[must_use]
    pub fn uppercase(self) -> Self {
        Self::function(
            "translate",
            vec![self, Self::literal(LOWERCASE), Self::literal(UPPERCASE)],
        )
    }

    /// `count(self)`.
    #[must_use]
    pub fn count(self) -> Self {
        Self::function("count", vec![self])
    }

    /// `boolean(self)`.
    #[must_use]
    pub fn boolean(self) -> Self {
        Self::function("boolean", vec![self])
    }

    /// `self + n`.
    #[must_use]
    pub fn plus(self, n: i64) -> Self {
        Self::binary(BinaryOp::Plus, self, Self::Number(n))
    }
}

impl BitAnd for XPath {
    type Output = XPath;

    fn bitand(self, rhs: XPath) -> XPath {
        XPath::binary(BinaryOp::And, self, rhs)
    }
}

impl BitOr for XPath {
    type Output = XPath;

    fn bitor(self, rhs: XPath) -> XPath {
        XPath::binary(BinaryOp::Or, self, rhs)
    }
}

impl Not for XPath {
    type Output = XPath;

    fn not(self) -> XPath {
        XPath::function("not", vec![self])
    }
}

impl From<&str> for XPath {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for XPath {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl From<i64> for XPath {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

// ============================================================================
// Rendering
// ============================================================================

impl XPath {
    /// Renders the expression. `exact` selects the form of `is` comparisons.
    #[must_use]
    pub fn render(&self, exact: bool) -> String {
        let mut out = String::new();
        self.write(&mut out, exact);
        out
    }

    /// Returns `true` if rendering depends on exactness.
    #[must_use]
    pub fn has_exactness(&self) -> bool {
        match self {
            Self::Is { .. } => true,
            Self::Step { from, .. } | Self::Attribute { from, .. } => {
                from.as_deref().is_some_and(XPath::has_exactness)
            }
            Self::Where { base, condition } => base.has_exactness() || condition.has_exactness(),
            Self::Union(branches) => branches.iter().any(XPath::has_exactness),
            Self::Binary { lhs, rhs, .. } => lhs.has_exactness() || rhs.has_exactness(),
            Self::Function { args, .. } => args.iter().any(XPath::has_exactness),
            Self::Current | Self::Raw(_) | Self::Literal(_) | Self::Number(_) | Self::Anywhere { .. } => {
                false
            }
        }
    }

    fn write(&self, out: &mut String, exact: bool) {
        match self {
            Self::Current => out.push('.'),
            Self::Raw(expression) => out.push_str(expression),
            Self::Literal(value) => out.push_str(&quote(value)),
            Self::Number(n) => out.push_str(&n.to_string()),
            Self::Step { from, axis, names } => {
                match from {
                    Some(from) => from.write(out, exact),
                    None => out.push('.'),
                }
                match axis.as_str() {
                    "descendant" => {
                        out.push_str("//");
                        write_names(out, names);
                    }
                    "child" => {
                        out.push('/');
                        write_names(out, names);
                    }
                    other => {
                        out.push('/');
                        out.push_str(other);
                        out.push_str("::");
                        write_names(out, names);
                    }
                }
            }
            Self::Anywhere { names } => {
                out.push_str("//");
                write_names(out, names);
            }
            Self::Attribute { from, name } => {
                if let Some(from) = from {
                    from.write(out, exact);
                    out.push('/');
                }
                out.push('@');
                out.push_str(name);
            }
            Self::Where { base, condition } => {
                let wrap = matches!(**base, Self::Raw(_) | Self::Union(_));
                if wrap {
                    out.push('(');
                }
                base.write(out, exact);
                if wrap {
                    out.push(')');
                }
                out.push('[');
                condition.write(out, exact);
                out.push(']');
            }
            Self::Union(branches) => {
                for (i, branch) in branches.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" | ");
                    }
                    branch.write(out, exact);
                }
            }
            Self::Binary { op, lhs, rhs } => {
                out.push('(');
                lhs.write(out, exact);
                out.push(' ');
                out.push_str(op.symbol());
                out.push(' ');
                rhs.write(out, exact);
                out.push(')');
            }
            Self::Is { lhs, rhs } => {
                if exact {
                    out.push('(');
                    lhs.write(out, exact);
                    out.push_str(" = ");
                    rhs.write(out, exact);
                    out.push(')');
                } else {
                    out.push_str("contains(");
                    lhs.write(out, exact);
                    out.push_str(", ");
                    rhs.write(out, exact);
                    out.push(')');
                }
            }
            Self::Function { name, args } => {
                out.push_str(name);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    arg.write(out, exact);
                }
                out.push(')');
            }
        }
    }
}

impl fmt::Display for XPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

fn write_names(out: &mut String, names: &[String]) {
    match names {
        [] => out.push('*'),
        [name] => out.push_str(name),
        many => {
            out.push_str("*[");
            for (i, name) in many.iter().enumerate() {
                if i > 0 {
                    out.push_str(" | ");
                }
                out.push_str("self::");
                out.push_str(name);
            }
            out.push(']');
        }
    }
}

/// Quotes a string as an XPath literal.
///
/// Values holding both quote styles are split into a `concat()` call.
#[must_use]
pub fn quote(value: &str) -> String {
    if !value.contains('\'') {
        return format!("'{value}'");
    }
    if !value.contains('"') {
        return format!("\"{value}\"");
    }

    let parts: Vec<String> = value
        .split('\'')
        .map(|part| format!("'{part}'"))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

// ============================================================================
// Tests
// ============================================================================
