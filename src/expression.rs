//! User-facing expression lists.
//!
//! Input like `"sin(x); x^2 - 1"` is split on `;`, each fragment is trimmed, empty
//! fragments are dropped, and an input with nothing left falls back to
//! `DEFAULT_EXPRESSION`. Order is kept: it is the plotting and legend order.

use itertools::Itertools;

use crate::{
    errors::PlotError,
    function::{Backend, PlotFunction},
};

/// Expression plotted when the input holds no non-blank fragment.
pub const DEFAULT_EXPRESSION: &str = "sin(x)";

/// Separator between expressions in one input string.
pub const SEPARATOR: char = ';';

/// Normalizes the power operator to the parser's `^`.
///
/// `x**2` and `x^2` are both accepted. The rewrite is purely textual and does not look
/// at the surrounding syntax, which is only sound while the grammar has no string
/// literals or comments that could contain `**`.
pub fn clean_expression(raw: &str) -> String {
    raw.replace("**", "^")
}

/// One fragment of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    raw: String,
    cleaned: String,
}

impl Expression {
    pub fn new(raw: &str) -> Self {
        let raw = raw.trim();
        Expression {
            raw: raw.to_string(),
            cleaned: clean_expression(raw),
        }
    }

    /// The trimmed text as the user typed it; used in the title.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The normalized text; parsed, and used as the legend label.
    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    pub fn compile(&self, backend: Backend) -> Result<PlotFunction, PlotError> {
        PlotFunction::compile(&self.cleaned, backend)
    }
}

/// The ordered, non-empty list of expressions of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpressionSet {
    expressions: Vec<Expression>,
}

impl ExpressionSet {
    /// Splits an input string into expressions.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fnplot::ExpressionSet;
    ///
    /// let set = ExpressionSet::parse(" sin(x) ;; x**2 ");
    /// assert_eq!(set.len(), 2);
    /// assert_eq!(set.joined(), "sin(x); x**2");
    ///
    /// assert_eq!(ExpressionSet::parse(" ; ").joined(), "sin(x)");
    /// ```
    pub fn parse(raw: &str) -> Self {
        let mut expressions: Vec<Expression> = raw
            .split(SEPARATOR)
            .map(str::trim)
            .filter(|fragment| !fragment.is_empty())
            .map(Expression::new)
            .collect();
        if expressions.is_empty() {
            expressions.push(Expression::new(DEFAULT_EXPRESSION));
        }
        ExpressionSet { expressions }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Expression> {
        self.expressions.iter()
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    /// Always false: an empty input becomes `DEFAULT_EXPRESSION`.
    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// The raw texts joined with `"; "`.
    pub fn joined(&self) -> String {
        self.expressions.iter().map(Expression::raw).join("; ")
    }

    /// Compiles every expression in order, stopping at the first failure.
    pub fn compile(&self, backend: Backend) -> Result<Vec<PlotFunction>, PlotError> {
        self.expressions
            .iter()
            .map(|expression| expression.compile(backend))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ExpressionSet {
    type Item = &'a Expression;
    type IntoIter = std::slice::Iter<'a, Expression>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
