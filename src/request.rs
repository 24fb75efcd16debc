//! Plot requests as they arrive from a query string.
//!
//! All three inputs are optional strings. Missing values take the defaults `f=sin(x)`,
//! `xmin=-10`, `xmax=10`. A bound that is not a number is not rejected here: the error
//! is kept and reported when the request is rendered, so the caller still receives an
//! image.

use crate::{errors::PlotError, expression::ExpressionSet, grid::Range};

pub const DEFAULT_FUNCTION: &str = "sin(x)";
pub const DEFAULT_XMIN: &str = "-10";
pub const DEFAULT_XMAX: &str = "10";

/// Inputs of one render.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    expressions: ExpressionSet,
    xmin: Result<f64, String>,
    xmax: Result<f64, String>,
}

impl PlotRequest {
    /// Builds a request from already numeric bounds.
    pub fn new(functions: &str, xmin: f64, xmax: f64) -> Self {
        PlotRequest {
            expressions: ExpressionSet::parse(functions),
            xmin: Ok(xmin),
            xmax: Ok(xmax),
        }
    }

    /// Builds a request from query-string values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fnplot::PlotRequest;
    ///
    /// let req = PlotRequest::from_query(None, Some(" 0 "), Some("2.5"));
    /// assert_eq!(req.expressions().joined(), "sin(x)");
    /// assert_eq!(req.range().unwrap().xmax(), 2.5);
    ///
    /// let bad = PlotRequest::from_query(None, Some("ten"), None);
    /// assert!(bad.range().is_err());
    /// ```
    pub fn from_query(f: Option<&str>, xmin: Option<&str>, xmax: Option<&str>) -> Self {
        PlotRequest {
            expressions: ExpressionSet::parse(f.unwrap_or(DEFAULT_FUNCTION)),
            xmin: parse_bound(xmin.unwrap_or(DEFAULT_XMIN)),
            xmax: parse_bound(xmax.unwrap_or(DEFAULT_XMAX)),
        }
    }

    pub fn expressions(&self) -> &ExpressionSet {
        &self.expressions
    }

    /// The validated range.
    ///
    /// # Errors
    /// `PlotError::Validation` if a bound is not a number or the bounds are not
    /// ordered.
    pub fn range(&self) -> Result<Range, PlotError> {
        let xmin = self.xmin.clone().map_err(PlotError::Validation)?;
        let xmax = self.xmax.clone().map_err(PlotError::Validation)?;
        Range::new(xmin, xmax)
    }
}

impl Default for PlotRequest {
    fn default() -> Self {
        PlotRequest::from_query(None, None, None)
    }
}

fn parse_bound(text: &str) -> Result<f64, String> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| format!("could not convert string to float: '{text}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PlotRequest::default();
        assert_eq!(req.expressions().joined(), "sin(x)");
        let range = req.range().unwrap();
        assert_eq!((range.xmin(), range.xmax()), (-10.0, 10.0));
    }

    #[test]
    fn test_query_values() {
        let req = PlotRequest::from_query(Some("x; x^2"), Some("-1e1"), Some(" 3.5"));
        assert_eq!(req.expressions().len(), 2);
        let range = req.range().unwrap();
        assert_eq!((range.xmin(), range.xmax()), (-10.0, 3.5));
    }

    #[test]
    fn test_malformed_bound_is_deferred() {
        let req = PlotRequest::from_query(None, None, Some("abc"));
        match req.range() {
            Err(PlotError::Validation(msg)) => {
                assert_eq!(msg, "could not convert string to float: 'abc'")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_inverted_range() {
        let req = PlotRequest::new("x", 5.0, 5.0);
        assert!(matches!(req.range(), Err(PlotError::Validation(_))));
    }
}
