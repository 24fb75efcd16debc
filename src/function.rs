//! Compiled, vectorized plot functions.
//!
//! A `PlotFunction` is built once per expression and evaluated over a whole sample grid
//! in one call. Two evaluators are available and run the same optimized program:
//!
//! - the JIT kernel produced by `builder::build_function`
//! - a stack interpreter over the `LinearOp` program
//!
//! Domain errors are never reported from here: `log(-1)` or `1/0` simply produce NaN
//! or infinite samples. Only a broken program or a mismatched output length is an error.

use crate::{
    backends::vector::Vector,
    builder::{build_function, JitKernel},
    convert::parse_expression,
    errors::{EvalError, PlotError},
    expr::{Expr, FlattenedExpr},
    opt::optimize,
};
use log::{debug, warn};

/// Evaluation strategy for a `PlotFunction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    /// JIT-compile, falling back to the interpreter if Cranelift fails on this host
    #[default]
    Auto,
    /// JIT-compile or fail
    Jit,
    /// Interpret the optimized program
    Interpreted,
}

enum Evaluator {
    Jit(JitKernel),
    Interpreted,
}

/// A whitelisted expression of `x`, ready to be sampled.
///
/// # Example
///
/// ```rust
/// use fnplot::{Backend, PlotFunction};
///
/// let f = PlotFunction::compile("x^2 - 1", Backend::Auto).unwrap();
/// assert_eq!(f.eval_grid(&[0.0, 2.0]).unwrap(), vec![-1.0, 3.0]);
/// ```
pub struct PlotFunction {
    text: String,
    expr: Expr,
    program: FlattenedExpr,
    evaluator: Evaluator,
}

impl PlotFunction {
    /// Parses and compiles an expression.
    ///
    /// # Errors
    /// `PlotError::Parse` if the text is rejected at the whitelist boundary, or
    /// `PlotError::Evaluation` if `Backend::Jit` was requested and compilation failed.
    pub fn compile(text: &str, backend: Backend) -> Result<Self, PlotError> {
        let expr = parse_expression(text)?;
        let program = optimize(expr.flatten());

        let evaluator = match backend {
            Backend::Interpreted => Evaluator::Interpreted,
            Backend::Jit => Evaluator::Jit(build_function(&program).map_err(EvalError::from)?),
            Backend::Auto => match build_function(&program) {
                Ok(kernel) => Evaluator::Jit(kernel),
                Err(err) => {
                    warn!("JIT compilation of `{text}` failed, interpreting instead: {err}");
                    Evaluator::Interpreted
                }
            },
        };

        let function = PlotFunction {
            text: text.to_string(),
            expr,
            program,
            evaluator,
        };
        debug!(
            "compiled `{}` as {} ({:?})",
            function.text,
            function.expr,
            function.backend()
        );
        Ok(function)
    }

    /// The expression text this function was compiled from.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The simplified AST.
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    /// The backend actually in use, never `Backend::Auto`.
    pub fn backend(&self) -> Backend {
        match self.evaluator {
            Evaluator::Jit(_) => Backend::Jit,
            Evaluator::Interpreted => Backend::Interpreted,
        }
    }

    /// Evaluates the function at every point of a grid.
    ///
    /// The output has one sample per input point, in order. Non-finite samples are
    /// returned as they are.
    pub fn eval_grid(&self, xs: &[f64]) -> Result<Vec<f64>, EvalError> {
        let ys = match (self.program.constant_result, &self.evaluator) {
            (Some(c), _) => vec![c; xs.len()],
            (None, Evaluator::Jit(kernel)) => xs.iter().map(|&x| kernel.call(x)).collect(),
            (None, Evaluator::Interpreted) => {
                let mut stack = Vec::with_capacity(self.program.max_stack_depth());
                xs.iter()
                    .map(|&x| {
                        self.program.eval(x, &mut stack).ok_or_else(|| {
                            EvalError::Program(format!("`{}` left an unbalanced stack", self.text))
                        })
                    })
                    .collect::<Result<Vec<f64>, EvalError>>()?
            }
        };

        if ys.len() != xs.len() {
            return Err(EvalError::OutputLength {
                expected: xs.len(),
                got: ys.len(),
            });
        }
        Ok(ys)
    }

    /// Evaluates the function over any `Vector` container and returns the same type.
    pub fn eval_vector<V: Vector>(&self, xs: &V) -> Result<V, EvalError> {
        Ok(V::from_vec(self.eval_grid(&xs.values())?))
    }
}

impl std::fmt::Debug for PlotFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotFunction")
            .field("text", &self.text)
            .field("expr", &self.expr)
            .field("backend", &self.backend())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ParseError;

    const EXPRESSIONS: [&str; 10] = [
        "sin(x)",
        "x^2 - 1",
        "1/x",
        "log(x)",
        "sqrt(x) * 2 + 1",
        "tan(x)",
        "exp(-x^2 / 2)",
        "abs(x)^0.5",
        "2^x - x^-3",
        "cos(3*x) / (1 + x*x)",
    ];

    fn grid() -> Vec<f64> {
        (0..=400).map(|i| -10.0 + i as f64 * 0.05).collect()
    }

    fn same(a: f64, b: f64) -> bool {
        (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
    }

    #[test]
    fn test_backends_agree() {
        let xs = grid();
        for text in EXPRESSIONS {
            let jit = PlotFunction::compile(text, Backend::Jit).unwrap();
            let interp = PlotFunction::compile(text, Backend::Interpreted).unwrap();
            let a = jit.eval_grid(&xs).unwrap();
            let b = interp.eval_grid(&xs).unwrap();
            for (x, (ya, yb)) in xs.iter().zip(a.iter().zip(&b)) {
                assert!(same(*ya, *yb), "{text} at {x}: {ya} != {yb}");
            }
        }
    }

    #[test]
    fn test_auto_prefers_jit() {
        let f = PlotFunction::compile("sin(x)", Backend::Auto).unwrap();
        assert_eq!(f.backend(), Backend::Jit);
        let f = PlotFunction::compile("sin(x)", Backend::Interpreted).unwrap();
        assert_eq!(f.backend(), Backend::Interpreted);
    }

    #[test]
    fn test_chained_powers_and_comments() {
        for backend in [Backend::Jit, Backend::Interpreted] {
            let f = PlotFunction::compile("2^3^2 + 0*x", backend).unwrap();
            assert_eq!(f.eval_grid(&[0.0, 1.0]).unwrap(), vec![512.0, 512.0]);
        }
        assert!(matches!(
            PlotFunction::compile("x//2", Backend::Auto),
            Err(PlotError::Parse(ParseError::Comment("//")))
        ));
    }

    #[test]
    fn test_pole_is_a_value_not_an_error() {
        let f = PlotFunction::compile("1/x", Backend::Auto).unwrap();
        let ys = f.eval_grid(&[-1.0, 0.0, 1.0]).unwrap();
        assert_eq!(ys, vec![-1.0, f64::INFINITY, 1.0]);

        let f = PlotFunction::compile("log(x)", Backend::Interpreted).unwrap();
        let ys = f.eval_grid(&[-1.0, 0.0, 1.0]).unwrap();
        assert!(ys[0].is_nan());
        assert_eq!(ys[1], f64::NEG_INFINITY);
        assert_eq!(ys[2], 0.0);
    }

    #[test]
    fn test_constant_function() {
        let f = PlotFunction::compile("2 * 3", Backend::Auto).unwrap();
        assert_eq!(f.eval_grid(&[0.0, 1.0, 2.0]).unwrap(), vec![6.0; 3]);
        assert!(f.eval_grid(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_eval_vector() {
        let f = PlotFunction::compile("x + 1", Backend::Auto).unwrap();
        let ys: Vec<f64> = f.eval_vector(&vec![1.0, 2.0]).unwrap();
        assert_eq!(ys, vec![2.0, 3.0]);
    }

    #[cfg(feature = "ndarray")]
    #[test]
    fn test_eval_ndarray() {
        let f = PlotFunction::compile("x * 2", Backend::Auto).unwrap();
        let xs = ndarray::Array1::linspace(0.0, 1.0, 3);
        let ys = f.eval_vector(&xs).unwrap();
        assert_eq!(ys, ndarray::arr1(&[0.0, 1.0, 2.0]));
    }

    #[test]
    fn test_rejected_text_is_a_parse_error() {
        let err = PlotFunction::compile("y+1", Backend::Auto).unwrap_err();
        assert!(matches!(
            err,
            PlotError::Parse(ParseError::UnknownIdentifier(_))
        ));
    }
}
