//! Error types for the fnplot crate.
//!
//! Each stage of the pipeline has its own error type:
//!
//! - `ParseError`: the expression text is malformed or steps outside the whitelist
//! - `BuilderError`: Cranelift could not compile the expression
//! - `EvalError`: the evaluator failed on a sample grid
//! - `PlotError`: the top-level taxonomy a render can end in
//!
//! A `PlotError` never escapes `Renderer::render`; it is carried next to the
//! diagnostic image so callers and tests can tell the failure kinds apart.

use cranelift_codegen::CodegenError;
use cranelift_module::ModuleError;
use evalexpr::{DefaultNumericTypes, EvalexprError};
use plotters::drawing::DrawingAreaErrorKind;
use thiserror::Error;

/// Errors raised while turning expression text into the whitelisted AST.
#[derive(Error, Debug)]
pub enum ParseError {
    /// evalexpr could not tokenize or build an operator tree
    #[error("could not parse `{expression}`: {source}")]
    Syntax {
        expression: String,
        #[source]
        source: EvalexprError<DefaultNumericTypes>,
    },
    /// An identifier other than `x` was read as a value
    #[error("unknown identifier `{0}` (allowed: x, sin, cos, tan, exp, log, sqrt, abs)")]
    UnknownIdentifier(String),
    /// A call to a function outside the whitelist
    #[error("unsupported function `{0}` (allowed: sin, cos, tan, exp, log, sqrt, abs)")]
    UnsupportedFunction(String),
    /// A whitelisted function called with zero or several arguments
    #[error("function `{0}` takes exactly one argument")]
    Arity(String),
    /// Any evalexpr operator that is not `+ - * / ^` or unary minus
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
    /// A literal that is not a number (string, boolean, tuple, empty)
    #[error("expected a numeric constant, found {0}")]
    NonNumericConstant(String),
    /// A whitelisted operator without all of its operands, e.g. `x +`
    #[error("incomplete expression: `{0}` is missing an operand")]
    MissingOperand(&'static str),
    /// A whitelisted function written without parentheses, e.g. `sin x`
    #[error("function `{0}` must be called with parentheses, e.g. `{0}(x)`")]
    MissingParentheses(String),
    /// `//` or `/*`, which evalexpr would read as the start of a comment
    #[error("`{0}` is not an operator")]
    Comment(&'static str),
    /// Nothing left to evaluate, e.g. `()`
    #[error("empty expression")]
    Empty,
}

/// Errors that can occur during JIT compilation of expressions.
#[derive(Error, Debug)]
pub enum BuilderError {
    /// Cranelift has no backend for the host architecture
    #[error("host machine is not supported: {0}")]
    HostMachineNotSupported(String),
    /// A Cranelift flag was rejected
    #[error("invalid compiler setting: {0}")]
    Setting(String),
    /// Error during Cranelift code generation
    #[error("codegen error: {0}")]
    Codegen(#[from] CodegenError),
    /// Error in the Cranelift JIT module
    #[error("module error: {0}")]
    Module(#[from] ModuleError),
    /// The postfix program did not leave exactly one value on the stack
    #[error("malformed program: {0}")]
    Program(String),
}

/// Errors raised while sampling a compiled function.
#[derive(Error, Debug)]
pub enum EvalError {
    /// The function could not be compiled for the requested backend
    #[error("failed to compile expression: {0}")]
    Compile(#[from] BuilderError),
    /// The interpreted program ran out of operands
    #[error("malformed program: {0}")]
    Program(String),
    /// The evaluator did not produce one sample per grid point
    #[error("invalid output length: expected {expected}, got {got}")]
    OutputLength { expected: usize, got: usize },
}

/// Everything a render can fail with.
///
/// `DomainAnomaly` is deliberately absent: NaN and infinite samples are data,
/// not errors, and are turned into gaps by `SeriesResult`.
#[derive(Error, Debug)]
pub enum PlotError {
    /// Malformed or inverted range
    #[error("{0}")]
    Validation(String),
    /// Expression rejected at the parse boundary
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Compilation or sampling failure
    #[error(transparent)]
    Evaluation(#[from] EvalError),
    /// plotters reported a backend failure
    #[error("drawing failed: {0}")]
    Drawing(String),
    /// The pixel buffer could not be encoded
    #[error("PNG encoding failed: {0}")]
    Encoding(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PlotError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        PlotError::Drawing(err.to_string())
    }
}

impl From<BuilderError> for PlotError {
    fn from(err: BuilderError) -> Self {
        PlotError::Evaluation(EvalError::Compile(err))
    }
}

/// Failure reported by an external text-generation service.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct GeneratorError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_verbatim() {
        let err = PlotError::Validation("xmin must be < xmax".to_string());
        assert_eq!(err.to_string(), "xmin must be < xmax");
    }

    #[test]
    fn test_parse_error_is_transparent() {
        let err = PlotError::from(ParseError::UnknownIdentifier("y".to_string()));
        assert!(matches!(err, PlotError::Parse(_)));
        assert!(err.to_string().starts_with("unknown identifier `y`"));
    }

    #[test]
    fn test_builder_error_becomes_evaluation_error() {
        let err = PlotError::from(BuilderError::HostMachineNotSupported("riscv".to_string()));
        assert!(matches!(err, PlotError::Evaluation(EvalError::Compile(_))));
    }
}
