//! Function plots rendered to PNG from untrusted expression text.
//!
//! This crate turns a list of expressions of `x` such as `"sin(x); x^2 - 1"` and an
//! x-range into a PNG image. Expressions are parsed with
//! [evalexpr](https://github.com/ISibboI/evalexpr), checked against a fixed whitelist
//! (`x`, `sin`, `cos`, `tan`, `exp`, `log`, `sqrt`, `abs`, numbers and `+ - * / ^`),
//! compiled with [Cranelift](https://github.com/bytecodealliance/wasmtime/tree/main/cranelift)
//! and sampled at 800 points. Plots are drawn with [plotters](https://github.com/plotters-rs/plotters).
//!
//! # Features
//!
//! - Whitelist enforced while building the AST: nothing outside it is ever evaluated
//! - JIT-compiled sampling with an interpreter fallback that produces identical values
//! - NaN and infinite samples become gaps in the curve instead of errors
//! - Rendering never fails: errors are drawn as a diagnostic image
//!
//! # Example
//!
//! ```rust
//! use fnplot::{PlotRequest, Renderer};
//!
//! let image = Renderer::default().render(&PlotRequest::new("sin(x); cos(x)", -10.0, 10.0));
//! assert!(image.error().is_none());
//! assert!(image.bytes().starts_with(b"\x89PNG"));
//!
//! // rejected expressions still produce an image
//! let image = Renderer::default().render(&PlotRequest::new("os.system(1)", -10.0, 10.0));
//! assert!(image.is_diagnostic());
//! ```

pub use errors::{EvalError, ParseError, PlotError};
pub use expression::{Expression, ExpressionSet};
pub use function::{Backend, PlotFunction};
pub use grid::{Range, SampleGrid, SeriesResult, SAMPLE_COUNT};
pub use render::{compose_title, Figure, PlotImage, RenderOptions, Renderer};
pub use request::PlotRequest;

pub mod prelude {
    pub use crate::backends::vector::Vector;
    pub use crate::builder::build_function;
    pub use crate::convert::{build_ast, parse_expression};
    pub use crate::expr::{Expr, Func};
    pub use crate::function::{Backend, PlotFunction};
    pub use crate::render::{PlotImage, Renderer};
    pub use crate::request::PlotRequest;
}

/// Questions about a plot for an external language model
pub mod assistant;
/// Containers a sample grid can be passed in
pub mod backends {
    pub mod vector;
}
/// JIT compilation functionality using Cranelift
pub mod builder;
/// Conversion from parsed expressions to the whitelisted AST
pub mod convert;
/// Error types for the various failure modes
pub mod errors;
/// Expression tree representation and flattening
pub mod expr;
/// Splitting and normalizing user input
pub mod expression;
/// Bundled font registration
pub mod fonts;
/// Compiled, vectorized plot functions
pub mod function;
/// Ranges, sample grids and sampled series
pub mod grid;
/// Peephole optimizer for flattened programs
pub mod opt;
/// Plot composition and PNG encoding
pub mod render;
/// Query-string style plot requests
pub mod request;
/// Signatures of compiled kernels
pub mod types;

/// Functions for linking external math routines into compiled kernels
pub(crate) mod operators;
