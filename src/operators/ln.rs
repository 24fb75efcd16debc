//! Functions for linking and calling the natural logarithm in JIT-compiled code.
//!
//! `log` in expressions is the natural logarithm. Negative arguments give NaN and zero
//! gives negative infinity.

use cranelift::prelude::FunctionBuilder;
use cranelift_codegen::ir::Value;
use cranelift_jit::JITBuilder;
use cranelift_module::Module;

use super::{call, link};
use crate::errors::BuilderError;

const LN: &str = "fnplot_ln";

extern "C" fn fnplot_ln(x: f64) -> f64 {
    x.ln()
}

pub(crate) fn register(builder: &mut JITBuilder) {
    builder.symbol(LN, fnplot_ln as *const u8);
}

/// Generates Cranelift IR instructions to call ln.
pub(crate) fn call_ln(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    arg: Value,
) -> Result<Value, BuilderError> {
    let func_id = link(module, LN, 1)?;
    Ok(call(builder, module, func_id, &[arg]))
}
