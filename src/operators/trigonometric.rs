//! Functions for linking and calling trigonometric functions in JIT-compiled code.
//!
//! All trigonometric functions operate on 64-bit floating point numbers (f64) and expect
//! arguments in radians. `tan` is not special-cased at its poles: it returns whatever
//! huge finite value or infinity the platform `tan` produces there.

use cranelift::prelude::FunctionBuilder;
use cranelift_codegen::ir::Value;
use cranelift_jit::JITBuilder;
use cranelift_module::Module;

use super::{call, link};
use crate::errors::BuilderError;

const SIN: &str = "fnplot_sin";
const COS: &str = "fnplot_cos";
const TAN: &str = "fnplot_tan";

extern "C" fn fnplot_sin(x: f64) -> f64 {
    x.sin()
}

extern "C" fn fnplot_cos(x: f64) -> f64 {
    x.cos()
}

extern "C" fn fnplot_tan(x: f64) -> f64 {
    x.tan()
}

pub(crate) fn register(builder: &mut JITBuilder) {
    builder.symbol(SIN, fnplot_sin as *const u8);
    builder.symbol(COS, fnplot_cos as *const u8);
    builder.symbol(TAN, fnplot_tan as *const u8);
}

/// Generates Cranelift IR instructions to call the sine function.
pub(crate) fn call_sin(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    arg: Value,
) -> Result<Value, BuilderError> {
    let func_id = link(module, SIN, 1)?;
    Ok(call(builder, module, func_id, &[arg]))
}

/// Generates Cranelift IR instructions to call the cosine function.
pub(crate) fn call_cos(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    arg: Value,
) -> Result<Value, BuilderError> {
    let func_id = link(module, COS, 1)?;
    Ok(call(builder, module, func_id, &[arg]))
}

/// Generates Cranelift IR instructions to call the tangent function.
pub(crate) fn call_tan(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    arg: Value,
) -> Result<Value, BuilderError> {
    let func_id = link(module, TAN, 1)?;
    Ok(call(builder, module, func_id, &[arg]))
}
