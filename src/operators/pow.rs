//! Functions for linking and calling the floating point power function in JIT-compiled code.
//!
//! Integer exponents never reach this routine; they are expanded into multiplications
//! by the builder.

use cranelift::prelude::FunctionBuilder;
use cranelift_codegen::ir::Value;
use cranelift_jit::JITBuilder;
use cranelift_module::Module;

use super::{call, link};
use crate::errors::BuilderError;

const POWF: &str = "fnplot_powf";

extern "C" fn fnplot_powf(base: f64, exponent: f64) -> f64 {
    base.powf(exponent)
}

pub(crate) fn register(builder: &mut JITBuilder) {
    builder.symbol(POWF, fnplot_powf as *const u8);
}

/// Generates Cranelift IR instructions to call powf.
pub(crate) fn call_powf(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    base: Value,
    exponent: Value,
) -> Result<Value, BuilderError> {
    let func_id = link(module, POWF, 2)?;
    Ok(call(builder, module, func_id, &[base, exponent]))
}
