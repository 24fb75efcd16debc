//! Functions for linking and calling the exponential function in JIT-compiled code.

use cranelift::prelude::FunctionBuilder;
use cranelift_codegen::ir::Value;
use cranelift_jit::JITBuilder;
use cranelift_module::Module;

use super::{call, link};
use crate::errors::BuilderError;

const EXP: &str = "fnplot_exp";

extern "C" fn fnplot_exp(x: f64) -> f64 {
    x.exp()
}

pub(crate) fn register(builder: &mut JITBuilder) {
    builder.symbol(EXP, fnplot_exp as *const u8);
}

/// Generates Cranelift IR instructions to call exp.
///
/// Overflow is not trapped: `exp(1000)` is +inf and becomes a gap in the plot.
pub(crate) fn call_exp(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    arg: Value,
) -> Result<Value, BuilderError> {
    let func_id = link(module, EXP, 1)?;
    Ok(call(builder, module, func_id, &[arg]))
}
