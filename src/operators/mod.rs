//! Natively linked math routines for JIT-compiled kernels.
//!
//! Cranelift has instructions for the cheap operations (`fadd`, `fabs`, `sqrt`, ...)
//! but not for the transcendental ones. Those are Rust functions exported with the C
//! ABI, registered as symbols on the `JITBuilder` and imported into each kernel.
//!
//! The interpreter calls the same `f64` methods, so both backends agree bit for bit.

use cranelift::prelude::FunctionBuilder;
use cranelift_codegen::ir::types::F64;
use cranelift_codegen::ir::{AbiParam, InstBuilder, Value};
use cranelift_jit::JITBuilder;
use cranelift_module::{FuncId, Linkage, Module};

use crate::errors::BuilderError;
use crate::expr::Func;

pub(crate) mod exp;
pub(crate) mod ln;
pub(crate) mod pow;
pub(crate) mod trigonometric;

/// Registers every routine a kernel may import.
pub(crate) fn register_symbols(builder: &mut JITBuilder) {
    trigonometric::register(builder);
    exp::register(builder);
    ln::register(builder);
    pow::register(builder);
}

/// Declares an imported `f64^arity -> f64` routine in the module.
pub(crate) fn link(
    module: &mut dyn Module,
    symbol: &str,
    arity: usize,
) -> Result<FuncId, BuilderError> {
    let mut sig = module.make_signature();
    for _ in 0..arity {
        sig.params.push(AbiParam::new(F64));
    }
    sig.returns.push(AbiParam::new(F64));

    Ok(module.declare_function(symbol, Linkage::Import, &sig)?)
}

/// Emits a call to a previously linked routine and returns its result.
pub(crate) fn call(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    func_id: FuncId,
    args: &[Value],
) -> Value {
    let func = module.declare_func_in_func(func_id, builder.func);
    let call = builder.ins().call(func, args);
    builder.inst_results(call)[0]
}

/// Emits `func(arg)` for a whitelisted function.
///
/// `abs` and `sqrt` lower to single instructions; the rest are imported calls.
pub(crate) fn call_func(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    func: Func,
    arg: Value,
) -> Result<Value, BuilderError> {
    let value = match func {
        Func::Abs => builder.ins().fabs(arg),
        Func::Sqrt => builder.ins().sqrt(arg),
        Func::Sin => trigonometric::call_sin(builder, module, arg)?,
        Func::Cos => trigonometric::call_cos(builder, module, arg)?,
        Func::Tan => trigonometric::call_tan(builder, module, arg)?,
        Func::Exp => exp::call_exp(builder, module, arg)?,
        Func::Log => ln::call_ln(builder, module, arg)?,
    };
    Ok(value)
}
