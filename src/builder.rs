//! JIT compilation of plot expressions with Cranelift.
//!
//! An expression is compiled from its optimized postfix program into a native
//! `extern "C" fn(f64) -> f64` kernel. The kernel owns its `JITModule`; the executable
//! memory is released when the kernel is dropped, so compiling one kernel per request
//! does not grow the process.
//!
//! The main entry points are:
//! - `build_function()` - compiles a flattened program into a `JitKernel`
//! - `get_clif_ir()` - returns the textual Cranelift IR, for inspection

use std::sync::Arc;

use crate::{
    errors::BuilderError,
    expr::{FlattenedExpr, LinearOp},
    operators,
    types::SampleFn,
};
use cranelift::prelude::*;
use cranelift_codegen::Context;
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{default_libcall_names, Linkage, Module};
use isa::TargetIsa;
use log::debug;

/// A compiled expression together with the module that owns its machine code.
pub struct JitKernel {
    module: Option<JITModule>,
    func: SampleFn,
}

impl JitKernel {
    /// Evaluates the kernel at a single point.
    #[inline]
    pub fn call(&self, x: f64) -> f64 {
        (self.func)(x)
    }
}

impl Drop for JitKernel {
    fn drop(&mut self) {
        if let Some(module) = self.module.take() {
            // SAFETY: `func` points into this module and is never called after drop.
            unsafe { module.free_memory() };
        }
    }
}

impl std::fmt::Debug for JitKernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JitKernel").finish_non_exhaustive()
    }
}

/// Builds a JIT-compiled kernel from a flattened program.
///
/// # Errors
/// Returns a `BuilderError` if the host is not supported by Cranelift, if the program
/// is unbalanced, or if code generation fails.
pub fn build_function(program: &FlattenedExpr) -> Result<JitKernel, BuilderError> {
    let isa = create_isa()?;
    let (mut module, mut ctx) = create_module_and_context(isa);
    build_function_body(&mut ctx, program, &mut module)?;

    let func_id = module.declare_function("plot_kernel", Linkage::Local, &ctx.func.signature)?;
    module.define_function(func_id, &mut ctx)?;
    module.clear_context(&mut ctx);
    module.finalize_definitions()?;

    // SAFETY: the function was compiled with the signature fn(f64) -> f64 using the
    // platform calling convention, and the module stays alive inside the returned kernel.
    let func = unsafe {
        std::mem::transmute::<*const u8, SampleFn>(module.get_finalized_function(func_id))
    };
    debug!("compiled kernel with {} ops", program.ops.len());

    Ok(JitKernel {
        module: Some(module),
        func,
    })
}

/// Returns the Cranelift IR generated for a program, without finalizing it.
pub fn get_clif_ir(program: &FlattenedExpr) -> Result<String, BuilderError> {
    let isa = create_isa()?;
    let (mut module, mut ctx) = create_module_and_context(isa);
    build_function_body(&mut ctx, program, &mut module)?;
    let ir = ctx.func.display().to_string();
    // SAFETY: nothing was finalized, so no function pointers into the module exist.
    unsafe { module.free_memory() };
    Ok(ir)
}

/// Creates an Instruction Set Architecture (ISA) target for code generation.
///
/// Detects the host machine architecture and configures the flags for it on every
/// architecture the same way.
pub(crate) fn create_isa() -> Result<Arc<dyn TargetIsa>, BuilderError> {
    let mut flag_builder = settings::builder();

    // cranelift-jit links in place and refuses position independent code
    for (name, value) in [
        ("use_colocated_libcalls", "false"),
        ("is_pic", "false"),
        ("opt_level", "speed"),
    ] {
        flag_builder
            .set(name, value)
            .map_err(|err| BuilderError::Setting(format!("{name}={value}: {err}")))?;
    }

    let isa_builder = cranelift_native::builder()
        .map_err(|msg| {
            BuilderError::HostMachineNotSupported(format!(
                "{}: {msg}",
                target_lexicon::Triple::host()
            ))
        })?;

    Ok(isa_builder.finish(settings::Flags::new(flag_builder))?)
}

/// Creates a new JIT module and a function context with the kernel signature.
///
/// The routines of `operators` are registered as symbols, and the signature is
/// `fn(x: f64) -> f64`.
pub(crate) fn create_module_and_context(isa: Arc<dyn TargetIsa>) -> (JITModule, Context) {
    let mut builder = JITBuilder::with_isa(isa, default_libcall_names());
    operators::register_symbols(&mut builder);

    let module = JITModule::new(builder);
    let mut ctx = module.make_context();

    let mut sig = module.make_signature();
    sig.params.push(AbiParam::new(types::F64));
    sig.returns.push(AbiParam::new(types::F64));
    ctx.func.signature = sig;

    (module, ctx)
}

/// Builds the function body by running the postfix program over a value stack of
/// Cranelift SSA values.
fn build_function_body(
    ctx: &mut Context,
    program: &FlattenedExpr,
    module: &mut dyn Module,
) -> Result<(), BuilderError> {
    let mut builder_ctx = FunctionBuilderContext::new();
    let mut builder = FunctionBuilder::new(&mut ctx.func, &mut builder_ctx);

    let entry_block = builder.create_block();
    builder.append_block_params_for_function_params(entry_block);
    builder.switch_to_block(entry_block);
    builder.seal_block(entry_block);

    let x = builder.block_params(entry_block)[0];
    let result = match program.constant_result {
        Some(c) => builder.ins().f64const(c),
        None => codegen_program(&mut builder, module, &program.ops, x)?,
    };

    builder.ins().return_(&[result]);
    builder.finalize();
    Ok(())
}

fn codegen_program(
    builder: &mut FunctionBuilder,
    module: &mut dyn Module,
    ops: &[LinearOp],
    x: Value,
) -> Result<Value, BuilderError> {
    let mut stack: Vec<Value> = Vec::with_capacity(ops.len());
    let underflow = || BuilderError::Program("operand stack underflow".to_string());

    for op in ops {
        let value = match op {
            LinearOp::LoadConst(v) => builder.ins().f64const(*v),
            LinearOp::LoadVar => x,
            LinearOp::Neg => {
                let v = stack.pop().ok_or_else(underflow)?;
                builder.ins().fneg(v)
            }
            LinearOp::PowConst(e) => {
                let base = stack.pop().ok_or_else(underflow)?;
                generate_optimized_power(builder, base, *e)
            }
            LinearOp::PowFloat(e) => {
                let base = stack.pop().ok_or_else(underflow)?;
                let exponent = builder.ins().f64const(*e);
                operators::pow::call_powf(builder, module, base, exponent)?
            }
            LinearOp::Call(func) => {
                let v = stack.pop().ok_or_else(underflow)?;
                operators::call_func(builder, module, *func, v)?
            }
            LinearOp::Add | LinearOp::Sub | LinearOp::Mul | LinearOp::Div | LinearOp::PowExpr => {
                let r = stack.pop().ok_or_else(underflow)?;
                let l = stack.pop().ok_or_else(underflow)?;
                match op {
                    LinearOp::Add => builder.ins().fadd(l, r),
                    LinearOp::Sub => builder.ins().fsub(l, r),
                    LinearOp::Mul => builder.ins().fmul(l, r),
                    LinearOp::Div => builder.ins().fdiv(l, r),
                    _ => operators::pow::call_powf(builder, module, l, r)?,
                }
            }
            LinearOp::Fma | LinearOp::Fmsub => {
                let c = stack.pop().ok_or_else(underflow)?;
                let b = stack.pop().ok_or_else(underflow)?;
                let a = stack.pop().ok_or_else(underflow)?;
                // a*b - c  ==  fma(a, b, -c)
                let c = if matches!(op, LinearOp::Fmsub) {
                    builder.ins().fneg(c)
                } else {
                    c
                };
                builder.ins().fma(a, b, c)
            }
        };
        stack.push(value);
    }

    match stack.as_slice() {
        [result] => Ok(*result),
        _ => Err(BuilderError::Program(format!(
            "expected one result, found {}",
            stack.len()
        ))),
    }
}

/// Generates integer powers by binary exponentiation.
///
/// Mirrors `expr::powi_binary` multiplication for multiplication.
fn generate_optimized_power(builder: &mut FunctionBuilder, base: Value, exp: i64) -> Value {
    let mut result = builder.ins().f64const(1.0);
    let mut current_base = base;
    let mut remaining = exp.unsigned_abs();

    while remaining > 0 {
        if remaining & 1 == 1 {
            result = builder.ins().fmul(result, current_base);
        }
        if remaining > 1 {
            current_base = builder.ins().fmul(current_base, current_base);
        }
        remaining >>= 1;
    }

    if exp < 0 {
        let one = builder.ins().f64const(1.0);
        builder.ins().fdiv(one, result)
    } else {
        result
    }
}
