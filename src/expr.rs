//! Expression module for representing whitelisted plot expressions.
//!
//! This module defines the tagged-variant AST every accepted expression is turned into.
//! The AST can only describe:
//!
//! - Leaf nodes: numeric constants and the variable `x`
//! - Unary operations: negation and calls of a whitelisted `Func`
//! - Binary operations: Add, Sub, Mul, Div
//! - Powers: integer exponent, float exponent, or an arbitrary exponent expression
//!
//! There is no node for an unknown identifier, so anything outside the whitelist has
//! to be rejected while the AST is being built (see `convert`).
//!
//! # Evaluation
//! An expression is never walked recursively per sample. It is flattened once into a
//! postfix `LinearOp` program that both the JIT builder and the interpreter consume, so
//! both backends perform the exact same floating point operations in the same order.
//!
//! # Simplification
//! `simplify` only applies rewrites that keep NaN and infinity propagation intact.
//! `x/x` stays a division: at `x = 0` it must produce a gap, not `1`.

use std::fmt;

/// The name of the only variable an expression may reference.
pub const VARIABLE: &str = "x";

/// The closed set of functions an expression may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
    Sin,
    Cos,
    Tan,
    Exp,
    /// Natural logarithm
    Log,
    Sqrt,
    Abs,
}

impl Func {
    /// Every whitelisted function, in the order they are listed to users.
    pub const ALL: [Func; 7] = [
        Func::Sin,
        Func::Cos,
        Func::Tan,
        Func::Exp,
        Func::Log,
        Func::Sqrt,
        Func::Abs,
    ];

    /// Looks up a whitelisted function by its identifier.
    pub fn from_identifier(identifier: &str) -> Option<Func> {
        Func::ALL.into_iter().find(|f| f.name() == identifier)
    }

    /// The identifier the function is spelled with in expressions.
    pub fn name(self) -> &'static str {
        match self {
            Func::Sin => "sin",
            Func::Cos => "cos",
            Func::Tan => "tan",
            Func::Exp => "exp",
            Func::Log => "log",
            Func::Sqrt => "sqrt",
            Func::Abs => "abs",
        }
    }

    /// Applies the function to a single value.
    ///
    /// Domain errors are not reported: `log(-1)` is NaN, `log(0)` is -inf.
    pub fn apply(self, value: f64) -> f64 {
        match self {
            Func::Sin => value.sin(),
            Func::Cos => value.cos(),
            Func::Tan => value.tan(),
            Func::Exp => value.exp(),
            Func::Log => value.ln(),
            Func::Sqrt => value.sqrt(),
            Func::Abs => value.abs(),
        }
    }
}

/// An expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A constant floating point value
    Const(f64),
    /// The plot variable `x`
    Var,
    /// Addition of two expressions
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction of two expressions
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication of two expressions
    Mul(Box<Expr>, Box<Expr>),
    /// Division of two expressions
    Div(Box<Expr>, Box<Expr>),
    /// Negation of an expression
    Neg(Box<Expr>),
    /// Exponentiation by an integer constant
    Pow(Box<Expr>, i64),
    /// Exponentiation by a non-integral constant
    PowFloat(Box<Expr>, f64),
    /// Exponentiation by another expression
    PowExpr(Box<Expr>, Box<Expr>),
    /// Call of a whitelisted function
    Call(Func, Box<Expr>),
}

/// Linear operation for flattened expression evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum LinearOp {
    /// Load constant value
    LoadConst(f64),
    /// Load the sample value of `x`
    LoadVar,
    /// Add two values from stack positions
    Add,
    /// Subtract two values from stack positions
    Sub,
    /// Multiply two values from stack positions
    Mul,
    /// Divide two values from stack positions
    Div,
    /// Negate stack top
    Neg,
    /// Power operation with integer constant exponent
    PowConst(i64),
    /// Power operation with floating point constant exponent
    PowFloat(f64),
    /// Power operation with expression exponent
    PowExpr,
    /// Whitelisted function applied to stack top
    Call(Func),
    /// a × b + c  (fused)
    Fma,
    /// a × b − c  (fused)
    Fmsub,
}

impl LinearOp {
    /// Number of operands popped and pushed by the operation.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            LinearOp::LoadConst(_) | LinearOp::LoadVar => (0, 1),
            LinearOp::Neg
            | LinearOp::PowConst(_)
            | LinearOp::PowFloat(_)
            | LinearOp::Call(_) => (1, 1),
            LinearOp::Add
            | LinearOp::Sub
            | LinearOp::Mul
            | LinearOp::Div
            | LinearOp::PowExpr => (2, 1),
            LinearOp::Fma | LinearOp::Fmsub => (3, 1),
        }
    }
}

/// Flattened expression representation for efficient evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenedExpr {
    /// Linear sequence of operations
    pub ops: Vec<LinearOp>,
    /// Pre-computed constant result (if expression is constant)
    pub constant_result: Option<f64>,
}

impl FlattenedExpr {
    /// The deepest the operand stack gets while running the program.
    pub fn max_stack_depth(&self) -> usize {
        let mut depth = 0usize;
        let mut max = 0usize;
        for op in &self.ops {
            let (pop, push) = op.arity();
            depth = depth.saturating_sub(pop) + push;
            max = max.max(depth);
        }
        max
    }

    /// Runs the program for a single value of `x`.
    ///
    /// `stack` is scratch space reused across samples; it is cleared on entry.
    pub fn eval(&self, x: f64, stack: &mut Vec<f64>) -> Option<f64> {
        if let Some(c) = self.constant_result {
            return Some(c);
        }
        stack.clear();
        for op in &self.ops {
            let value = match op {
                LinearOp::LoadConst(c) => *c,
                LinearOp::LoadVar => x,
                LinearOp::Neg => -stack.pop()?,
                LinearOp::PowConst(e) => powi_binary(stack.pop()?, *e),
                LinearOp::PowFloat(e) => stack.pop()?.powf(*e),
                LinearOp::Call(f) => f.apply(stack.pop()?),
                LinearOp::Add | LinearOp::Sub | LinearOp::Mul | LinearOp::Div | LinearOp::PowExpr => {
                    let r = stack.pop()?;
                    let l = stack.pop()?;
                    match op {
                        LinearOp::Add => l + r,
                        LinearOp::Sub => l - r,
                        LinearOp::Mul => l * r,
                        LinearOp::Div => l / r,
                        _ => l.powf(r),
                    }
                }
                LinearOp::Fma | LinearOp::Fmsub => {
                    let c = stack.pop()?;
                    let b = stack.pop()?;
                    let a = stack.pop()?;
                    if matches!(op, LinearOp::Fma) {
                        a.mul_add(b, c)
                    } else {
                        a.mul_add(b, -c)
                    }
                }
            };
            stack.push(value);
        }
        match stack.as_slice() {
            [result] => Some(*result),
            _ => None,
        }
    }
}

/// Integer power by binary exponentiation.
///
/// The JIT emits the exact same multiplication sequence (see
/// `builder::generate_optimized_power`), so both backends round identically.
pub fn powi_binary(base: f64, exp: i64) -> f64 {
    let mut result = 1.0;
    let mut current = base;
    let mut remaining = exp.unsigned_abs();
    while remaining > 0 {
        if remaining & 1 == 1 {
            result *= current;
        }
        if remaining > 1 {
            current *= current;
        }
        remaining >>= 1;
    }
    if exp < 0 {
        1.0 / result
    } else {
        result
    }
}

impl Expr {
    /// Simplifies the expression without changing its value at any sample.
    ///
    /// Performed rewrites:
    /// - Constant folding of subtrees that do not mention `x`
    /// - Identity rules: `e + 0`, `0 + e`, `e - 0`, `e * 1`, `1 * e`, `e / 1`, `e ^ 1`
    /// - Double negation: `-(-e)`
    /// - Constant exponents of `PowExpr` become `Pow` or `PowFloat`
    pub fn simplify(&self) -> Box<Expr> {
        if let Some(c) = self.try_evaluate_constant() {
            return Box::new(Expr::Const(c));
        }

        match self {
            Expr::Const(_) | Expr::Var => Box::new(self.clone()),

            Expr::Add(left, right) => {
                let l = left.simplify();
                let r = right.simplify();
                match (&*l, &*r) {
                    (Expr::Const(a), _) if *a == 0.0 => r,
                    (_, Expr::Const(b)) if *b == 0.0 => l,
                    _ => Box::new(Expr::Add(l, r)),
                }
            }

            Expr::Sub(left, right) => {
                let l = left.simplify();
                let r = right.simplify();
                match &*r {
                    Expr::Const(b) if *b == 0.0 => l,
                    _ => Box::new(Expr::Sub(l, r)),
                }
            }

            Expr::Mul(left, right) => {
                let l = left.simplify();
                let r = right.simplify();
                match (&*l, &*r) {
                    (Expr::Const(a), _) if *a == 1.0 => r,
                    (_, Expr::Const(b)) if *b == 1.0 => l,
                    _ => Box::new(Expr::Mul(l, r)),
                }
            }

            Expr::Div(left, right) => {
                let l = left.simplify();
                let r = right.simplify();
                match &*r {
                    Expr::Const(b) if *b == 1.0 => l,
                    _ => Box::new(Expr::Div(l, r)),
                }
            }

            Expr::Neg(expr) => {
                let e = expr.simplify();
                match *e {
                    Expr::Neg(inner) => inner,
                    other => Box::new(Expr::Neg(Box::new(other))),
                }
            }

            Expr::Pow(base, exp) => {
                let b = base.simplify();
                if *exp == 1 {
                    b
                } else {
                    Box::new(Expr::Pow(b, *exp))
                }
            }

            Expr::PowFloat(base, exp) => Box::new(Expr::PowFloat(base.simplify(), *exp)),

            Expr::PowExpr(base, exponent) => {
                let b = base.simplify();
                let e = exponent.simplify();
                match *e {
                    Expr::Const(c) => Expr::power(b, c).simplify(),
                    other => Box::new(Expr::PowExpr(b, Box::new(other))),
                }
            }

            Expr::Call(func, arg) => Box::new(Expr::Call(*func, arg.simplify())),
        }
    }

    /// Builds `base ^ exponent` for a constant exponent, preferring the integer form.
    pub fn power(base: Box<Expr>, exponent: f64) -> Box<Expr> {
        // Keep integer exponents small enough that binary exponentiation stays short.
        if exponent.fract() == 0.0 && exponent.abs() <= 1024.0 {
            Box::new(Expr::Pow(base, exponent as i64))
        } else {
            Box::new(Expr::PowFloat(base, exponent))
        }
    }

    /// Tries to evaluate expression as constant.
    ///
    /// Returns `None` for subtrees mentioning `x` and for constant subtrees whose value
    /// is not finite, so that a literal `1/0` is evaluated per sample like everything
    /// else instead of being baked into the program.
    fn try_evaluate_constant(&self) -> Option<f64> {
        let value = match self {
            Expr::Const(val) => *val,
            Expr::Var => return None,
            Expr::Add(left, right) => left.try_evaluate_constant()? + right.try_evaluate_constant()?,
            Expr::Sub(left, right) => left.try_evaluate_constant()? - right.try_evaluate_constant()?,
            Expr::Mul(left, right) => left.try_evaluate_constant()? * right.try_evaluate_constant()?,
            Expr::Div(left, right) => left.try_evaluate_constant()? / right.try_evaluate_constant()?,
            Expr::Neg(expr) => -expr.try_evaluate_constant()?,
            Expr::Pow(base, exp) => powi_binary(base.try_evaluate_constant()?, *exp),
            Expr::PowFloat(base, exp) => base.try_evaluate_constant()?.powf(*exp),
            Expr::PowExpr(base, exponent) => base
                .try_evaluate_constant()?
                .powf(exponent.try_evaluate_constant()?),
            Expr::Call(func, arg) => func.apply(arg.try_evaluate_constant()?),
        };
        value.is_finite().then_some(value)
    }

    /// Flattens the tree into a postfix program.
    pub fn flatten(&self) -> FlattenedExpr {
        if let Some(constant) = self.try_evaluate_constant() {
            return FlattenedExpr {
                ops: vec![LinearOp::LoadConst(constant)],
                constant_result: Some(constant),
            };
        }

        let mut ops = Vec::new();
        self.flatten_recursive(&mut ops);
        FlattenedExpr {
            ops,
            constant_result: None,
        }
    }

    fn flatten_recursive(&self, ops: &mut Vec<LinearOp>) {
        match self {
            Expr::Const(val) => ops.push(LinearOp::LoadConst(*val)),
            Expr::Var => ops.push(LinearOp::LoadVar),
            Expr::Add(left, right)
            | Expr::Sub(left, right)
            | Expr::Mul(left, right)
            | Expr::Div(left, right)
            | Expr::PowExpr(left, right) => {
                left.flatten_recursive(ops);
                right.flatten_recursive(ops);
                ops.push(match self {
                    Expr::Add(..) => LinearOp::Add,
                    Expr::Sub(..) => LinearOp::Sub,
                    Expr::Mul(..) => LinearOp::Mul,
                    Expr::Div(..) => LinearOp::Div,
                    _ => LinearOp::PowExpr,
                });
            }
            Expr::Neg(expr) => {
                expr.flatten_recursive(ops);
                ops.push(LinearOp::Neg);
            }
            Expr::Pow(base, exp) => {
                base.flatten_recursive(ops);
                ops.push(LinearOp::PowConst(*exp));
            }
            Expr::PowFloat(base, exp) => {
                base.flatten_recursive(ops);
                ops.push(LinearOp::PowFloat(*exp));
            }
            Expr::Call(func, arg) => {
                arg.flatten_recursive(ops);
                ops.push(LinearOp::Call(*func));
            }
        }
    }
}

/// Formats expressions in fully parenthesised infix notation.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(val) => write!(f, "{val}"),
            Expr::Var => write!(f, "{VARIABLE}"),
            Expr::Add(left, right) => write!(f, "({left} + {right})"),
            Expr::Sub(left, right) => write!(f, "({left} - {right})"),
            Expr::Mul(left, right) => write!(f, "({left} * {right})"),
            Expr::Div(left, right) => write!(f, "({left} / {right})"),
            Expr::Neg(expr) => write!(f, "-({expr})"),
            Expr::Pow(base, exp) => write!(f, "({base}^{exp})"),
            Expr::PowFloat(base, exp) => write!(f, "({base}^{exp})"),
            Expr::PowExpr(base, exponent) => write!(f, "({base}^{exponent})"),
            Expr::Call(func, arg) => write!(f, "{}({arg})", func.name()),
        }
    }
}
