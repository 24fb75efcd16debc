//! Lightweight peephole optimiser for the flattened stack IR.
//!
//! Pass pipeline
//! -------------
//!  1. **fold_consts**  – constant propagation for the cheap arithmetic ops.
//!  2. **fuse_fma**     – recognise `a*b+c` and `a*b-c` sequences and emit the
//!                        dedicated `Fma` / `Fmsub` opcode.
//!
//! The optimiser iterates the pipeline until a fix-point is reached. Folding never
//! produces a non-finite constant: an operation whose folded value would be NaN or
//! infinite is kept so it is evaluated per sample.

use crate::expr::{FlattenedExpr, LinearOp};

/// Run all optimisation passes until nothing changes.
pub fn optimize(flattened: FlattenedExpr) -> FlattenedExpr {
    if flattened.constant_result.is_some() {
        return flattened;
    }

    let mut ops = flattened.ops;
    loop {
        let len_before = ops.len();
        ops = fold_consts(ops);
        ops = fuse_fma(ops);
        if ops.len() == len_before {
            break;
        }
    }

    FlattenedExpr { ops, ..flattened }
}

// ────────────────────────────────────────────────────────────────────────────
//  Pass 1 – constant folding
// ────────────────────────────────────────────────────────────────────────────
fn fold_consts(ops: Vec<LinearOp>) -> Vec<LinearOp> {
    use LinearOp::*;

    // Mirror the program's effect on a stack of `Option<f64>`: Some if the value
    // is a compile-time constant produced by the last emitted `LoadConst`.
    let mut out: Vec<LinearOp> = Vec::with_capacity(ops.len());
    let mut cstk: Vec<Option<f64>> = Vec::with_capacity(8);

    for op in ops {
        let (pop, _) = op.arity();
        if cstk.len() < pop {
            // Unbalanced program; leave the rest untouched for the evaluator to reject.
            out.push(op);
            cstk.clear();
            continue;
        }

        let folded = match &op {
            LoadConst(c) => Some(*c),
            LoadVar => None,
            Neg => cstk[cstk.len() - 1].map(|v| -v),
            Add | Sub | Mul | Div => match (cstk[cstk.len() - 2], cstk[cstk.len() - 1]) {
                (Some(a), Some(b)) => {
                    let res = match op {
                        Add => a + b,
                        Sub => a - b,
                        Mul => a * b,
                        _ => a / b,
                    };
                    res.is_finite().then_some(res)
                }
                _ => None,
            },
            // transcendental and fused ops are left for the backend
            _ => None,
        };

        if pop == 0 {
            out.push(op);
            cstk.push(folded);
        } else if let Some(value) = folded {
            // drop the loads that produced the operands
            out.truncate(out.len() - pop);
            cstk.truncate(cstk.len() - pop);
            out.push(LoadConst(value));
            cstk.push(Some(value));
        } else {
            cstk.truncate(cstk.len() - pop);
            out.push(op);
            cstk.push(None);
        }
    }
    out
}

// ────────────────────────────────────────────────────────────────────────────
//  Pass 2 – FMA / FMSUB fusion (pattern length = 5 ops)
// ────────────────────────────────────────────────────────────────────────────
fn fuse_fma(ops: Vec<LinearOp>) -> Vec<LinearOp> {
    use LinearOp::*;
    let mut out = Vec::with_capacity(ops.len());
    let mut i = 0;

    while i < ops.len() {
        if i + 4 < ops.len() {
            let window = (&ops[i], &ops[i + 1], &ops[i + 2], &ops[i + 3], &ops[i + 4]);
            let fused = match window {
                (LoadVar | LoadConst(_), LoadVar | LoadConst(_), Mul, LoadVar | LoadConst(_), Add) => {
                    Some(Fma)
                }
                (LoadVar | LoadConst(_), LoadVar | LoadConst(_), Mul, LoadVar | LoadConst(_), Sub) => {
                    Some(Fmsub)
                }
                _ => None,
            };
            if let Some(fused) = fused {
                out.extend_from_slice(&ops[i..i + 2]); // load a, load b
                out.push(ops[i + 3].clone()); // load c
                out.push(fused);
                i += 5;
                continue;
            }
        }
        out.push(ops[i].clone());
        i += 1;
    }
    out
}
