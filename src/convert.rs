//! Conversion of evalexpr operator trees into the whitelisted expression AST.
//!
//! evalexpr is only used as a tokenizer and precedence parser here: its tree is never
//! evaluated. `build_ast` walks the tree and accepts exactly
//!
//! * numeric literals (integer or float)
//! * the variable `x`
//! * unary minus and the binary operators `+ - * / ^`
//! * parenthesised groups
//! * one-argument calls of `sin cos tan exp log sqrt abs`, with parentheses
//!
//! `^` chains associate to the right, so `2^3^2` is `2^(3^2)`. evalexpr builds them
//! the other way round and `build_ast` re-associates them.
//!
//! Everything else is rejected with a `ParseError` before anything is evaluated. There
//! is no fallback that looks identifiers up at run time, so text like `os.system(1)`
//! can never reach the host.

use crate::{
    errors::ParseError,
    expr::{Expr, Func, VARIABLE},
};
use evalexpr::{build_operator_tree, DefaultNumericTypes, Node, Operator, Value};

type EvalNode = Node<DefaultNumericTypes>;

const COMMENT_MARKERS: [&str; 2] = ["//", "/*"];

/// Parses expression text into a simplified, whitelisted `Expr`.
///
/// # Errors
/// Returns `ParseError::Syntax` when evalexpr cannot parse the text, or one of the
/// whitelist variants when the text uses anything outside the accepted grammar.
pub fn parse_expression(text: &str) -> Result<Expr, ParseError> {
    // evalexpr would drop everything after these as a comment
    for marker in COMMENT_MARKERS {
        if text.contains(marker) {
            return Err(ParseError::Comment(marker));
        }
    }
    let tree = build_operator_tree::<DefaultNumericTypes>(text).map_err(|source| {
        ParseError::Syntax {
            expression: text.to_string(),
            source,
        }
    })?;
    let expr = build_ast(&tree)?;
    Ok(*expr.simplify())
}

/// Converts an evalexpr node into our internal expression representation.
///
/// # Examples of supported operations:
/// * Basic arithmetic: +, -, *, /
/// * The variable: x
/// * Constants: integer and floating point literals
/// * Functions: sin(), cos(), tan(), exp(), log(), sqrt(), abs()
/// * Exponentiation: x^2, x^0.5, 2^x
pub fn build_ast(node: &EvalNode) -> Result<Expr, ParseError> {
    match node.operator() {
        // Addition and multiplication may carry more than two children
        Operator::Add => fold_children(node, Expr::Add),
        Operator::Mul => fold_children(node, Expr::Mul),
        Operator::Sub => {
            let (l, r) = binary(node)?;
            Ok(Expr::Sub(l, r))
        }
        Operator::Div => {
            let (l, r) = binary(node)?;
            Ok(Expr::Div(l, r))
        }
        Operator::Exp => {
            let mut operands = Vec::new();
            power_chain(node, &mut operands)?;
            let mut operands = operands.into_iter().rev();
            let last = operands
                .next()
                .ok_or(ParseError::MissingOperand("^"))
                .and_then(build_ast)?;
            operands.try_fold(last, |exponent, base| -> Result<Expr, ParseError> {
                Ok(power(build_ast(base)?, exponent))
            })
        }
        Operator::Neg => match node.children() {
            [child] => Ok(Expr::Neg(Box::new(build_ast(child)?))),
            _ => Err(missing_operand(node)),
        },
        Operator::Const { value } => match value {
            Value::Float(f) => Ok(Expr::Const(*f)),
            Value::Int(i) => Ok(Expr::Const(*i as f64)),
            other => Err(ParseError::NonNumericConstant(format!("{other:?}"))),
        },
        Operator::VariableIdentifierRead { identifier } => {
            if identifier == VARIABLE {
                Ok(Expr::Var)
            } else {
                Err(ParseError::UnknownIdentifier(identifier.to_string()))
            }
        }
        Operator::FunctionIdentifier { identifier } => {
            let func = Func::from_identifier(identifier)
                .ok_or_else(|| ParseError::UnsupportedFunction(identifier.to_string()))?;
            let argument = match node.children() {
                [child] if matches!(child.operator(), Operator::RootNode) => {
                    single_argument(child, func)?
                }
                [_] => return Err(ParseError::MissingParentheses(func.name().to_string())),
                _ => return Err(ParseError::Arity(func.name().to_string())),
            };
            Ok(Expr::Call(func, Box::new(build_ast(argument)?)))
        }
        // Parenthesised groups and the tree root
        Operator::RootNode => match node.children() {
            [] => Err(ParseError::Empty),
            [child] => build_ast(child),
            _ => Err(unsupported(node)),
        },
        _ => Err(unsupported(node)),
    }
}

fn unsupported(node: &EvalNode) -> ParseError {
    ParseError::UnsupportedOperator(format!("{:?}", node.operator()))
}

/// Error for a whitelisted operator with too few children.
fn missing_operand(node: &EvalNode) -> ParseError {
    let symbol = match node.operator() {
        Operator::Add => "+",
        Operator::Sub | Operator::Neg => "-",
        Operator::Mul => "*",
        Operator::Div => "/",
        Operator::Exp => "^",
        _ => return unsupported(node),
    };
    ParseError::MissingOperand(symbol)
}

fn binary(node: &EvalNode) -> Result<(Box<Expr>, Box<Expr>), ParseError> {
    match node.children() {
        [left, right] => Ok((Box::new(build_ast(left)?), Box::new(build_ast(right)?))),
        _ => Err(missing_operand(node)),
    }
}

fn fold_children(
    node: &EvalNode,
    combine: fn(Box<Expr>, Box<Expr>) -> Expr,
) -> Result<Expr, ParseError> {
    let (first, rest) = node
        .children()
        .split_first()
        .ok_or_else(|| missing_operand(node))?;
    if rest.is_empty() {
        return Err(missing_operand(node));
    }
    rest.iter()
        .try_fold(build_ast(first)?, |acc, child| -> Result<Expr, ParseError> {
            Ok(combine(Box::new(acc), Box::new(build_ast(child)?)))
        })
}

/// Collects the operands of an unparenthesised `^` chain, leftmost first.
///
/// evalexpr nests `a^b^c` as `(a^b)^c`; a parenthesised base shows up as a
/// `RootNode` and ends the chain.
fn power_chain<'a>(
    node: &'a EvalNode,
    operands: &mut Vec<&'a EvalNode>,
) -> Result<(), ParseError> {
    match node.children() {
        [base, exponent] => {
            if matches!(base.operator(), Operator::Exp) {
                power_chain(base, operands)?;
            } else {
                operands.push(base);
            }
            operands.push(exponent);
            Ok(())
        }
        _ => Err(missing_operand(node)),
    }
}

fn power(base: Expr, exponent: Expr) -> Expr {
    match exponent {
        Expr::Const(value) => *Expr::power(Box::new(base), value),
        other => Expr::PowExpr(Box::new(base), Box::new(other)),
    }
}

/// Strips the parentheses around a call argument and checks there is exactly one.
fn single_argument(node: &EvalNode, func: Func) -> Result<&EvalNode, ParseError> {
    let mut current = node;
    loop {
        match (current.operator(), current.children()) {
            (Operator::RootNode, [inner]) => current = inner,
            (Operator::RootNode, [])
            | (Operator::Tuple, _)
            | (Operator::Const { value: Value::Empty }, _)
            | (Operator::Const { value: Value::Tuple(_) }, _) => {
                return Err(ParseError::Arity(func.name().to_string()))
            }
            _ => return Ok(current),
        }
    }
}
