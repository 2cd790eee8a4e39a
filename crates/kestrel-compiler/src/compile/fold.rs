//! Compile-time evaluation of operators on constant operands.
//!
//! Integer results go through the same `BinaryOp::eval` the VM uses, so a
//! folded expression and its runtime counterpart always agree.

use thiserror::Error;

use super::nodes::ExprNode;
use super::types::{BinOp, Constant, OpClass, UnOp, ValueType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FoldError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("cannot apply `{op}` to {lhs} and {rhs}")]
    BinaryMismatch {
        op: &'static str,
        lhs: ValueType,
        rhs: ValueType,
    },
    #[error("cannot apply `{op}` to {operand}")]
    UnaryMismatch {
        op: &'static str,
        operand: ValueType,
    },
}

/// Result type of `lhs op rhs`, or why the operands don't fit.
pub fn binary_type(op: BinOp, lhs: ValueType, rhs: ValueType) -> Result<ValueType, FoldError> {
    let mismatch = || FoldError::BinaryMismatch {
        op: op.symbol(),
        lhs,
        rhs,
    };
    let both_float = lhs == ValueType::Float && rhs == ValueType::Float;
    let both_integral = lhs.is_integral() && rhs.is_integral();
    match op.class() {
        OpClass::Arithmetic if both_float => Ok(ValueType::Float),
        OpClass::Arithmetic if both_integral => Ok(ValueType::Int),
        OpClass::Comparison if both_float || both_integral => Ok(ValueType::Bool),
        OpClass::Logical if both_integral => Ok(ValueType::Bool),
        _ => Err(mismatch()),
    }
}

pub fn unary_type(op: UnOp, operand: ValueType) -> Result<ValueType, FoldError> {
    match (op, operand) {
        (UnOp::Neg, ValueType::Float) => Ok(ValueType::Float),
        (UnOp::Neg, _) => Ok(ValueType::Int),
        (UnOp::Not, ty) if ty.is_integral() => Ok(ValueType::Bool),
        (UnOp::Not, ty) => Err(FoldError::UnaryMismatch {
            op: op.symbol(),
            operand: ty,
        }),
    }
}

/// Fold `lhs op rhs`.
///
/// Returns `Ok(None)` when either operand is only known at runtime.
pub fn fold_binary(
    op: BinOp,
    lhs: &ExprNode,
    rhs: &ExprNode,
) -> Result<Option<Constant>, FoldError> {
    binary_type(op, lhs.ty, rhs.ty)?;
    let (Some(a), Some(b)) = (lhs.as_constant(), rhs.as_constant()) else {
        return Ok(None);
    };
    eval_binary(op, a, b).map(Some)
}

pub fn eval_binary(op: BinOp, a: Constant, b: Constant) -> Result<Constant, FoldError> {
    let ty = binary_type(op, a.ty(), b.ty())?;
    if op.is_division() && b.is_zero() {
        return Err(FoldError::DivisionByZero);
    }

    if let (Constant::Float(x), Constant::Float(y)) = (a, b) {
        return Ok(match op {
            BinOp::Add => Constant::Float(x + y),
            BinOp::Sub => Constant::Float(x - y),
            BinOp::Mul => Constant::Float(x * y),
            BinOp::Div => Constant::Float(x / y),
            BinOp::Mod => Constant::Float(x % y),
            BinOp::Lt => Constant::Bool(x < y),
            BinOp::Le => Constant::Bool(x <= y),
            BinOp::Gt => Constant::Bool(x > y),
            BinOp::Ge => Constant::Bool(x >= y),
            BinOp::Eq => Constant::Bool(x == y),
            BinOp::Ne => Constant::Bool(x != y),
            BinOp::And | BinOp::Or => {
                return Err(FoldError::BinaryMismatch {
                    op: op.symbol(),
                    lhs: a.ty(),
                    rhs: b.ty(),
                });
            }
        });
    }

    // Both integral (checked by `binary_type`).
    let (Some(mut x), Some(mut y)) = (a.as_int(), b.as_int()) else {
        return Err(FoldError::BinaryMismatch {
            op: op.symbol(),
            lhs: a.ty(),
            rhs: b.ty(),
        });
    };
    if op.class() == OpClass::Logical {
        x = (x != 0) as i32;
        y = (y != 0) as i32;
    }
    let word = op
        .machine()
        .eval(x, y)
        .ok_or(FoldError::DivisionByZero)?;
    Ok(match ty {
        ValueType::Bool => Constant::Bool(word != 0),
        _ => Constant::Int(word),
    })
}

pub fn fold_unary(op: UnOp, operand: &ExprNode) -> Result<Option<Constant>, FoldError> {
    unary_type(op, operand.ty)?;
    let Some(c) = operand.as_constant() else {
        return Ok(None);
    };
    eval_unary(op, c).map(Some)
}

pub fn eval_unary(op: UnOp, c: Constant) -> Result<Constant, FoldError> {
    let ty = unary_type(op, c.ty())?;
    Ok(match c {
        Constant::Float(x) => Constant::Float(-x),
        _ => {
            let x = c.as_int().unwrap_or_default();
            let word = op.machine().eval(x);
            match ty {
                ValueType::Bool => Constant::Bool(word != 0),
                _ => Constant::Int(word),
            }
        }
    })
}

