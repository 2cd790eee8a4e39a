//! Value types, compile-time constants and source-level operators.

use std::fmt;

use kestrel_bytecode::{BinaryOp, UnaryOp};

/// Semantic type of an expression. Every type occupies one word.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ValueType {
    Int,
    Float,
    /// Result of comparisons and logical operators, stored as 0 or 1.
    Bool,
}

impl ValueType {
    /// `int` and `bool` share the integer instruction set.
    pub fn is_integral(self) -> bool {
        matches!(self, Self::Int | Self::Bool)
    }

    /// Type a variable gets when implicitly declared from a value of this type.
    pub fn storage(self) -> Self {
        match self {
            Self::Bool => Self::Int,
            other => other,
        }
    }

    /// Whether a slot of this type can hold a value of type `value`.
    pub fn accepts(self, value: ValueType) -> bool {
        match self {
            Self::Float => value == Self::Float,
            Self::Int | Self::Bool => value.is_integral(),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// A value known at compile time.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Constant {
    Int(i32),
    Float(f32),
    Bool(bool),
}

impl Constant {
    pub fn ty(self) -> ValueType {
        match self {
            Self::Int(_) => ValueType::Int,
            Self::Float(_) => ValueType::Float,
            Self::Bool(_) => ValueType::Bool,
        }
    }

    /// Machine word: integers as-is, booleans as 0/1, floats as their bit pattern.
    pub fn to_word(self) -> i32 {
        match self {
            Self::Int(v) => v,
            Self::Float(v) => v.to_bits() as i32,
            Self::Bool(b) => b as i32,
        }
    }

    /// Integer view of an integral constant.
    pub fn as_int(self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(v),
            Self::Bool(b) => Some(b as i32),
            Self::Float(_) => None,
        }
    }

    pub fn is_zero(self) -> bool {
        match self {
            Self::Int(v) => v == 0,
            Self::Float(v) => v == 0.0,
            Self::Bool(b) => !b,
        }
    }

    /// Convert for storage in a slot of type `ty`.
    pub fn coerce(self, ty: ValueType) -> Self {
        match (self, ty) {
            (Self::Bool(b), ValueType::Int) => Self::Int(b as i32),
            (c, _) => c,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Binary operators as written in source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum OpClass {
    Arithmetic,
    Comparison,
    Logical,
}

impl BinOp {
    pub fn class(self) -> OpClass {
        match self {
            Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod => OpClass::Arithmetic,
            Self::Lt | Self::Le | Self::Gt | Self::Ge | Self::Eq | Self::Ne => OpClass::Comparison,
            Self::And | Self::Or => OpClass::Logical,
        }
    }

    pub fn machine(self) -> BinaryOp {
        match self {
            Self::Add => BinaryOp::Add,
            Self::Sub => BinaryOp::Sub,
            Self::Mul => BinaryOp::Mul,
            Self::Div => BinaryOp::Div,
            Self::Mod => BinaryOp::Mod,
            Self::Lt => BinaryOp::SetL,
            Self::Le => BinaryOp::SetLe,
            Self::Gt => BinaryOp::SetG,
            Self::Ge => BinaryOp::SetGe,
            Self::Eq => BinaryOp::SetE,
            Self::Ne => BinaryOp::SetNe,
            Self::And => BinaryOp::And,
            Self::Or => BinaryOp::Or,
        }
    }

    pub fn is_division(self) -> bool {
        matches!(self, Self::Div | Self::Mod)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }
}

/// Prefix operators as written in source.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum UnOp {
    Neg,
    Not,
}

impl UnOp {
    pub fn machine(self) -> UnaryOp {
        match self {
            Self::Neg => UnaryOp::Neg,
            Self::Not => UnaryOp::Not,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
        }
    }
}
