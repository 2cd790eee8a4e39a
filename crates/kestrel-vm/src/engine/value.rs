use std::fmt;

use kestrel_bytecode::PrintFormat;
use serde::Serialize;

/// A value passed to the print special.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Int(i32),
    Float(f32),
}

impl Value {
    /// Interpret a machine word the way the print instruction asks for.
    pub fn from_word(word: i32, format: PrintFormat) -> Self {
        match format {
            PrintFormat::Int => Self::Int(word),
            PrintFormat::Float => Self::Float(f32::from_bits(word as u32)),
        }
    }

    pub fn as_int(self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(v),
            Self::Float(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
        }
    }
}
