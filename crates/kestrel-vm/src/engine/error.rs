//! Faults that halt execution.

use kestrel_bytecode::{DecodeError, Reg};

/// Every fault names the address of the instruction that raised it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("division by zero at {addr:04x}")]
    DivisionByZero { addr: u32 },

    #[error("stack overflow at {addr:04x}")]
    StackOverflow { addr: u32 },

    #[error("stack underflow at {addr:04x}")]
    StackUnderflow { addr: u32 },

    #[error("memory access out of bounds at {addr:04x}: address {target}")]
    MemoryOutOfBounds { addr: u32, target: i32 },

    #[error("invalid jump target {target} at {addr:04x}")]
    InvalidJumpTarget { addr: u32, target: i32 },

    #[error("invalid instruction at {addr:04x}: {source}")]
    InvalidInstruction { addr: u32, source: DecodeError },

    /// Stack base/top used as a data operand.
    #[error("`{mnemonic}` cannot operate on {reg} at {addr:04x}")]
    ReservedRegister {
        addr: u32,
        reg: Reg,
        mnemonic: &'static str,
    },

    /// Execution fuel exhausted before the instruction at `addr` ran.
    #[error("execution limit of {limit} instructions exceeded at {addr:04x}")]
    ExecFuelExhausted { addr: u32, limit: u32 },
}

impl RuntimeError {
    /// Address of the faulting instruction.
    pub fn addr(&self) -> u32 {
        match *self {
            Self::DivisionByZero { addr }
            | Self::StackOverflow { addr }
            | Self::StackUnderflow { addr }
            | Self::MemoryOutOfBounds { addr, .. }
            | Self::InvalidJumpTarget { addr, .. }
            | Self::InvalidInstruction { addr, .. }
            | Self::ReservedRegister { addr, .. }
            | Self::ExecFuelExhausted { addr, .. } => addr,
        }
    }
}
