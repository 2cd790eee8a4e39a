//! Fetch/decode/execute engine.

mod error;
mod registers;
mod stack;
mod trace;
mod value;
mod vm;

#[cfg(test)]
mod trace_tests;
#[cfg(test)]
mod vm_tests;

pub use error::RuntimeError;
pub use registers::Registers;
pub use stack::Stack;
pub use trace::{NoopTracer, PrintTracer, Tracer, Verbosity};
pub use value::Value;
pub use vm::{FuelLimits, RunOutcome, VM, VMBuilder};
