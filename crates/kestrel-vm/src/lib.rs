//! Virtual machine for linked Kestrel images.
//!
//! The VM fetches, decodes and executes one 9-byte instruction at a time
//! against a register file and a downward-growing byte stack, until the
//! instruction pointer reaches the end of the code or a fault halts it.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod engine;

pub use engine::{
    FuelLimits, NoopTracer, PrintTracer, Registers, RunOutcome, RuntimeError, Stack, Tracer, VM,
    VMBuilder, Value, Verbosity,
};
