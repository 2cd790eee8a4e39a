#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Primitives shared by every Kestrel stage.
//!
//! - [`Interner`] / [`Symbol`]: identifier interning for the scope table
//! - [`Colors`]: ANSI palette used by the disassembler, tracer and CLI

mod colors;
mod interner;

#[cfg(test)]
mod interner_tests;

pub use colors::Colors;
pub use interner::{Interner, Symbol};
