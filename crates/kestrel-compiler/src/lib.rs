//! Kestrel compiler: source text in, unlinked [`Program`] out, then
//! [`link`] into an executable [`Image`](kestrel_bytecode::Image).
//!
//! # Example
//!
//! ```
//! let (program, _warnings) = kestrel_compiler::compile("x = 2 + 3; print x;").unwrap();
//! let image = kestrel_compiler::link(program).unwrap();
//! assert_eq!(image.entry(), 0);
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod compile;
pub mod diagnostics;
pub mod link;
pub mod parser;

#[cfg(test)]
mod link_tests;
#[cfg(test)]
mod test_utils;

pub use compile::{CodeBuilder, Program, SymbolInfo};
pub use diagnostics::{Diagnostics, DiagnosticsPrinter, Severity};
pub use link::{LinkError, link};

/// Errors that end compilation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("compilation failed with {} errors", .0.error_count())]
    CompileFailed(Diagnostics),

    /// Recursion fuel exhausted (input nested too deeply).
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    /// A node handle was used after its statement released it.
    #[error(transparent)]
    StaleNode(#[from] compile::StaleNode),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Compile `source` with the default code capacity.
///
/// On success, warnings come back alongside the program.
pub fn compile(source: &str) -> Result<(Program, Diagnostics)> {
    compile_with(source, CodeBuilder::new())
}

/// Compile `source` into a caller-configured builder.
pub fn compile_with(source: &str, builder: CodeBuilder) -> Result<(Program, Diagnostics)> {
    parser::parse_into(source, builder)?.finish()
}
