//! Lexer and single-pass parser for Kestrel source.
//!
//! There is no syntax tree: the parser calls into the
//! [`CodeBuilder`](crate::compile::CodeBuilder) as it recognizes each
//! construct, and code comes out in source order.
//!
//! # Recovery
//!
//! 1. A statement that fails to parse reports once, then skips past the next
//!    `;` or up to the `}` closing its block.
//! 2. Missing expected tokens emit a diagnostic but don't consume.
//! 3. Unrecognized characters are reported and consumed.
//! 4. Only nesting deeper than the recursion limit aborts the parse.

pub mod lexer;

mod core;
mod grammar;

#[cfg(test)]
mod lexer_tests;

pub use core::Parser;
pub use lexer::{Token, TokenKind, lex, token_text};

use crate::Error;
use crate::compile::CodeBuilder;

/// Nesting depth at which parsing gives up.
pub const DEFAULT_RECURSION_LIMIT: u32 = 256;

/// Parse `source` into `builder`, returning it once every statement has
/// been driven through.
pub fn parse_into(source: &str, builder: CodeBuilder) -> Result<CodeBuilder, Error> {
    Parser::new(source, lex(source), builder)
        .with_recursion_fuel(Some(DEFAULT_RECURSION_LIMIT))
        .parse()
}
