//! Grammar productions.
//!
//! Statements parse fully before their action runs; a statement with a
//! syntax error reports, resynchronizes, and emits nothing of its own.
//! Expression actions run as operands are reduced, so partial code from a
//! broken statement may remain. Compilation fails in that case anyway.

mod expressions;
mod statements;

use super::core::Parser;

impl Parser<'_> {
    pub fn parse_program(&mut self) {
        self.builder.begin_program();
        while !self.should_stop() {
            self.parse_statement();
        }
    }
}
