//! Expressions by precedence climbing.
//!
//! | prec | operators          |
//! |------|--------------------|
//! | 1    | `\|\|`             |
//! | 2    | `&&`               |
//! | 3    | `==` `!=`          |
//! | 4    | `<` `<=` `>` `>=`  |
//! | 5    | `+` `-`            |
//! | 6    | `*` `/` `%`        |
//!
//! All binary operators are left-associative. Unary `-` and `!` bind tighter
//! than any of them.

use crate::compile::{BinOp, NodeId, UnOp};
use crate::diagnostics::DiagnosticKind;
use crate::parser::core::Parser;
use crate::parser::lexer::TokenKind;

fn binary_op(kind: TokenKind) -> Option<(BinOp, u8)> {
    let op = match kind {
        TokenKind::OrOr => (BinOp::Or, 1),
        TokenKind::AndAnd => (BinOp::And, 2),
        TokenKind::EqEq => (BinOp::Eq, 3),
        TokenKind::NotEq => (BinOp::Ne, 3),
        TokenKind::Less => (BinOp::Lt, 4),
        TokenKind::LessEq => (BinOp::Le, 4),
        TokenKind::Greater => (BinOp::Gt, 4),
        TokenKind::GreaterEq => (BinOp::Ge, 4),
        TokenKind::Plus => (BinOp::Add, 5),
        TokenKind::Minus => (BinOp::Sub, 5),
        TokenKind::Star => (BinOp::Mul, 6),
        TokenKind::Slash => (BinOp::Div, 6),
        TokenKind::Percent => (BinOp::Mod, 6),
        _ => return None,
    };
    Some(op)
}

/// Magnitude of `i32::MIN`, only valid directly after a unary minus.
const MIN_MAGNITUDE: &str = "2147483648";

impl Parser<'_> {
    pub(crate) fn parse_expr(&mut self) -> Option<NodeId> {
        self.parse_binary(1)
    }

    fn parse_binary(&mut self, min_prec: u8) -> Option<NodeId> {
        let start = self.current_span().start();
        let mut lhs = self.parse_unary();

        while let Some((op, prec)) = self.current().and_then(binary_op) {
            if prec < min_prec || self.has_fatal_error() {
                break;
            }
            self.bump();
            let rhs = self.parse_binary(prec + 1);
            let span = self.span_from(start);
            lhs = match (lhs, rhs) {
                (Some(l), Some(r)) => self.builder.binary(op, l, r, span),
                (l, r) => {
                    for id in [l, r].into_iter().flatten() {
                        self.builder.discard(id);
                    }
                    None
                }
            };
        }
        lhs
    }

    fn parse_unary(&mut self) -> Option<NodeId> {
        if !self.enter_recursion() {
            return None;
        }
        let result = self.parse_unary_inner();
        self.exit_recursion();
        result
    }

    fn parse_unary_inner(&mut self) -> Option<NodeId> {
        let start = self.current_span().start();
        let op = match self.current() {
            Some(TokenKind::Minus) => UnOp::Neg,
            Some(TokenKind::Bang) => UnOp::Not,
            _ => return self.parse_primary(),
        };
        self.bump();

        if op == UnOp::Neg
            && self.currently_is(TokenKind::IntLit)
            && self.current_text() == MIN_MAGNITUDE
        {
            self.bump();
            return Some(self.builder.int(i32::MIN, self.span_from(start)));
        }

        let operand = self.parse_unary()?;
        self.builder.unary(op, operand, self.span_from(start))
    }

    fn parse_primary(&mut self) -> Option<NodeId> {
        let span = self.current_span();
        match self.current() {
            Some(TokenKind::IntLit) => {
                let text = self.current_text();
                let value = text.parse::<i32>();
                self.bump();
                match value {
                    Ok(value) => Some(self.builder.int(value, span)),
                    Err(_) => {
                        self.builder
                            .diagnostics_mut()
                            .report(DiagnosticKind::IntegerOutOfRange, span)
                            .message(text)
                            .emit();
                        None
                    }
                }
            }
            Some(TokenKind::FloatLit) => {
                let value = self.current_text().parse::<f32>().unwrap_or(f32::INFINITY);
                self.bump();
                Some(self.builder.float(value, span))
            }
            Some(TokenKind::Ident) => {
                let name = self.current_text();
                self.bump();
                self.builder.variable(name, span)
            }
            Some(TokenKind::ParenOpen) => {
                self.bump();
                let inner = self.parse_expr();
                if !self.eat(TokenKind::ParenClose) {
                    self.error_unclosed_delimiter(DiagnosticKind::UnclosedParen, span);
                    if let Some(id) = inner {
                        self.builder.discard(id);
                    }
                    return None;
                }
                inner
            }
            Some(TokenKind::Garbage) => {
                let text = self.current_text();
                self.error_and_bump(
                    DiagnosticKind::UnexpectedToken,
                    format!("unrecognized input `{text}`"),
                );
                None
            }
            _ => {
                self.error(DiagnosticKind::ExpectedExpression);
                None
            }
        }
    }
}
