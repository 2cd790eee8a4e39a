use rowan::TextRange;

use crate::compile::{NodeId, ValueType};
use crate::diagnostics::DiagnosticKind;
use crate::parser::core::Parser;
use crate::parser::lexer::TokenKind;

impl<'src> Parser<'src> {
    /// One statement, followed by a statement boundary in the builder.
    pub(crate) fn parse_statement(&mut self) {
        if !self.enter_recursion() {
            self.pos = self.tokens.len();
            return;
        }

        match self.current() {
            Some(TokenKind::KwInt | TokenKind::KwFloat) => self.parse_declaration(),
            Some(TokenKind::KwConst) => self.parse_const(),
            Some(TokenKind::KwPrint) => self.parse_print(),
            Some(TokenKind::KwIf) => self.parse_if(),
            Some(TokenKind::KwWhile) => self.parse_while(),
            Some(TokenKind::KwDo) => self.parse_do(),
            Some(TokenKind::KwBreak | TokenKind::KwContinue) => self.parse_loop_exit(),
            Some(TokenKind::BraceOpen) => self.parse_block(),
            Some(TokenKind::Semicolon) => self.bump(),
            Some(TokenKind::BraceClose) => {
                self.error_and_bump(DiagnosticKind::UnexpectedToken, "unmatched `}`")
            }
            Some(TokenKind::Ident) if self.nth(1) == Some(TokenKind::Equals) => {
                self.parse_assignment()
            }
            Some(_) => self.parse_expression_statement(),
            None => {}
        }

        self.builder.end_statement();
        self.exit_recursion();
    }

    /// Consume the terminating `;`, or report and resynchronize.
    fn expect_semicolon(&mut self) -> bool {
        if self.eat(TokenKind::Semicolon) {
            return true;
        }
        self.error(DiagnosticKind::ExpectedSemicolon);
        self.recover();
        false
    }

    fn parse_type(&mut self) -> Option<ValueType> {
        let ty = match self.current() {
            Some(TokenKind::KwInt) => ValueType::Int,
            Some(TokenKind::KwFloat) => ValueType::Float,
            _ => {
                self.error(DiagnosticKind::ExpectedType);
                return None;
            }
        };
        self.bump();
        Some(ty)
    }

    fn parse_name(&mut self) -> Option<(&'src str, TextRange)> {
        if !self.currently_is(TokenKind::Ident) {
            let found = self.current().map_or("end of input", TokenKind::describe);
            self.error_msg(
                DiagnosticKind::ExpectedName,
                format!("expected a name, found {found}"),
            );
            return None;
        }
        let text = self.current_text();
        let span = self.current_span();
        self.bump();
        Some((text, span))
    }

    /// `int x;` / `float y = 1.5;`
    fn parse_declaration(&mut self) {
        let Some(ty) = self.parse_type() else {
            self.recover();
            return;
        };
        let Some((name, span)) = self.parse_name() else {
            self.recover();
            return;
        };
        let init = if self.eat(TokenKind::Equals) {
            match self.parse_expr() {
                Some(value) => Some(value),
                None => {
                    self.recover();
                    return;
                }
            }
        } else {
            None
        };
        if self.expect_semicolon() {
            self.builder.declare(name, ty, init, span);
        }
    }

    /// `const int N = 10;`
    fn parse_const(&mut self) {
        self.bump();
        let Some(ty) = self.parse_type() else {
            self.recover();
            return;
        };
        let Some((name, span)) = self.parse_name() else {
            self.recover();
            return;
        };
        if !self.expect(TokenKind::Equals) {
            self.recover();
            return;
        }
        let Some(value) = self.parse_expr() else {
            self.recover();
            return;
        };
        if self.expect_semicolon() {
            self.builder.declare_const(name, ty, value, span);
        }
    }

    /// `x = expr;`
    fn parse_assignment(&mut self) {
        let Some((name, span)) = self.parse_name() else {
            self.recover();
            return;
        };
        self.bump();
        let Some(value) = self.parse_expr() else {
            self.recover();
            return;
        };
        if self.expect_semicolon() {
            self.builder.assign(name, value, span);
        }
    }

    fn parse_print(&mut self) {
        self.bump();
        let Some(value) = self.parse_expr() else {
            self.recover();
            return;
        };
        if self.expect_semicolon() {
            self.builder.print(value);
        }
    }

    fn parse_expression_statement(&mut self) {
        let start = self.pos;
        let Some(value) = self.parse_expr() else {
            if self.pos == start && !self.currently_is(TokenKind::BraceClose) {
                self.bump();
            }
            self.recover();
            return;
        };
        if self.expect_semicolon() {
            self.builder.expression_statement(value);
        }
    }

    /// `( expr )` around a condition. Missing parentheses are reported but the
    /// condition is still parsed.
    fn parse_condition(&mut self) -> Option<NodeId> {
        let open = self.current_span();
        let has_paren = self.expect(TokenKind::ParenOpen);
        let cond = self.parse_expr();
        if has_paren && !self.eat(TokenKind::ParenClose) {
            self.error_unclosed_delimiter(DiagnosticKind::UnclosedParen, open);
        }
        cond
    }

    /// `if (cond) stmt [else stmt]`
    fn parse_if(&mut self) {
        self.bump();
        let cond = self.parse_condition();
        let skip = self.builder.begin_if(cond);
        self.parse_statement();
        if self.eat(TokenKind::KwElse) {
            let end = self.builder.begin_else(skip);
            self.parse_statement();
            self.builder.end_if(end);
        } else {
            self.builder.end_if(skip);
        }
    }

    /// `while (cond) stmt`
    fn parse_while(&mut self) {
        self.bump();
        self.builder.begin_while();
        let cond = self.parse_condition();
        self.builder.while_condition(cond);
        self.parse_statement();
        self.builder.end_while();
    }

    /// `do stmt while (cond);`
    fn parse_do(&mut self) {
        self.bump();
        self.builder.begin_do();
        self.parse_statement();
        self.builder.begin_do_condition();
        let cond = if self.expect(TokenKind::KwWhile) {
            self.parse_condition()
        } else {
            None
        };
        self.builder.end_do(cond);
        self.expect_semicolon();
    }

    fn parse_loop_exit(&mut self) {
        let span = self.current_span();
        let is_break = self.currently_is(TokenKind::KwBreak);
        self.bump();
        if !self.expect_semicolon() {
            return;
        }
        if is_break {
            self.builder.break_statement(span);
        } else {
            self.builder.continue_statement(span);
        }
    }

    /// `{ stmt* }` opens a nested scope.
    fn parse_block(&mut self) {
        let open = self.current_span();
        self.bump();
        self.builder.enter_scope();
        while !self.should_stop() && !self.currently_is(TokenKind::BraceClose) {
            self.parse_statement();
        }
        if !self.eat(TokenKind::BraceClose) && !self.has_fatal_error() {
            self.error_unclosed_delimiter(DiagnosticKind::UnclosedBlock, open);
        }
        self.builder.exit_scope();
    }
}
