//! Parser state and token-level operations.

use rowan::{TextRange, TextSize};

use super::lexer::{Token, TokenKind, token_text};
use crate::Error;
use crate::compile::CodeBuilder;
use crate::diagnostics::DiagnosticKind;

/// Single-pass parser. Statements drive the [`CodeBuilder`] as they are
/// recognized; there is no tree.
pub struct Parser<'src> {
    pub(super) source: &'src str,
    /// Non-trivia tokens only.
    pub(super) tokens: Vec<Token>,
    pub(super) pos: usize,
    pub(super) builder: CodeBuilder,
    pub(super) depth: u32,
    pub(super) last_diagnostic_pos: Option<TextSize>,
    /// End of the last consumed token.
    pub(super) prev_end: TextSize,
    recursion_fuel_limit: Option<u32>,
    fatal_error: Option<Error>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, tokens: Vec<Token>, builder: CodeBuilder) -> Self {
        Self {
            source,
            tokens: tokens.into_iter().filter(|t| !t.kind.is_trivia()).collect(),
            pos: 0,
            builder,
            depth: 0,
            last_diagnostic_pos: None,
            prev_end: TextSize::from(0),
            recursion_fuel_limit: None,
            fatal_error: None,
        }
    }

    pub fn with_recursion_fuel(mut self, limit: Option<u32>) -> Self {
        self.recursion_fuel_limit = limit;
        self
    }

    /// Parse the whole source and hand the builder back.
    pub fn parse(mut self) -> Result<CodeBuilder, Error> {
        self.parse_program();
        if let Some(err) = self.fatal_error {
            return Err(err);
        }
        Ok(self.builder)
    }

    pub(super) fn has_fatal_error(&self) -> bool {
        self.fatal_error.is_some()
    }

    pub(super) fn current(&self) -> Option<TokenKind> {
        self.nth(0)
    }

    pub(super) fn nth(&self, lookahead: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + lookahead).map(|t| t.kind)
    }

    pub(super) fn current_span(&self) -> TextRange {
        self.tokens
            .get(self.pos)
            .map_or_else(|| TextRange::empty(self.eof_offset()), |t| t.span)
    }

    pub(super) fn current_text(&self) -> &'src str {
        self.tokens
            .get(self.pos)
            .map_or("", |t| token_text(self.source, t))
    }

    pub(super) fn eof_offset(&self) -> TextSize {
        TextSize::from(self.source.len() as u32)
    }

    pub(super) fn eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(super) fn should_stop(&self) -> bool {
        self.eof() || self.has_fatal_error()
    }

    pub(super) fn currently_is(&self, kind: TokenKind) -> bool {
        self.current() == Some(kind)
    }

    pub(super) fn bump(&mut self) {
        if let Some(token) = self.tokens.get(self.pos) {
            self.prev_end = token.span.end();
            self.pos += 1;
        }
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.currently_is(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// On mismatch: emit diagnostic but don't consume.
    pub(super) fn expect(&mut self, kind: TokenKind) -> bool {
        if self.eat(kind) {
            return true;
        }
        let found = self.current().map_or("end of input", TokenKind::describe);
        self.error_msg(
            DiagnosticKind::UnexpectedToken,
            format!("expected {}, found {found}", kind.describe()),
        );
        false
    }

    /// Span from `start` to the end of the last consumed token.
    pub(super) fn span_from(&self, start: TextSize) -> TextRange {
        TextRange::new(start, self.prev_end.max(start))
    }

    fn should_report(&mut self, pos: TextSize) -> bool {
        if self.last_diagnostic_pos == Some(pos) {
            return false;
        }
        self.last_diagnostic_pos = Some(pos);
        true
    }

    pub(super) fn error(&mut self, kind: DiagnosticKind) {
        let range = self.current_span();
        if !self.should_report(range.start()) {
            return;
        }
        self.builder.diagnostics_mut().report(kind, range).emit();
    }

    pub(super) fn error_msg(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let range = self.current_span();
        if !self.should_report(range.start()) {
            return;
        }
        self.builder
            .diagnostics_mut()
            .report(kind, range)
            .message(message)
            .emit();
    }

    pub(super) fn error_and_bump(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        self.error_msg(kind, message);
        self.bump();
    }

    pub(super) fn error_unclosed_delimiter(&mut self, kind: DiagnosticKind, open_range: TextRange) {
        let current = self.current_span();
        if !self.should_report(current.start()) {
            return;
        }
        self.builder
            .diagnostics_mut()
            .report(kind, current)
            .related_to("opened here", open_range)
            .emit();
    }

    /// Skip to the end of the broken statement: past the next `;`, or up to
    /// a `}` the enclosing block will consume.
    pub(super) fn recover(&mut self) {
        while !self.should_stop() {
            match self.current() {
                Some(TokenKind::Semicolon) => {
                    self.bump();
                    return;
                }
                Some(TokenKind::BraceClose) => return,
                _ => self.bump(),
            }
        }
    }

    pub(super) fn enter_recursion(&mut self) -> bool {
        if let Some(limit) = self.recursion_fuel_limit
            && self.depth >= limit
        {
            if self.fatal_error.is_none() {
                self.fatal_error = Some(Error::RecursionLimitExceeded);
            }
            return false;
        }
        self.depth += 1;
        true
    }

    pub(super) fn exit_recursion(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}
