//! Lexical scopes and stack slot allocation.
//!
//! Scopes nest; lookup walks innermost to outermost. Every variable gets a
//! one-word slot `[ebp - offset]` from a cursor that only moves forward
//! within a frame, so slots of closed scopes are never handed out again and
//! code already emitted against them stays valid.

use indexmap::IndexMap;
use kestrel_bytecode::WORD;
use kestrel_core::Symbol;
use rowan::TextRange;
use thiserror::Error;

use super::types::{Constant, ValueType};

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum SymbolKind {
    Variable,
    /// Named compile-time value; occupies no slot.
    Constant(Constant),
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct SymbolDesc {
    pub name: Symbol,
    pub kind: SymbolKind,
    pub ty: ValueType,
    /// Slot offset below the frame base. Zero for constants.
    pub offset: i32,
    /// Assigned at least once on some path compiled so far.
    pub initialized: bool,
    pub span: TextRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ScopeError {
    #[error("name already declared in this scope")]
    Duplicate { previous: TextRange },
    #[error("name is not declared")]
    Unknown,
}

#[derive(Debug, Default)]
struct Scope {
    symbols: IndexMap<Symbol, SymbolDesc>,
}

#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
    cursor: u32,
    high_water: u32,
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeStack {
    /// A stack holding the global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            cursor: 0,
            high_water: 0,
        }
    }

    pub fn enter(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn exit(&mut self) -> bool {
        if self.scopes.len() == 1 {
            return false;
        }
        self.scopes.pop();
        true
    }

    /// Start a new stack frame: slot allocation restarts at the first word.
    pub fn enter_frame(&mut self) {
        self.cursor = 0;
        self.high_water = 0;
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Bytes of slots allocated in the current frame.
    pub fn frame_size(&self) -> u32 {
        self.high_water
    }

    pub fn declare(
        &mut self,
        name: Symbol,
        ty: ValueType,
        kind: SymbolKind,
        span: TextRange,
    ) -> Result<SymbolDesc, ScopeError> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or(ScopeError::Unknown)?;
        if let Some(previous) = scope.symbols.get(&name) {
            return Err(ScopeError::Duplicate {
                previous: previous.span,
            });
        }

        let offset = match kind {
            SymbolKind::Variable => {
                self.cursor += WORD as u32;
                self.high_water = self.high_water.max(self.cursor);
                self.cursor as i32
            }
            SymbolKind::Constant(_) => 0,
        };
        let desc = SymbolDesc {
            name,
            kind,
            ty,
            offset,
            initialized: matches!(kind, SymbolKind::Constant(_)),
            span,
        };
        scope.symbols.insert(name, desc);
        Ok(desc)
    }

    pub fn lookup(&self, name: Symbol) -> Result<&SymbolDesc, ScopeError> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.symbols.get(&name))
            .ok_or(ScopeError::Unknown)
    }

    pub fn mark_initialized(&mut self, name: Symbol) {
        if let Some(desc) = self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|s| s.symbols.get_mut(&name))
        {
            desc.initialized = true;
        }
    }

    /// Symbols of the global scope in declaration order.
    pub fn globals(&self) -> impl Iterator<Item = &SymbolDesc> {
        self.scopes
            .first()
            .into_iter()
            .flat_map(|s| s.symbols.values())
    }
}
