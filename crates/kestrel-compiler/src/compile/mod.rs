//! Code generation: node arena, scopes, constant folding, registers and
//! the builder the parser drives.

mod builder;
mod fold;
mod nodes;
mod program;
mod regs;
mod scope;
mod types;

#[cfg(test)]
mod builder_tests;
#[cfg(test)]
mod nodes_tests;

pub use builder::CodeBuilder;
pub use fold::{FoldError, binary_type, eval_binary, eval_unary, fold_binary, fold_unary, unary_type};
pub use nodes::{ExprNode, NodeArena, NodeId, Operand, StaleNode};
pub use program::{Fixup, FixupTarget, Label, Program, SymbolInfo, dump_symbols};
pub use regs::RegisterPool;
pub use scope::{ScopeError, ScopeStack, SymbolDesc, SymbolKind};
pub use types::{BinOp, Constant, OpClass, UnOp, ValueType};
