//! Unlinked compiler output.

use std::fmt::Write as _;

use kestrel_bytecode::{CodeBuffer, Slot, dump_code};
use kestrel_core::Colors;

use super::types::{Constant, ValueType};

/// A position in the code, bound once the builder reaches it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Label(pub(crate) u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FixupTarget {
    /// Address a label is bound to.
    Label(Label),
    /// Bytes of stack slots the frame needs.
    FrameSize,
}

/// An operand to patch at link time.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Fixup {
    pub site: u32,
    pub slot: Slot,
    pub target: FixupTarget,
}

/// A top-level name, as seen after compilation.
#[derive(Clone, PartialEq, Debug)]
pub struct SymbolInfo {
    pub name: String,
    pub ty: ValueType,
    /// Slot offset below the frame base; zero for constants.
    pub offset: i32,
    pub constant: Option<Constant>,
}

#[derive(Debug)]
pub struct Program {
    pub code: CodeBuffer,
    pub labels: Vec<Option<u32>>,
    pub fixups: Vec<Fixup>,
    pub frame_size: u32,
    pub entry: u32,
    pub globals: Vec<SymbolInfo>,
}

impl Program {
    pub fn label_address(&self, label: Label) -> Option<u32> {
        self.labels.get(label.0 as usize).copied().flatten()
    }

    pub fn global(&self, name: &str) -> Option<&SymbolInfo> {
        self.globals.iter().find(|s| s.name == name)
    }

    /// Listing of the unlinked code followed by the global symbols.
    pub fn dump(&self, colors: Colors) -> String {
        let mut out = dump_code(self.code.as_bytes(), colors);
        out.push('\n');
        out.push_str(&dump_symbols(&self.globals, colors));
        out
    }
}

/// `[symbols]` section: one line per global.
pub fn dump_symbols(globals: &[SymbolInfo], colors: Colors) -> String {
    let c = &colors;
    let mut out = String::new();
    writeln!(out, "{}[symbols]{}", c.blue, c.reset).unwrap();
    let width = globals.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for sym in globals {
        let location = match sym.constant {
            Some(value) => format!("const {value}"),
            None => format!("[ebp-{}]", sym.offset),
        };
        writeln!(
            out,
            "{:<width$}  {:<5}  {}{location}{}",
            sym.name, sym.ty, c.green, c.reset
        )
        .unwrap();
    }
    out
}
