//! Tracing infrastructure for debugging VM execution.
//!
//! The VM is generic over [`Tracer`]. With [`NoopTracer`] every hook is an
//! empty `#[inline(always)]` function and disappears from the compiled loop;
//! [`PrintTracer`] collects one formatted line per event.

use kestrel_bytecode::{Instruction, Reg, mnemonic, operands};
use kestrel_core::Colors;

use super::error::RuntimeError;
use super::registers::Registers;
use super::value::Value;

/// Verbosity level for trace output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// Default: instructions, printed values, halt.
    #[default]
    Default,
    /// Verbose (-v): plus writes to general registers.
    Verbose,
    /// Very verbose (-vv): plus stack pointer writes and memory stores.
    VeryVerbose,
}

/// Hooks called by the VM as it executes.
///
/// - `trace_instruction` - before executing an instruction
/// - `trace_write` - after an instruction wrote a register
/// - `trace_store` - after a word was stored to a variable slot
/// - `trace_print` - when the print special produces a value
/// - `trace_halt` - when execution reaches the end of the code
/// - `trace_fault` - when a runtime error stops execution
pub trait Tracer {
    fn trace_instruction(&mut self, addr: u32, instr: &Instruction);

    fn trace_write(&mut self, reg: Reg, value: i32);

    fn trace_store(&mut self, target: i32, value: i32);

    fn trace_print(&mut self, value: Value);

    fn trace_halt(&mut self, registers: &Registers, steps: u32);

    fn trace_fault(&mut self, error: &RuntimeError);
}

/// No-op tracer that gets optimized away completely.
pub struct NoopTracer;

impl Tracer for NoopTracer {
    #[inline(always)]
    fn trace_instruction(&mut self, _addr: u32, _instr: &Instruction) {}

    #[inline(always)]
    fn trace_write(&mut self, _reg: Reg, _value: i32) {}

    #[inline(always)]
    fn trace_store(&mut self, _target: i32, _value: i32) {}

    #[inline(always)]
    fn trace_print(&mut self, _value: Value) {}

    #[inline(always)]
    fn trace_halt(&mut self, _registers: &Registers, _steps: u32) {}

    #[inline(always)]
    fn trace_fault(&mut self, _error: &RuntimeError) {}
}

/// Indentation of sub-lines, past the address column.
const SUBLINE_INDENT: usize = 6;

/// Tracer that collects execution trace for debugging.
pub struct PrintTracer {
    verbosity: Verbosity,
    lines: Vec<String>,
    colors: Colors,
}

impl PrintTracer {
    pub fn new(verbosity: Verbosity, colors: Colors) -> Self {
        Self {
            verbosity,
            lines: Vec::new(),
            colors,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined, newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Print all trace lines.
    pub fn print(&self) {
        for line in &self.lines {
            println!("{}", line);
        }
    }

    fn add_subline(&mut self, content: String) {
        self.lines
            .push(format!("{:SUBLINE_INDENT$}{content}", ""));
    }
}

impl Tracer for PrintTracer {
    fn trace_instruction(&mut self, addr: u32, instr: &Instruction) {
        let c = self.colors;
        self.lines.push(format!(
            "{}{addr:04x}{}  {}{:<8}{} {}",
            c.dim,
            c.reset,
            c.blue,
            mnemonic(instr),
            c.reset,
            operands(instr)
        ));
    }

    fn trace_write(&mut self, reg: Reg, value: i32) {
        let shown = match self.verbosity {
            Verbosity::Default => false,
            Verbosity::Verbose => !reg.is_reserved(),
            Verbosity::VeryVerbose => true,
        };
        if shown {
            let c = self.colors;
            self.add_subline(format!("{}{reg} = {value}{}", c.dim, c.reset));
        }
    }

    fn trace_store(&mut self, target: i32, value: i32) {
        if self.verbosity == Verbosity::VeryVerbose {
            let c = self.colors;
            self.add_subline(format!("{}[{target}] = {value}{}", c.dim, c.reset));
        }
    }

    fn trace_print(&mut self, value: Value) {
        let c = self.colors;
        self.add_subline(format!("{}> {value}{}", c.green, c.reset));
    }

    fn trace_halt(&mut self, registers: &Registers, steps: u32) {
        let c = self.colors;
        self.lines.push(format!(
            "{}halt{}  {steps} steps, esp {}",
            c.blue, c.reset, registers.esp
        ));
    }

    fn trace_fault(&mut self, error: &RuntimeError) {
        let c = self.colors;
        self.lines
            .push(format!("{}fault{}  {error}", c.red, c.reset));
    }
}
