//! Text rendering of instructions, shared by the dump and the execution trace.

use super::constants::UNKNOWN_ADDR;
use super::instructions::{Instruction, Move, PrintFormat, Source, Special};
use super::reg::Reg;

/// Column width of the mnemonic.
const MNEMONIC_WIDTH: usize = 8;

/// Render a jump target as a 4-digit hex address, or `????` while unresolved.
pub fn format_target(target: i32) -> String {
    if target == UNKNOWN_ADDR {
        "????".to_string()
    } else {
        format!("{target:04x}")
    }
}

fn mem(offset: i32) -> String {
    if offset < 0 {
        format!("[ebp+{}]", offset.unsigned_abs())
    } else {
        format!("[ebp-{offset}]")
    }
}

fn source(src: Source) -> String {
    match src {
        Source::Imm(v) => v.to_string(),
        Source::Reg(r) => r.to_string(),
    }
}

pub fn mnemonic(instr: &Instruction) -> &'static str {
    match instr {
        Instruction::Special(Special::Print { format, .. })
        | Instruction::Special(Special::PrintMem { format, .. }) => match format {
            PrintFormat::Int => "print",
            PrintFormat::Float => "printf",
        },
        Instruction::Push(_) => "push",
        Instruction::PushAdd(..) => "pushadd",
        Instruction::Pop(_) => "pop",
        Instruction::Mov(_) => "mov",
        Instruction::Binary { op, .. } => op.mnemonic(),
        Instruction::Unary { op, .. } => op.mnemonic(),
        Instruction::JumpIfZero { .. } => "jz",
        Instruction::JumpIfNonZero { .. } => "jnz",
        Instruction::Jump { .. } => "jmp",
    }
}

pub fn operands(instr: &Instruction) -> String {
    let pair = |a: String, b: String| format!("{a}, {b}");
    match *instr {
        Instruction::Special(Special::Print { reg, .. }) => reg.to_string(),
        Instruction::Special(Special::PrintMem { reg, .. }) => format!("[{reg}]"),
        Instruction::Push(reg) | Instruction::Pop(reg) => reg.to_string(),
        Instruction::PushAdd(reg, imm) => pair(reg.to_string(), imm.to_string()),
        Instruction::Mov(m) => match m {
            Move::RegImm { dst, imm } => pair(dst.to_string(), imm.to_string()),
            Move::RegReg { dst, src } => pair(dst.to_string(), src.to_string()),
            Move::RegMem { dst, offset } => pair(dst.to_string(), mem(offset)),
            Move::MemReg { offset, src } => pair(mem(offset), src.to_string()),
            Move::MemMem { dst, src } => pair(mem(dst), mem(src)),
        },
        Instruction::Binary { dst, src, .. } => pair(dst.to_string(), source(src)),
        Instruction::Unary { reg, .. } => reg.to_string(),
        Instruction::JumpIfZero { cond, target } | Instruction::JumpIfNonZero { cond, target } => {
            pair(cond.to_string(), format_target(target))
        }
        Instruction::Jump { target } => format_target(target),
    }
}

/// `mnemonic operands`, with the mnemonic padded to a fixed column.
pub fn format_instruction(instr: &Instruction) -> String {
    format!("{:<MNEMONIC_WIDTH$} {}", mnemonic(instr), operands(instr))
}

/// Registers an instruction writes, for trace deltas.
pub fn written_registers(instr: &Instruction) -> Vec<Reg> {
    match *instr {
        Instruction::Push(_) | Instruction::PushAdd(..) => vec![Reg::Esp],
        Instruction::Pop(reg) => vec![reg, Reg::Esp],
        Instruction::Mov(Move::RegImm { dst, .. })
        | Instruction::Mov(Move::RegReg { dst, .. })
        | Instruction::Mov(Move::RegMem { dst, .. })
        | Instruction::Binary { dst, .. } => vec![dst],
        Instruction::Unary { reg, .. } => vec![reg],
        _ => Vec::new(),
    }
}
