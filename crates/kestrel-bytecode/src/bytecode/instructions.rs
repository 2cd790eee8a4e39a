//! Instruction set and its fixed-width encoding.
//!
//! Every instruction occupies [`ENTRY_SIZE`] bytes:
//!
//! ```text
//! ┌────────┬──────────────┬──────────────┐
//! │ opcode │  operand 1   │  operand 2   │
//! │   u8   │  i32 (LE)    │  i32 (LE)    │
//! └────────┴──────────────┴──────────────┘
//! ```
//!
//! Unused operand slots are zero. Memory operands are positive offsets below
//! the stack base: operand `o` denotes `[ebp - o]`.

use thiserror::Error;

use super::constants::{ENTRY_SIZE, NUM_SPECIAL, WORD};
use super::reg::Reg;

/// Opcode byte values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum Opcode {
    Print = 0x00,
    PrintMem = 0x01,

    Push = 0x20,
    PushAdd = 0x21,
    Pop = 0x22,

    MovRs = 0x25,
    MovRr = 0x26,
    MovRm = 0x27,
    MovMr = 0x28,
    MovMm = 0x29,

    AndRs = 0x30,
    AndRr = 0x31,
    OrRs = 0x32,
    OrRr = 0x33,
    Not = 0x34,

    SubRs = 0x35,
    SubRr = 0x36,
    AddRs = 0x37,
    AddRr = 0x38,
    MulRs = 0x39,
    MulRr = 0x3a,
    DivRs = 0x3b,
    DivRr = 0x3c,
    ModRs = 0x3d,
    ModRr = 0x3e,
    Neg = 0x3f,

    SetLRs = 0x40,
    SetLRr = 0x41,
    SetLeRs = 0x42,
    SetLeRr = 0x43,
    SetGRs = 0x44,
    SetGRr = 0x45,
    SetGeRs = 0x46,
    SetGeRr = 0x47,
    SetERs = 0x48,
    SetERr = 0x49,
    SetNeRs = 0x4a,
    SetNeRr = 0x4b,

    Jz = 0x50,
    Jnz = 0x51,
    Jmp = 0x52,
}

impl Opcode {
    pub fn from_u8(v: u8) -> Option<Self> {
        use Opcode::*;
        Some(match v {
            0x00 => Print,
            0x01 => PrintMem,
            0x20 => Push,
            0x21 => PushAdd,
            0x22 => Pop,
            0x25 => MovRs,
            0x26 => MovRr,
            0x27 => MovRm,
            0x28 => MovMr,
            0x29 => MovMm,
            0x30 => AndRs,
            0x31 => AndRr,
            0x32 => OrRs,
            0x33 => OrRr,
            0x34 => Not,
            0x35 => SubRs,
            0x36 => SubRr,
            0x37 => AddRs,
            0x38 => AddRr,
            0x39 => MulRs,
            0x3a => MulRr,
            0x3b => DivRs,
            0x3c => DivRr,
            0x3d => ModRs,
            0x3e => ModRr,
            0x3f => Neg,
            0x40 => SetLRs,
            0x41 => SetLRr,
            0x42 => SetLeRs,
            0x43 => SetLeRr,
            0x44 => SetGRs,
            0x45 => SetGRr,
            0x46 => SetGeRs,
            0x47 => SetGeRr,
            0x48 => SetERs,
            0x49 => SetERr,
            0x4a => SetNeRs,
            0x4b => SetNeRr,
            0x50 => Jz,
            0x51 => Jnz,
            0x52 => Jmp,
            _ => return None,
        })
    }

    /// Opcodes below [`NUM_SPECIAL`] are built-ins.
    #[inline]
    pub fn is_special(self) -> bool {
        (self as usize) < NUM_SPECIAL
    }
}

/// Output format of a print special, carried in operand 2.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PrintFormat {
    Int,
    Float,
}

impl PrintFormat {
    fn from_operand(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Int),
            1 => Some(Self::Float),
            _ => None,
        }
    }

    fn to_operand(self) -> i32 {
        match self {
            Self::Int => 0,
            Self::Float => 1,
        }
    }
}

/// Built-in operations dispatched on the special opcode range.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Special {
    /// Print the value held in a register.
    Print { reg: Reg, format: PrintFormat },
    /// Print the word at the stack address a register holds.
    PrintMem { reg: Reg, format: PrintFormat },
}

/// Right-hand operand of a binary instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Source {
    Imm(i32),
    Reg(Reg),
}

/// Data movement forms. Offsets address `[ebp - offset]`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Move {
    RegImm { dst: Reg, imm: i32 },
    RegReg { dst: Reg, src: Reg },
    RegMem { dst: Reg, offset: i32 },
    MemReg { offset: i32, src: Reg },
    MemMem { dst: i32, src: i32 },
}

/// Two-operand instructions: `dst = dst op src`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BinaryOp {
    And,
    Or,
    Sub,
    Add,
    Mul,
    Div,
    Mod,
    SetL,
    SetLe,
    SetG,
    SetGe,
    SetE,
    SetNe,
}

impl BinaryOp {
    fn opcode(self, src: Source) -> Opcode {
        use Opcode::*;
        let rr = matches!(src, Source::Reg(_));
        match (self, rr) {
            (Self::And, false) => AndRs,
            (Self::And, true) => AndRr,
            (Self::Or, false) => OrRs,
            (Self::Or, true) => OrRr,
            (Self::Sub, false) => SubRs,
            (Self::Sub, true) => SubRr,
            (Self::Add, false) => AddRs,
            (Self::Add, true) => AddRr,
            (Self::Mul, false) => MulRs,
            (Self::Mul, true) => MulRr,
            (Self::Div, false) => DivRs,
            (Self::Div, true) => DivRr,
            (Self::Mod, false) => ModRs,
            (Self::Mod, true) => ModRr,
            (Self::SetL, false) => SetLRs,
            (Self::SetL, true) => SetLRr,
            (Self::SetLe, false) => SetLeRs,
            (Self::SetLe, true) => SetLeRr,
            (Self::SetG, false) => SetGRs,
            (Self::SetG, true) => SetGRr,
            (Self::SetGe, false) => SetGeRs,
            (Self::SetGe, true) => SetGeRr,
            (Self::SetE, false) => SetERs,
            (Self::SetE, true) => SetERr,
            (Self::SetNe, false) => SetNeRs,
            (Self::SetNe, true) => SetNeRr,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::And => "and",
            Self::Or => "or",
            Self::Sub => "sub",
            Self::Add => "add",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
            Self::SetL => "setl",
            Self::SetLe => "setle",
            Self::SetG => "setg",
            Self::SetGe => "setge",
            Self::SetE => "sete",
            Self::SetNe => "setne",
        }
    }

    /// Comparisons produce 0 or 1.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::SetL | Self::SetLe | Self::SetG | Self::SetGe | Self::SetE | Self::SetNe
        )
    }

    /// Integer semantics shared by the constant folder and the VM.
    ///
    /// Arithmetic wraps. Returns `None` for division or modulo by zero.
    pub fn eval(self, a: i32, b: i32) -> Option<i32> {
        Some(match self {
            Self::And => a & b,
            Self::Or => a | b,
            Self::Sub => a.wrapping_sub(b),
            Self::Add => a.wrapping_add(b),
            Self::Mul => a.wrapping_mul(b),
            Self::Div if b == 0 => return None,
            Self::Mod if b == 0 => return None,
            Self::Div => a.wrapping_div(b),
            Self::Mod => a.wrapping_rem(b),
            Self::SetL => (a < b) as i32,
            Self::SetLe => (a <= b) as i32,
            Self::SetG => (a > b) as i32,
            Self::SetGe => (a >= b) as i32,
            Self::SetE => (a == b) as i32,
            Self::SetNe => (a != b) as i32,
        })
    }
}

/// Single-register instructions: `reg = op reg`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum UnaryOp {
    /// Logical negation: 0 becomes 1, anything else becomes 0.
    Not,
    Neg,
}

impl UnaryOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::Not => "not",
            Self::Neg => "neg",
        }
    }

    pub fn eval(self, a: i32) -> i32 {
        match self {
            Self::Not => (a == 0) as i32,
            Self::Neg => a.wrapping_neg(),
        }
    }

    fn opcode(self) -> Opcode {
        match self {
            Self::Not => Opcode::Not,
            Self::Neg => Opcode::Neg,
        }
    }
}

/// Operand slot within an encoded instruction.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    /// Byte offset of the slot from the instruction start.
    pub fn byte_offset(self) -> usize {
        match self {
            Self::First => 1,
            Self::Second => 1 + WORD,
        }
    }
}

/// Decoded instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Instruction {
    Special(Special),
    Push(Reg),
    /// Push `reg + imm`.
    PushAdd(Reg, i32),
    Pop(Reg),
    Mov(Move),
    Binary { op: BinaryOp, dst: Reg, src: Source },
    Unary { op: UnaryOp, reg: Reg },
    JumpIfZero { cond: Reg, target: i32 },
    JumpIfNonZero { cond: Reg, target: i32 },
    Jump { target: i32 },
}

/// Failure to decode an instruction from raw bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated instruction: {len} bytes, expected {ENTRY_SIZE}")]
    Truncated { len: usize },

    #[error("invalid opcode {opcode:#04x}")]
    InvalidOpcode { opcode: u8 },

    #[error("invalid register {value} in {opcode:?}")]
    InvalidRegister { opcode: Opcode, value: i32 },

    #[error("invalid print format {value}")]
    InvalidFormat { value: i32 },
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Special(Special::Print { .. }) => Opcode::Print,
            Self::Special(Special::PrintMem { .. }) => Opcode::PrintMem,
            Self::Push(_) => Opcode::Push,
            Self::PushAdd(..) => Opcode::PushAdd,
            Self::Pop(_) => Opcode::Pop,
            Self::Mov(m) => match m {
                Move::RegImm { .. } => Opcode::MovRs,
                Move::RegReg { .. } => Opcode::MovRr,
                Move::RegMem { .. } => Opcode::MovRm,
                Move::MemReg { .. } => Opcode::MovMr,
                Move::MemMem { .. } => Opcode::MovMm,
            },
            Self::Binary { op, src, .. } => op.opcode(*src),
            Self::Unary { op, .. } => op.opcode(),
            Self::JumpIfZero { .. } => Opcode::Jz,
            Self::JumpIfNonZero { .. } => Opcode::Jnz,
            Self::Jump { .. } => Opcode::Jmp,
        }
    }

    /// Slot holding the jump target, if this is a jump.
    pub fn target_slot(&self) -> Option<Slot> {
        match self {
            Self::JumpIfZero { .. } | Self::JumpIfNonZero { .. } => Some(Slot::Second),
            Self::Jump { .. } => Some(Slot::First),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<i32> {
        match *self {
            Self::JumpIfZero { target, .. }
            | Self::JumpIfNonZero { target, .. }
            | Self::Jump { target } => Some(target),
            _ => None,
        }
    }

    fn operands(&self) -> (i32, i32) {
        let r = |reg: Reg| reg.to_operand();
        match *self {
            Self::Special(Special::Print { reg, format })
            | Self::Special(Special::PrintMem { reg, format }) => (r(reg), format.to_operand()),
            Self::Push(reg) | Self::Pop(reg) => (r(reg), 0),
            Self::PushAdd(reg, imm) => (r(reg), imm),
            Self::Mov(m) => match m {
                Move::RegImm { dst, imm } => (r(dst), imm),
                Move::RegReg { dst, src } => (r(dst), r(src)),
                Move::RegMem { dst, offset } => (r(dst), offset),
                Move::MemReg { offset, src } => (offset, r(src)),
                Move::MemMem { dst, src } => (dst, src),
            },
            Self::Binary { dst, src, .. } => match src {
                Source::Imm(imm) => (r(dst), imm),
                Source::Reg(src) => (r(dst), r(src)),
            },
            Self::Unary { reg, .. } => (r(reg), 0),
            Self::JumpIfZero { cond, target } | Self::JumpIfNonZero { cond, target } => {
                (r(cond), target)
            }
            Self::Jump { target } => (target, 0),
        }
    }

    pub fn encode(&self) -> [u8; ENTRY_SIZE] {
        let (a, b) = self.operands();
        let mut bytes = [0u8; ENTRY_SIZE];
        bytes[0] = self.opcode() as u8;
        bytes[1..1 + WORD].copy_from_slice(&a.to_le_bytes());
        bytes[1 + WORD..].copy_from_slice(&b.to_le_bytes());
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        if bytes.len() < ENTRY_SIZE {
            return Err(DecodeError::Truncated { len: bytes.len() });
        }
        let opcode =
            Opcode::from_u8(bytes[0]).ok_or(DecodeError::InvalidOpcode { opcode: bytes[0] })?;
        let a = read_operand(bytes, Slot::First);
        let b = read_operand(bytes, Slot::Second);
        let reg = |value: i32| {
            Reg::from_operand(value).ok_or(DecodeError::InvalidRegister { opcode, value })
        };
        let format =
            |value: i32| PrintFormat::from_operand(value).ok_or(DecodeError::InvalidFormat { value });

        use Opcode::*;
        let instr = match opcode {
            Print => Self::Special(Special::Print {
                reg: reg(a)?,
                format: format(b)?,
            }),
            PrintMem => Self::Special(Special::PrintMem {
                reg: reg(a)?,
                format: format(b)?,
            }),
            Push => Self::Push(reg(a)?),
            PushAdd => Self::PushAdd(reg(a)?, b),
            Pop => Self::Pop(reg(a)?),
            MovRs => Self::Mov(Move::RegImm { dst: reg(a)?, imm: b }),
            MovRr => Self::Mov(Move::RegReg {
                dst: reg(a)?,
                src: reg(b)?,
            }),
            MovRm => Self::Mov(Move::RegMem {
                dst: reg(a)?,
                offset: b,
            }),
            MovMr => Self::Mov(Move::MemReg {
                offset: a,
                src: reg(b)?,
            }),
            MovMm => Self::Mov(Move::MemMem { dst: a, src: b }),
            Not => Self::Unary {
                op: UnaryOp::Not,
                reg: reg(a)?,
            },
            Neg => Self::Unary {
                op: UnaryOp::Neg,
                reg: reg(a)?,
            },
            Jz => Self::JumpIfZero {
                cond: reg(a)?,
                target: b,
            },
            Jnz => Self::JumpIfNonZero {
                cond: reg(a)?,
                target: b,
            },
            Jmp => Self::Jump { target: a },
            _ => {
                let (op, is_rr) = binary_form(opcode)
                    .ok_or(DecodeError::InvalidOpcode { opcode: bytes[0] })?;
                let src = if is_rr {
                    Source::Reg(reg(b)?)
                } else {
                    Source::Imm(b)
                };
                Self::Binary {
                    op,
                    dst: reg(a)?,
                    src,
                }
            }
        };
        Ok(instr)
    }
}

/// Read an operand word from an encoded instruction.
pub(crate) fn read_operand(bytes: &[u8], slot: Slot) -> i32 {
    let at = slot.byte_offset();
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn binary_form(opcode: Opcode) -> Option<(BinaryOp, bool)> {
    use Opcode::*;
    let form = match opcode {
        AndRs => (BinaryOp::And, false),
        AndRr => (BinaryOp::And, true),
        OrRs => (BinaryOp::Or, false),
        OrRr => (BinaryOp::Or, true),
        SubRs => (BinaryOp::Sub, false),
        SubRr => (BinaryOp::Sub, true),
        AddRs => (BinaryOp::Add, false),
        AddRr => (BinaryOp::Add, true),
        MulRs => (BinaryOp::Mul, false),
        MulRr => (BinaryOp::Mul, true),
        DivRs => (BinaryOp::Div, false),
        DivRr => (BinaryOp::Div, true),
        ModRs => (BinaryOp::Mod, false),
        ModRr => (BinaryOp::Mod, true),
        SetLRs => (BinaryOp::SetL, false),
        SetLRr => (BinaryOp::SetL, true),
        SetLeRs => (BinaryOp::SetLe, false),
        SetLeRr => (BinaryOp::SetLe, true),
        SetGRs => (BinaryOp::SetG, false),
        SetGRr => (BinaryOp::SetG, true),
        SetGeRs => (BinaryOp::SetGe, false),
        SetGeRr => (BinaryOp::SetGe, true),
        SetERs => (BinaryOp::SetE, false),
        SetERr => (BinaryOp::SetE, true),
        SetNeRs => (BinaryOp::SetNe, false),
        SetNeRr => (BinaryOp::SetNe, true),
        Print | PrintMem | Push | PushAdd | Pop | MovRs | MovRr | MovRm | MovMr | MovMm
        | Not | Neg | Jz | Jnz | Jmp => return None,
    };
    Some(form)
}
