//! Binary encoding of Kestrel programs.

mod code;
mod constants;
mod dump;
mod format;
mod image;
mod instructions;
mod reg;

#[cfg(test)]
mod dump_tests;
#[cfg(test)]
mod image_tests;

pub use code::{CodeBuffer, CodeError, decode_all};
pub use constants::{
    CODE_SIZE, ENTRY_SIZE, IMAGE_HEADER_SIZE, MAGIC, NUM_GENERAL, NUM_SPECIAL, STACK_SIZE,
    UNKNOWN_ADDR, VERSION, WORD,
};
pub use dump::{dump, dump_code};
pub use format::{format_instruction, format_target, mnemonic, operands, written_registers};
pub use image::{Header, Image, ImageError};
pub use instructions::{
    BinaryOp, DecodeError, Instruction, Move, Opcode, PrintFormat, Slot, Source, Special,
    UnaryOp,
};
pub use reg::Reg;
