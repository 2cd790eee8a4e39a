//! Bytecode format for Kestrel programs.
//!
//! This crate contains:
//! - Encoding constants (word width, capacities, the unknown-address sentinel)
//! - Register ids and the [`Instruction`] sum type with its encode/decode pair
//! - [`CodeBuffer`], the append-only stream the code builder writes into
//! - [`Image`], the linked and persistable program
//! - [`dump`], the disassembler

pub mod bytecode;

pub use bytecode::{
    BinaryOp, CODE_SIZE, CodeBuffer, CodeError, DecodeError, ENTRY_SIZE, Header,
    IMAGE_HEADER_SIZE, Image, ImageError, Instruction, MAGIC, Move, NUM_GENERAL, NUM_SPECIAL,
    Opcode, PrintFormat, Reg, STACK_SIZE, Slot, Source, Special, UNKNOWN_ADDR, UnaryOp, VERSION,
    WORD, decode_all, dump, dump_code, format_instruction, format_target, mnemonic, operands,
    written_registers,
};
