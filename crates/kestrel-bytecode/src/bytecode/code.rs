//! Append-only instruction stream.

use thiserror::Error;

use super::constants::{CODE_SIZE, ENTRY_SIZE, WORD};
use super::instructions::{DecodeError, Instruction, Slot};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodeError {
    #[error("code size exceeded: program needs more than {capacity} bytes")]
    Overflow { capacity: usize },

    #[error("offset {offset} is not the start of an instruction")]
    Misaligned { offset: u32 },

    #[error("offset {offset} is past the end of the code ({len} bytes)")]
    OutOfRange { offset: u32, len: usize },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Byte buffer of encoded instructions with a fixed capacity.
///
/// Emission only appends. The one exception is [`CodeBuffer::patch`], which
/// overwrites a single operand word in place once its value is known.
#[derive(Clone, Debug)]
pub struct CodeBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl Default for CodeBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::with_limit(CODE_SIZE)
    }

    /// Buffer holding at most `capacity` bytes.
    pub fn with_limit(capacity: usize) -> Self {
        Self {
            bytes: Vec::new(),
            capacity,
        }
    }

    /// Append an instruction, returning its byte offset.
    pub fn push(&mut self, instr: Instruction) -> Result<u32, CodeError> {
        if self.bytes.len() + ENTRY_SIZE > self.capacity {
            return Err(CodeError::Overflow {
                capacity: self.capacity,
            });
        }
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(&instr.encode());
        Ok(offset)
    }

    /// Overwrite one operand of the instruction at `offset`.
    pub fn patch(&mut self, offset: u32, slot: Slot, value: i32) -> Result<(), CodeError> {
        let start = self.checked_start(offset)?;
        let at = start + slot.byte_offset();
        self.bytes[at..at + WORD].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Decode the instruction at `offset`.
    pub fn get(&self, offset: u32) -> Result<Instruction, CodeError> {
        let start = self.checked_start(offset)?;
        Ok(Instruction::decode(&self.bytes[start..start + ENTRY_SIZE])?)
    }

    fn checked_start(&self, offset: u32) -> Result<usize, CodeError> {
        let start = offset as usize;
        if start % ENTRY_SIZE != 0 {
            return Err(CodeError::Misaligned { offset });
        }
        if start + ENTRY_SIZE > self.bytes.len() {
            return Err(CodeError::OutOfRange {
                offset,
                len: self.bytes.len(),
            });
        }
        Ok(start)
    }

    /// Byte offset the next instruction will be written at.
    pub fn next_offset(&self) -> u32 {
        self.bytes.len() as u32
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decoded instructions with their offsets.
    pub fn iter(&self) -> impl Iterator<Item = (u32, Result<Instruction, DecodeError>)> + '_ {
        decode_all(&self.bytes)
    }
}

/// Walk a code stream instruction by instruction.
///
/// A trailing partial entry yields a `Truncated` error.
pub fn decode_all(code: &[u8]) -> impl Iterator<Item = (u32, Result<Instruction, DecodeError>)> + '_ {
    code.chunks(ENTRY_SIZE)
        .enumerate()
        .map(|(i, chunk)| ((i * ENTRY_SIZE) as u32, Instruction::decode(chunk)))
}
