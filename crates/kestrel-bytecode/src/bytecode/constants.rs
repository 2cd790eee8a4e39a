//! Bytecode format constants.

/// Magic bytes identifying a Kestrel image file.
pub const MAGIC: [u8; 4] = *b"KSTL";

/// Current image format version.
pub const VERSION: u32 = 1;

/// Machine word width in bytes. Operands are little-endian `i32`.
pub const WORD: usize = 4;

/// Size of every instruction: opcode byte + two operand words.
pub const ENTRY_SIZE: usize = 1 + 2 * WORD;

/// Maximum size of the code stream in bytes.
pub const CODE_SIZE: usize = 65536;

/// Default size of the VM stack region in bytes.
pub const STACK_SIZE: usize = 131072;

/// Operand value of a jump whose target is not known yet.
pub const UNKNOWN_ADDR: i32 = i32::MAX;

/// Number of special (built-in) opcodes, occupying opcode values `0..NUM_SPECIAL`.
pub const NUM_SPECIAL: usize = 2;

/// Number of general-purpose registers.
pub const NUM_GENERAL: usize = 6;

/// Size of the image file header.
pub const IMAGE_HEADER_SIZE: usize = 32;
