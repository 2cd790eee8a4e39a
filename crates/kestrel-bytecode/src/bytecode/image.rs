//! Linked program image and its on-disk form.
//!
//! Layout: a 32-byte [`Header`] followed by the code stream.

use std::io;
use std::path::Path;

use super::constants::{CODE_SIZE, ENTRY_SIZE, IMAGE_HEADER_SIZE, MAGIC, UNKNOWN_ADDR, VERSION};
use super::instructions::{DecodeError, Instruction};

/// Image file header.
///
/// - 0-3: magic
/// - 4-7: version
/// - 8-11: CRC32 of the code bytes
/// - 12-15: entry address
/// - 16-19: code length
/// - 20-31: reserved
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u32,
    pub checksum: u32,
    pub entry: u32,
    pub code_len: u32,
    pub _reserved: [u8; 12],
}

impl Default for Header {
    fn default() -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            checksum: 0,
            entry: 0,
            code_len: 0,
            _reserved: [0; 12],
        }
    }
}

impl Header {
    /// Decode from the first [`IMAGE_HEADER_SIZE`] bytes. The caller checks the length.
    fn from_bytes(bytes: &[u8]) -> Self {
        let word = |at: usize| {
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };
        let mut reserved = [0u8; 12];
        reserved.copy_from_slice(&bytes[20..32]);
        Self {
            magic: [bytes[0], bytes[1], bytes[2], bytes[3]],
            version: word(4),
            checksum: word(8),
            entry: word(12),
            code_len: word(16),
            _reserved: reserved,
        }
    }

    pub fn to_bytes(&self) -> [u8; IMAGE_HEADER_SIZE] {
        let mut bytes = [0u8; IMAGE_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.checksum.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.entry.to_le_bytes());
        bytes[16..20].copy_from_slice(&self.code_len.to_le_bytes());
        bytes[20..32].copy_from_slice(&self._reserved);
        bytes
    }
}

/// Image load error.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("invalid magic: expected KSTL")]
    InvalidMagic,
    #[error("unsupported version: {0} (expected {VERSION})")]
    UnsupportedVersion(u32),
    #[error("file too small: {0} bytes (minimum {IMAGE_HEADER_SIZE})")]
    FileTooSmall(usize),
    #[error("size mismatch: header says {header} code bytes, got {actual}")]
    SizeMismatch { header: u32, actual: usize },
    #[error("code size exceeded: {0} bytes, limit {CODE_SIZE}")]
    CodeTooLarge(usize),
    #[error("code length {0} is not a whole number of instructions")]
    PartialInstruction(u32),
    #[error("checksum mismatch: header says {expected:#010x}, code hashes to {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },
    #[error("entry address {entry} is outside the code")]
    InvalidEntry { entry: u32 },
    #[error("unresolved jump target at {addr:#06x}")]
    Unresolved { addr: u32 },
    #[error("malformed instruction at {addr:#06x}: {source}")]
    Malformed { addr: u32, source: DecodeError },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// A linked program: code whose jump targets are all resolved, plus its entry address.
///
/// Execution ends when the instruction pointer reaches [`Image::end`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    header: Header,
    code: Vec<u8>,
}

impl Image {
    /// Wrap linked code.
    ///
    /// Only the layout is checked here: size, whole instructions, and an
    /// entry on an instruction boundary within the code.
    pub fn new(code: Vec<u8>, entry: u32) -> Result<Self, ImageError> {
        check_layout(code.len(), entry)?;
        let header = Header {
            checksum: crc32fast::hash(&code),
            entry,
            code_len: code.len() as u32,
            ..Header::default()
        };
        Ok(Self { header, code })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ImageError> {
        if bytes.len() < IMAGE_HEADER_SIZE {
            return Err(ImageError::FileTooSmall(bytes.len()));
        }

        let header = Header::from_bytes(&bytes[..IMAGE_HEADER_SIZE]);
        if header.magic != MAGIC {
            return Err(ImageError::InvalidMagic);
        }
        if header.version != VERSION {
            return Err(ImageError::UnsupportedVersion(header.version));
        }

        let code = &bytes[IMAGE_HEADER_SIZE..];
        if header.code_len as usize != code.len() {
            return Err(ImageError::SizeMismatch {
                header: header.code_len,
                actual: code.len(),
            });
        }
        if code.len() > CODE_SIZE {
            return Err(ImageError::CodeTooLarge(code.len()));
        }

        let actual = crc32fast::hash(code);
        if actual != header.checksum {
            return Err(ImageError::ChecksumMismatch {
                expected: header.checksum,
                actual,
            });
        }
        check_layout(code.len(), header.entry)?;

        let image = Self {
            header,
            code: code.to_vec(),
        };
        image.validate()?;
        Ok(image)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(IMAGE_HEADER_SIZE + self.code.len());
        out.extend_from_slice(&self.header.to_bytes());
        out.extend_from_slice(&self.code);
        out
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        std::fs::write(path, self.to_bytes())?;
        Ok(())
    }

    /// Every instruction decodes and no jump still carries the unknown sentinel.
    fn validate(&self) -> Result<(), ImageError> {
        for (addr, decoded) in super::code::decode_all(&self.code) {
            let instr = decoded.map_err(|source| ImageError::Malformed { addr, source })?;
            if instr.target() == Some(UNKNOWN_ADDR) {
                return Err(ImageError::Unresolved { addr });
            }
        }
        Ok(())
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn entry(&self) -> u32 {
        self.header.entry
    }

    /// Address one past the last instruction.
    pub fn end(&self) -> u32 {
        self.code.len() as u32
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    /// Decode the instruction starting at `addr`.
    pub fn decode_at(&self, addr: u32) -> Result<Instruction, DecodeError> {
        let start = addr as usize;
        let end = (start + ENTRY_SIZE).min(self.code.len());
        Instruction::decode(self.code.get(start..end).unwrap_or(&[]))
    }
}

fn check_layout(len: usize, entry: u32) -> Result<(), ImageError> {
    if len > CODE_SIZE {
        return Err(ImageError::CodeTooLarge(len));
    }
    if len % ENTRY_SIZE != 0 {
        return Err(ImageError::PartialInstruction(len as u32));
    }
    if entry as usize > len || entry as usize % ENTRY_SIZE != 0 {
        return Err(ImageError::InvalidEntry { entry });
    }
    Ok(())
}
