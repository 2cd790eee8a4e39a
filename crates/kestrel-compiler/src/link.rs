//! Second pass: patch forward references and freeze the program into an [`Image`].

use kestrel_bytecode::{
    CODE_SIZE, CodeBuffer, DecodeError, ENTRY_SIZE, Image, ImageError, Slot, UNKNOWN_ADDR,
    decode_all,
};
use thiserror::Error;

use crate::compile::{FixupTarget, Program};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("unresolved reference: jump at {site:#06x} has no target")]
    UnresolvedReference { site: u32 },

    #[error("jump at {site:#06x} targets {target:#06x}, which is not an instruction boundary")]
    MisalignedTarget { site: u32, target: i32 },

    #[error("jump at {site:#06x} targets {target:#06x}, outside the code (end {end:#06x})")]
    TargetOutOfRange { site: u32, target: i32, end: u32 },

    #[error("code size exceeded: {len} bytes, limit {CODE_SIZE}")]
    CodeSizeExceeded { len: usize },

    #[error("entry address {entry:#06x} is not an instruction in the code")]
    InvalidEntry { entry: u32 },

    #[error("fixup at {site:#06x} does not point at an instruction")]
    InvalidFixup { site: u32 },

    #[error("malformed instruction at {site:#06x}: {source}")]
    Malformed { site: u32, source: DecodeError },
}

/// Overwrite the operand at `site` with its final value.
pub fn resolve(code: &mut CodeBuffer, site: u32, slot: Slot, value: i32) -> Result<(), LinkError> {
    code.patch(site, slot, value)
        .map_err(|_| LinkError::InvalidFixup { site })
}

/// Resolve every fixup, verify all jumps, and fix the entry address.
pub fn link(program: Program) -> Result<Image, LinkError> {
    let Program {
        mut code,
        labels,
        fixups,
        frame_size,
        entry,
        ..
    } = program;

    if code.len() > CODE_SIZE {
        return Err(LinkError::CodeSizeExceeded { len: code.len() });
    }

    for fixup in &fixups {
        let value = match fixup.target {
            FixupTarget::FrameSize => frame_size as i32,
            FixupTarget::Label(label) => match labels.get(label.0 as usize).copied().flatten() {
                Some(addr) => addr as i32,
                // Left as UNKNOWN; reported by the verification below.
                None => continue,
            },
        };
        resolve(&mut code, fixup.site, fixup.slot, value)?;
    }

    verify(code.as_bytes())?;
    Image::new(code.into_bytes(), entry).map_err(|e| match e {
        ImageError::CodeTooLarge(len) => LinkError::CodeSizeExceeded { len },
        _ => LinkError::InvalidEntry { entry },
    })
}

/// Every jump must land on an instruction start within `0..=end`.
pub fn verify(code: &[u8]) -> Result<(), LinkError> {
    let end = code.len() as u32;
    for (site, decoded) in decode_all(code) {
        let instr = decoded.map_err(|source| LinkError::Malformed { site, source })?;
        let Some(target) = instr.target() else {
            continue;
        };
        if target == UNKNOWN_ADDR {
            return Err(LinkError::UnresolvedReference { site });
        }
        if target < 0 || target as u32 > end {
            return Err(LinkError::TargetOutOfRange { site, target, end });
        }
        if target as usize % ENTRY_SIZE != 0 {
            return Err(LinkError::MisalignedTarget { site, target });
        }
    }
    Ok(())
}
