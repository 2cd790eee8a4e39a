//! Register identifiers and their operand encoding.

use std::fmt;

/// A register operand.
///
/// `Ebp` and `Esp` are the reserved stack base and stack top; the remaining
/// variants are general purpose. The instruction pointer is not addressable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Reg {
    Ebp,
    Esp,
    Eax,
    Ebx,
    Ecx,
    Edx,
    Esi,
    Edi,
}

impl Reg {
    /// General-purpose registers in allocation order.
    pub const GENERAL: [Reg; super::NUM_GENERAL] = [
        Reg::Eax,
        Reg::Ebx,
        Reg::Ecx,
        Reg::Edx,
        Reg::Esi,
        Reg::Edi,
    ];

    /// Decode an operand word. Returns `None` for the instruction pointer
    /// slot (6 in the reference numbering) and anything out of range.
    pub fn from_operand(v: i32) -> Option<Self> {
        match v {
            0 => Some(Self::Ebp),
            1 => Some(Self::Esp),
            2 => Some(Self::Eax),
            3 => Some(Self::Ebx),
            4 => Some(Self::Ecx),
            5 => Some(Self::Edx),
            7 => Some(Self::Esi),
            8 => Some(Self::Edi),
            _ => None,
        }
    }

    pub fn to_operand(self) -> i32 {
        match self {
            Self::Ebp => 0,
            Self::Esp => 1,
            Self::Eax => 2,
            Self::Ebx => 3,
            Self::Ecx => 4,
            Self::Edx => 5,
            Self::Esi => 7,
            Self::Edi => 8,
        }
    }

    /// Stack base and stack top.
    #[inline]
    pub fn is_reserved(self) -> bool {
        matches!(self, Self::Ebp | Self::Esp)
    }

    /// Index into the general register array.
    pub fn general_index(self) -> Option<usize> {
        match self {
            Self::Ebp | Self::Esp => None,
            Self::Eax => Some(0),
            Self::Ebx => Some(1),
            Self::Ecx => Some(2),
            Self::Edx => Some(3),
            Self::Esi => Some(4),
            Self::Edi => Some(5),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ebp => "ebp",
            Self::Esp => "esp",
            Self::Eax => "eax",
            Self::Ebx => "ebx",
            Self::Ecx => "ecx",
            Self::Edx => "edx",
            Self::Esi => "esi",
            Self::Edi => "edi",
        }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_pointer_slot_is_not_a_register() {
        assert_eq!(Reg::from_operand(6), None);
        assert_eq!(Reg::from_operand(9), None);
        assert_eq!(Reg::from_operand(-1), None);
    }

    #[test]
    fn general_registers_map_to_dense_indices() {
        for (i, reg) in Reg::GENERAL.iter().enumerate() {
            assert_eq!(reg.general_index(), Some(i));
            assert!(!reg.is_reserved());
            assert_eq!(Reg::from_operand(reg.to_operand()), Some(*reg));
        }
        assert_eq!(Reg::Ebp.general_index(), None);
        assert!(Reg::Esp.is_reserved());
    }
}
