use kestrel_bytecode::{NUM_GENERAL, Reg};

/// Register file. Stack base, stack top and the instruction pointer are
/// named fields; only the general registers are indexable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Registers {
    pub ebp: i32,
    pub esp: i32,
    /// Address of the next instruction to fetch.
    pub eip: u32,
    general: [i32; NUM_GENERAL],
}

impl Registers {
    /// Fresh state: both stack pointers at `stack_top`, general registers zeroed.
    pub fn new(stack_top: i32, entry: u32) -> Self {
        Self {
            ebp: stack_top,
            esp: stack_top,
            eip: entry,
            general: [0; NUM_GENERAL],
        }
    }

    pub fn get(&self, reg: Reg) -> i32 {
        match reg {
            Reg::Ebp => self.ebp,
            Reg::Esp => self.esp,
            _ => reg.general_index().map_or(0, |i| self.general[i]),
        }
    }

    pub fn set(&mut self, reg: Reg, value: i32) {
        match reg {
            Reg::Ebp => self.ebp = value,
            Reg::Esp => self.esp = value,
            _ => {
                if let Some(i) = reg.general_index() {
                    self.general[i] = value;
                }
            }
        }
    }

    pub fn general(&self) -> &[i32; NUM_GENERAL] {
        &self.general
    }
}
