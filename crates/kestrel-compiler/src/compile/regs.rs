//! Allocation of the general-purpose registers to expression temporaries.

use kestrel_bytecode::{NUM_GENERAL, Reg};

#[derive(Debug, Default)]
pub struct RegisterPool {
    in_use: [bool; NUM_GENERAL],
}

impl RegisterPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lowest free register, if any.
    pub fn alloc(&mut self) -> Option<Reg> {
        let index = self.in_use.iter().position(|used| !used)?;
        self.in_use[index] = true;
        Some(Reg::GENERAL[index])
    }

    /// Return a register to the pool. Reserved registers are ignored.
    pub fn free(&mut self, reg: Reg) {
        if let Some(index) = reg.general_index() {
            self.in_use[index] = false;
        }
    }

    pub fn reset(&mut self) {
        self.in_use = [false; NUM_GENERAL];
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use.iter().filter(|used| **used).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_lowest_free() {
        let mut pool = RegisterPool::new();
        assert_eq!(pool.alloc(), Some(Reg::Eax));
        assert_eq!(pool.alloc(), Some(Reg::Ebx));
        pool.free(Reg::Eax);
        assert_eq!(pool.alloc(), Some(Reg::Eax));
        assert_eq!(pool.in_use_count(), 2);
    }

    #[test]
    fn exhaustion() {
        let mut pool = RegisterPool::new();
        for _ in 0..NUM_GENERAL {
            assert!(pool.alloc().is_some());
        }
        assert_eq!(pool.alloc(), None);

        pool.reset();
        assert_eq!(pool.in_use_count(), 0);
    }
}
