use kestrel_bytecode::WORD;

/// Zero-initialized stack memory, addressed by byte offset.
#[derive(Debug, Clone)]
pub struct Stack {
    bytes: Box<[u8]>,
}

impl Stack {
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size].into_boxed_slice(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Top address; stack pointers start here and grow down.
    pub fn top(&self) -> i32 {
        self.bytes.len() as i32
    }

    fn range(&self, addr: i32) -> Option<std::ops::Range<usize>> {
        let start = usize::try_from(addr).ok()?;
        let end = start.checked_add(WORD)?;
        (end <= self.bytes.len()).then_some(start..end)
    }

    /// Little-endian word at `addr`, or `None` when out of bounds.
    pub fn read(&self, addr: i32) -> Option<i32> {
        let range = self.range(addr)?;
        let mut word = [0u8; WORD];
        word.copy_from_slice(&self.bytes[range]);
        Some(i32::from_le_bytes(word))
    }

    /// Store a word; `false` when out of bounds.
    pub fn write(&mut self, addr: i32, value: i32) -> bool {
        let Some(range) = self.range(addr) else {
            return false;
        };
        self.bytes[range].copy_from_slice(&value.to_le_bytes());
        true
    }

    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds() {
        let mut stack = Stack::new(8);
        assert!(stack.write(4, -7));
        assert_eq!(stack.read(4), Some(-7));
        assert_eq!(stack.read(5), None);
        assert_eq!(stack.read(-1), None);
        assert!(!stack.write(8, 1));
    }

    #[test]
    fn clear_zeroes() {
        let mut stack = Stack::new(4);
        stack.write(0, 9);
        stack.clear();
        assert_eq!(stack.read(0), Some(0));
    }
}
