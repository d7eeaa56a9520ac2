/// Source of randomness for conversation-starter selection.
pub trait StarterPicker: Send + Sync {
    /// Returns an index in `0..len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Uniform picker backed by the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngPicker;

impl StarterPicker for ThreadRngPicker {
    fn pick(&self, len: usize) -> usize {
        rand::random_range(0..len.max(1))
    }
}

/// Always picks the same slot (wrapped to the pool size). Used for
/// reproducible output.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl StarterPicker for FixedPicker {
    fn pick(&self, len: usize) -> usize {
        self.0 % len.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_picker_stays_in_range() {
        let picker = ThreadRngPicker;
        for _ in 0..200 {
            assert!(picker.pick(3) < 3);
        }
    }

    #[test]
    fn fixed_picker_wraps() {
        assert_eq!(FixedPicker(5).pick(4), 1);
        assert_eq!(FixedPicker(0).pick(1), 0);
    }
}
