//! Various utility structs.

/// A simple incrementing counter.
#[derive(Clone, Default)]
pub struct Counter {
    value: usize,
}

impl Counter {
    /// Returns current counter value.
    pub fn curr(&self) -> usize {
        self.value
    }

    /// Post-increments the counter.
    pub fn increment(&mut self) -> usize {
        let curr = self.value;
        self.value += 1;
        curr
    }
}
