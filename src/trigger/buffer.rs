// Rolling buffer of the most recently typed characters

use std::collections::VecDeque;

/// Default number of characters kept
pub const DEFAULT_BUFFER_CAPACITY: usize = 30;

/// Keeps the last `capacity` typed characters; oldest are dropped first.
///
/// Triggers longer than the capacity can never match.
#[derive(Debug, Clone)]
pub struct TypedBuffer {
    chars: VecDeque<char>,
    capacity: usize,
}

impl TypedBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            chars: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, c: char) {
        self.chars.push_back(c);
        while self.chars.len() > self.capacity {
            self.chars.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.chars.clear();
    }

    /// True if the buffer ends with `suffix`
    pub fn ends_with(&self, suffix: &str) -> bool {
        let n = suffix.chars().count();
        if n > self.chars.len() {
            return false;
        }
        self.chars
            .iter()
            .skip(self.chars.len() - n)
            .copied()
            .eq(suffix.chars())
    }

    /// Buffer contents with surrounding whitespace removed
    pub fn trimmed(&self) -> String {
        self.contents().trim().to_string()
    }

    pub fn contents(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

impl Default for TypedBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }
}

#[cfg(test)]
#[path = "buffer_test.rs"]
mod tests;
