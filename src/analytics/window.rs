//! Fixed-capacity rolling window

use std::collections::VecDeque;

/// Largest up-front allocation; bigger windows grow on demand
const PREALLOCATE_LIMIT: usize = 8192;

/// Fixed-capacity FIFO history buffer
///
/// Holds the `capacity` most recently pushed values. Pushing into a full
/// window evicts the oldest value. Not internally synchronized; the owner
/// serializes access.
#[derive(Debug, Clone)]
pub struct RollingWindow<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T: Clone> RollingWindow<T> {
    /// Create a window holding at most `capacity` values (0 is clamped to 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity.min(PREALLOCATE_LIMIT)),
            capacity,
        }
    }

    /// Push a value, evicting the oldest one if the window is full
    pub fn push(&mut self, value: T) {
        if self.data.len() == self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(value);
    }

    /// Copy of all values, oldest to newest
    pub fn values(&self) -> Vec<T> {
        self.data.iter().cloned().collect()
    }

    /// Copy of the last `n` values (or fewer if the window holds less), oldest to newest
    pub fn tail(&self, n: usize) -> Vec<T> {
        let skip = self.data.len().saturating_sub(n);
        self.data.iter().skip(skip).cloned().collect()
    }

    /// Iterate oldest to newest without copying
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.data.iter()
    }

    /// Most recently pushed value
    pub fn latest(&self) -> Option<&T> {
        self.data.back()
    }

    /// Current number of values
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Maximum number of values
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// Drop all values, keeping the capacity
    pub fn clear(&mut self) {
        self.data.clear();
    }
}
