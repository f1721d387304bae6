#![forbid(unsafe_code)]

use serde::{Serialize, Serializer};
use std::collections::VecDeque;

/// Append-only sequence that keeps only the newest `capacity` entries.
#[derive(Debug, Clone, PartialEq)]
pub struct CappedLog<T> {
    entries: VecDeque<T>,
    capacity: usize,
}

impl<T> CappedLog<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    /// Build a log from entries in insertion order, dropping the oldest ones
    /// that do not fit.
    pub fn from_entries(entries: impl IntoIterator<Item = T>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        for entry in entries {
            log.push(entry);
        }
        log
    }

    pub fn push(&mut self, entry: T) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.entries.iter()
    }

    /// The newest `count` entries, newest first.
    pub fn latest(&self, count: usize) -> impl Iterator<Item = &T> {
        self.entries.iter().rev().take(count)
    }
}

impl<T: Serialize> Serialize for CappedLog<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn latest_is_newest_first() {
        let log = CappedLog::from_entries(1..=5, 10);
        let latest: Vec<_> = log.latest(3).copied().collect();
        assert_eq!(latest, vec![5, 4, 3]);
    }

    proptest! {
        #[test]
        fn keeps_the_most_recent_capacity_entries(
            capacity in 1usize..64,
            values in prop::collection::vec(any::<u32>(), 0..256),
        ) {
            let mut log = CappedLog::new(capacity);
            for value in &values {
                log.push(*value);
            }

            let kept: Vec<u32> = log.iter().copied().collect();
            let skip = values.len().saturating_sub(capacity);
            prop_assert_eq!(log.len(), values.len().min(capacity));
            prop_assert_eq!(kept, values[skip..].to_vec());
        }
    }
}
