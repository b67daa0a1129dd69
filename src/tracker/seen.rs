//! Bounded record of lobby ids that were already processed
//!
//! Ids are remembered in insertion order. Trimming drops the oldest
//! insertions first; looking an id up does not refresh its position.

use crate::types::LobbyId;
use std::collections::{HashSet, VecDeque};

/// Insertion-ordered set of lobby ids with a capacity enforced on trim
#[derive(Debug, Clone)]
pub struct SeenSet {
    ids: HashSet<LobbyId>,
    order: VecDeque<LobbyId>,
    capacity: usize,
}

impl SeenSet {
    /// Create an empty set that keeps at most `capacity` ids after a trim
    pub fn new(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    /// Record an id; returns false when it was already present
    pub fn insert(&mut self, id: &str) -> bool {
        if self.ids.contains(id) {
            return false;
        }
        self.ids.insert(id.to_string());
        self.order.push_back(id.to_string());
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop the oldest ids until the set fits its capacity; returns how many were dropped
    pub fn trim(&mut self) -> usize {
        if self.order.len() <= self.capacity {
            return 0;
        }

        let to_remove = self.order.len() - self.capacity;
        for id in self.order.drain(..to_remove) {
            self.ids.remove(&id);
        }
        to_remove
    }

    /// Ids from oldest to newest insertion
    pub fn iter(&self) -> impl Iterator<Item = &LobbyId> {
        self.order.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_reports_duplicates() {
        let mut seen = SeenSet::new(10);
        assert!(seen.insert("a"));
        assert!(!seen.insert("a"));
        assert!(seen.contains("a"));
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn test_trim_keeps_most_recent_insertions() {
        let mut seen = SeenSet::new(3);
        for id in ["1", "2", "3", "4", "5"] {
            seen.insert(id);
        }
        assert_eq!(seen.len(), 5);

        assert_eq!(seen.trim(), 2);
        assert_eq!(seen.len(), 3);
        assert!(!seen.contains("1"));
        assert!(!seen.contains("2"));
        let kept: Vec<&str> = seen.iter().map(String::as_str).collect();
        assert_eq!(kept, vec!["3", "4", "5"]);
    }

    #[test]
    fn test_reinsert_does_not_refresh_position() {
        let mut seen = SeenSet::new(2);
        seen.insert("old");
        seen.insert("mid");
        seen.insert("old");
        seen.insert("new");

        seen.trim();
        assert!(!seen.contains("old"));
        assert!(seen.contains("mid"));
        assert!(seen.contains("new"));
    }

    #[test]
    fn test_trim_within_capacity_is_noop() {
        let mut seen = SeenSet::new(5);
        seen.insert("a");
        assert_eq!(seen.trim(), 0);
        assert_eq!(seen.len(), 1);
    }
}
