//! Reorder buffer
//!
//! Restores strict `frame_id` order at the Sink. Records that arrive ahead of
//! the cursor wait in an ordered map until every earlier id has been released.
//!
//! Invariants between calls:
//! - the map never holds `next_expected_id`
//! - every key is unique and greater than `next_expected_id`

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Result of offering an item to the buffer
#[derive(Debug)]
pub enum Admission<T> {
    /// The item is the next expected one and must be rendered now.
    /// The cursor has already moved past it.
    Ready(T),
    /// Parked until the gap before it closes
    Buffered,
    /// Id below the cursor: already rendered once
    Stale(T),
    /// Id already parked in the buffer
    Duplicate(T),
}

/// Ordered map plus sequence cursor
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    pending: BTreeMap<u64, T>,
    next_expected_id: u64,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_expected_id: 0,
        }
    }

    pub fn next_expected_id(&self) -> u64 {
        self.next_expected_id
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Buffered ids in ascending order
    pub fn pending_ids(&self) -> Vec<u64> {
        self.pending.keys().copied().collect()
    }

    /// Whether `admit` would park this id rather than release or reject it
    pub fn would_park(&self, frame_id: u64) -> bool {
        frame_id > self.next_expected_id && !self.pending.contains_key(&frame_id)
    }

    /// Offer an item that arrived off the channel
    pub fn admit(&mut self, frame_id: u64, item: T) -> Admission<T> {
        if frame_id == self.next_expected_id {
            self.next_expected_id += 1;
            return Admission::Ready(item);
        }
        if frame_id < self.next_expected_id {
            return Admission::Stale(item);
        }

        match self.pending.entry(frame_id) {
            Entry::Occupied(_) => Admission::Duplicate(item),
            Entry::Vacant(slot) => {
                slot.insert(item);
                Admission::Buffered
            }
        }
    }

    /// Pop the item at the cursor, if buffered, and advance the cursor.
    ///
    /// Call until it returns `None` to drain greedily.
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next_expected_id)?;
        self.next_expected_id += 1;
        Some(item)
    }

    /// Discard everything still parked, returning the ids in order
    pub fn clear(&mut self) -> Vec<u64> {
        std::mem::take(&mut self.pending).into_keys().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::seq::SliceRandom;

    /// Feed ids through the buffer the way the Sink does, returning the
    /// release order.
    fn replay(arrivals: &[u64]) -> Vec<u64> {
        let mut buffer = ReorderBuffer::new();
        let mut released = Vec::new();
        for &id in arrivals {
            if let Admission::Ready(item) = buffer.admit(id, id) {
                released.push(item);
            }
            while let Some(item) = buffer.pop_ready() {
                released.push(item);
            }
            assert!(!buffer.pending_ids().contains(&buffer.next_expected_id()));
        }
        released
    }

    #[test]
    fn test_in_order_never_buffers() {
        let mut buffer = ReorderBuffer::new();
        for id in 0..5u64 {
            assert!(matches!(buffer.admit(id, id), Admission::Ready(x) if x == id));
            assert!(buffer.is_empty());
        }
        assert_eq!(buffer.next_expected_id(), 5);
    }

    #[test]
    fn test_arrival_two_zero_one() {
        let mut buffer = ReorderBuffer::new();

        assert!(matches!(buffer.admit(2, "two"), Admission::Buffered));
        assert_eq!(buffer.pending_ids(), vec![2]);

        assert!(matches!(buffer.admit(0, "zero"), Admission::Ready("zero")));
        assert!(buffer.pop_ready().is_none());
        assert_eq!(buffer.pending_ids(), vec![2]);

        assert!(matches!(buffer.admit(1, "one"), Admission::Ready("one")));
        assert_eq!(buffer.pop_ready(), Some("two"));
        assert!(buffer.pop_ready().is_none());
        assert!(buffer.is_empty());
        assert_eq!(buffer.next_expected_id(), 3);
    }

    #[test]
    fn test_drained_items_keep_their_own_payload() {
        let mut buffer = ReorderBuffer::new();
        assert!(matches!(buffer.admit(1, "payload-1"), Admission::Buffered));
        assert!(matches!(buffer.admit(0, "payload-0"), Admission::Ready("payload-0")));
        assert_eq!(buffer.pop_ready(), Some("payload-1"));
    }

    #[test]
    fn test_stale_and_duplicate_rejected() {
        let mut buffer = ReorderBuffer::new();
        assert!(matches!(buffer.admit(0, 0), Admission::Ready(_)));
        assert!(matches!(buffer.admit(0, 0), Admission::Stale(_)));

        assert!(matches!(buffer.admit(3, 3), Admission::Buffered));
        assert!(matches!(buffer.admit(3, 33), Admission::Duplicate(33)));
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_would_park_only_for_new_future_ids() {
        let mut buffer = ReorderBuffer::new();
        assert!(!buffer.would_park(0));
        assert!(buffer.would_park(2));

        buffer.admit(2, ());
        assert!(!buffer.would_park(2));
        buffer.admit(0, ());
        assert!(!buffer.would_park(0));
        assert!(buffer.would_park(5));
    }

    #[test]
    fn test_clear_reports_leftovers() {
        let mut buffer = ReorderBuffer::new();
        buffer.admit(4, ());
        buffer.admit(2, ());
        assert_eq!(buffer.clear(), vec![2, 4]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_reverse_order_releases_everything_at_the_end() {
        let arrivals: Vec<u64> = (0..50).rev().collect();
        assert_eq!(replay(&arrivals), (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_random_permutations_release_in_order() {
        let mut rng = rand::rng();
        for n in [0usize, 1, 2, 7, 64, 500] {
            for _ in 0..20 {
                let mut arrivals: Vec<u64> = (0..n as u64).collect();
                arrivals.shuffle(&mut rng);
                assert_eq!(replay(&arrivals), (0..n as u64).collect::<Vec<_>>());
            }
        }
    }
}
