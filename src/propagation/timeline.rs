//! Reversible resource timelines.
//!
//! Each resource keeps its reservations as `(start, end, units)` triples
//! in a managed array, plus a reversible capacity. Reservations are only
//! ever appended during an evaluation, so rollbacks just shrink the array.

use crate::rev::{LogMode, RevInt, RevStore, RevVec};

/// Reservations and capacity of one resource.
#[derive(Debug, Clone, Copy)]
pub struct Timeline {
    reservations: RevVec,
    capacity: RevInt,
}

impl Timeline {
    /// Registers an empty timeline with the given capacity.
    pub fn new(store: &mut RevStore, capacity: u32) -> Self {
        Self {
            reservations: store.new_vec(LogMode::PerElement),
            capacity: store.new_int(i64::from(capacity)),
        }
    }

    /// Current capacity.
    pub fn capacity(&self, store: &RevStore) -> i64 {
        store.get(self.capacity)
    }

    /// Changes the capacity.
    pub fn set_capacity(&self, store: &mut RevStore, capacity: u32) {
        store.set(self.capacity, i64::from(capacity));
    }

    /// Number of reservations.
    pub fn len(&self, store: &RevStore) -> usize {
        store.len(self.reservations) / 3
    }

    /// Whether nothing is reserved.
    pub fn is_empty(&self, store: &RevStore) -> bool {
        store.is_empty(self.reservations)
    }

    /// Books `units` over `[start, end)`.
    pub fn reserve(&self, store: &mut RevStore, start: i64, end: i64, units: u32) {
        store.push(self.reservations, start);
        store.push(self.reservations, end);
        store.push(self.reservations, i64::from(units));
    }

    fn triples<'s>(&self, store: &'s RevStore) -> impl Iterator<Item = (i64, i64, i64)> + 's {
        store
            .slice(self.reservations)
            .chunks_exact(3)
            .map(|c| (c[0], c[1], c[2]))
    }

    /// Booked units at time `t`.
    pub fn load_at(&self, store: &RevStore, t: i64) -> i64 {
        self.triples(store)
            .filter(|&(s, e, _)| s <= t && t < e)
            .map(|(_, _, u)| u)
            .sum()
    }

    /// Whether `units` more fit over `[start, end)`.
    ///
    /// The load is piecewise constant and only rises at reservation
    /// starts, so checking `start` and every start inside the interval
    /// is enough.
    pub fn fits(&self, store: &RevStore, start: i64, end: i64, units: u32) -> bool {
        let cap = self.capacity(store);
        let units = i64::from(units);
        if units > cap {
            return false;
        }
        if end <= start {
            return true;
        }
        if self.load_at(store, start) + units > cap {
            return false;
        }
        self.triples(store)
            .filter(|&(s, _, _)| s > start && s < end)
            .all(|(s, _, _)| self.load_at(store, s) + units <= cap)
    }

    /// Reservation ends strictly after `t`, ascending.
    pub fn release_points_after(&self, store: &RevStore, t: i64) -> Vec<i64> {
        let mut ends: Vec<i64> = self
            .triples(store)
            .map(|(_, e, _)| e)
            .filter(|&e| e > t)
            .collect();
        ends.sort_unstable();
        ends.dedup();
        ends
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fits_respects_capacity() {
        let mut store = RevStore::new();
        let tl = Timeline::new(&mut store, 2);
        tl.reserve(&mut store, 0, 10, 1);
        tl.reserve(&mut store, 5, 15, 1);

        assert!(tl.fits(&store, 0, 5, 1));
        assert!(!tl.fits(&store, 4, 6, 1));
        assert!(tl.fits(&store, 10, 20, 1));
        assert!(!tl.fits(&store, 0, 1, 3));
        assert_eq!(tl.load_at(&store, 7), 2);
        assert_eq!(tl.release_points_after(&store, 0), vec![10, 15]);
    }

    #[test]
    fn test_reservations_roll_back() {
        let mut store = RevStore::new();
        let tl = Timeline::new(&mut store, 1);
        tl.reserve(&mut store, 0, 4, 1);

        let base = store.depth();
        store.checkpoint();
        tl.reserve(&mut store, 4, 8, 1);
        tl.set_capacity(&mut store, 3);
        assert_eq!(tl.len(&store), 2);

        store.backtrack(base);
        assert_eq!(tl.len(&store), 1);
        assert_eq!(tl.capacity(&store), 1);
        assert!(tl.fits(&store, 4, 8, 1));
    }
}
