//! Sparse two-key table of nonnegative reals.
//!
//! Every probability table and every EM accumulator is one of these. Missing
//! entries read as 0, and enumeration only visits keys that were actually
//! written, so renormalization walks observed pairs instead of the full cross
//! product. Iteration order is unspecified.

use core::hash::Hash;

use hashbrown::HashMap;

use crate::types::Prob;

pub type Row<K2> = HashMap<K2, Prob>;

#[derive(Clone, Debug)]
pub struct SparseJointTable<K1, K2> {
    rows: HashMap<K1, Row<K2>>,
}

impl<K1, K2> Default for SparseJointTable<K1, K2> {
    fn default() -> Self {
        SparseJointTable { rows: HashMap::default() }
    }
}

impl<K1: Eq + Hash, K2: Eq + Hash> SparseJointTable<K1, K2> {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, k1: &K1, k2: &K2) -> Prob {
        self.rows
            .get(k1)
            .and_then(|row| row.get(k2))
            .copied()
            .unwrap_or(0.0)
    }

    #[inline]
    pub fn set(&mut self, k1: K1, k2: K2, value: Prob) {
        debug_assert!(value >= 0.0, "negative table value {value}");
        self.rows.entry(k1).or_default().insert(k2, value);
    }

    /// Adds `delta` to the entry, creating it (from 0) when missing. A zero
    /// delta still records the key as observed.
    #[inline]
    pub fn increment(&mut self, k1: K1, k2: K2, delta: Prob) {
        *self.rows.entry(k1).or_default().entry(k2).or_insert(0.0) += delta;
    }

    pub fn keys_of1(&self) -> impl Iterator<Item = &K1> + '_ {
        self.rows.keys()
    }

    pub fn keys_of2<'a>(&'a self, k1: &K1) -> impl Iterator<Item = &'a K2> + 'a {
        self.rows.get(k1).into_iter().flat_map(|row| row.keys())
    }

    pub fn row(&self, k1: &K1) -> Option<&Row<K2>> {
        self.rows.get(k1)
    }

    pub fn row_sum(&self, k1: &K1) -> Prob {
        self.rows.get(k1).map(|row| row.values().sum()).unwrap_or(0.0)
    }

    /// Swaps in a whole row and hands back the one it replaced.
    pub fn replace_row(&mut self, k1: K1, row: Row<K2>) -> Option<Row<K2>> {
        self.rows.insert(k1, row)
    }

    pub fn into_rows(self) -> impl Iterator<Item = (K1, Row<K2>)> {
        self.rows.into_iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K1, &K2, Prob)> + '_ {
        self.rows
            .iter()
            .flat_map(|(k1, row)| row.iter().map(move |(k2, &v)| (k1, k2, v)))
    }

    /// Number of stored (k1, k2) entries.
    pub fn len(&self) -> usize {
        self.rows.values().map(|row| row.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|row| row.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn missing_entries_read_as_zero() {
        let t: SparseJointTable<u32, u32> = SparseJointTable::new();
        assert_eq!(t.get(&1, &2), 0.0);
        assert_eq!(t.row_sum(&1), 0.0);
        assert!(t.is_empty());
        assert_eq!(t.keys_of2(&1).count(), 0);
    }

    #[test]
    fn set_overwrites_and_increment_accumulates() {
        let mut t = SparseJointTable::new();
        t.set("a", "x", 0.25);
        t.set("a", "x", 0.5);
        t.increment("a", "y", 0.125);
        t.increment("a", "y", 0.125);
        t.increment("b", "x", 0.0);
        assert_eq!(t.get(&"a", &"x"), 0.5);
        assert_eq!(t.get(&"a", &"y"), 0.25);
        assert_eq!(t.len(), 3);
        // zero increments still register the key
        assert_eq!(t.keys_of2(&"b").copied().collect::<Vec<_>>(), vec!["x"]);
    }

    #[test]
    fn key_enumeration_is_set_equal() {
        let mut t = SparseJointTable::new();
        t.set(1u32, 10u32, 0.1);
        t.set(1, 11, 0.2);
        t.set(2, 10, 0.3);
        let k1: HashSet<u32> = t.keys_of1().copied().collect();
        assert_eq!(k1, HashSet::from([1, 2]));
        let k2: HashSet<u32> = t.keys_of2(&1).copied().collect();
        assert_eq!(k2, HashSet::from([10, 11]));
        assert!((t.row_sum(&1) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn replace_row_returns_previous() {
        let mut t = SparseJointTable::new();
        t.set(1u32, 1u32, 1.0);
        let mut fresh = Row::new();
        fresh.insert(2u32, 0.5);
        let old = t.replace_row(1, fresh).unwrap();
        assert_eq!(old.get(&1), Some(&1.0));
        assert_eq!(t.get(&1, &1), 0.0);
        assert_eq!(t.get(&1, &2), 0.5);
    }
}
