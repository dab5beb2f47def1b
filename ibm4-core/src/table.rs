//! Sparse two-level probability tables.
//!
//! A table maps `row -> column -> probability`. Each row carries its own
//! default for columns it has never seen, and rows that do not exist at all
//! read as [`MIN_PROB`]. Lookups therefore never fail.

use core::hash::Hash;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::types::{Prob, MIN_PROB};

#[derive(Debug, Clone)]
struct Row<C> {
    default: Prob,
    entries: HashMap<C, Prob>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(
    from = "TableRepr<R, C>",
    into = "TableRepr<R, C>",
    bound(
        serialize = "R: Serialize + Clone, C: Serialize + Clone",
        deserialize = "R: Deserialize<'de> + Hash + Eq, C: Deserialize<'de> + Hash + Eq"
    )
)]
pub struct ProbTable<R, C> {
    rows: HashMap<R, Row<C>>,
}

impl<R, C> Default for ProbTable<R, C> {
    fn default() -> Self {
        ProbTable { rows: HashMap::new() }
    }
}

impl<R: Hash + Eq, C: Hash + Eq> ProbTable<R, C> {
    pub fn new() -> Self { Self::default() }

    #[inline]
    pub fn get_or_floor(&self, row: &R, col: &C) -> Prob {
        match self.rows.get(row) {
            Some(r) => r.entries.get(col).copied().unwrap_or(r.default),
            None => MIN_PROB,
        }
    }

    /// Sets one entry, creating the row with a `MIN_PROB` default if needed.
    pub fn insert(&mut self, row: R, col: C, p: Prob) {
        self.rows
            .entry(row)
            .or_insert_with(|| Row { default: MIN_PROB, entries: HashMap::new() })
            .entries
            .insert(col, p);
    }

    /// Replaces a row with an empty one whose unseen columns read as `default`.
    pub fn reset_row(&mut self, row: R, default: Prob) {
        self.rows.insert(row, Row { default, entries: HashMap::new() });
    }

    /// Number of explicit entries across all rows.
    pub fn len(&self) -> usize {
        self.rows.values().map(|r| r.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.values().all(|r| r.entries.is_empty())
    }

    /// Every explicit `(row, column, probability)` entry.
    pub fn iter(&self) -> impl Iterator<Item = (&R, &C, Prob)> {
        self.rows
            .iter()
            .flat_map(|(r, row)| row.entries.iter().map(move |(c, &p)| (r, c, p)))
    }
}

impl<R: Hash + Eq, C: Hash + Eq> PartialEq for ProbTable<R, C> {
    fn eq(&self, other: &Self) -> bool {
        self.rows.len() == other.rows.len()
            && self.rows.iter().all(|(k, row)| {
                other
                    .rows
                    .get(k)
                    .is_some_and(|o| row.default == o.default && row.entries == o.entries)
            })
    }
}

// JSON maps need string keys, so rows are stored as a list.
#[derive(Serialize, Deserialize)]
struct RowRepr<R, C> {
    row: R,
    default: Prob,
    entries: Vec<(C, Prob)>,
}

#[derive(Serialize, Deserialize)]
#[serde(transparent)]
struct TableRepr<R, C> {
    rows: Vec<RowRepr<R, C>>,
}

impl<R, C> From<ProbTable<R, C>> for TableRepr<R, C> {
    fn from(t: ProbTable<R, C>) -> Self {
        TableRepr {
            rows: t
                .rows
                .into_iter()
                .map(|(row, r)| RowRepr { row, default: r.default, entries: r.entries.into_iter().collect() })
                .collect(),
        }
    }
}

impl<R: Hash + Eq, C: Hash + Eq> From<TableRepr<R, C>> for ProbTable<R, C> {
    fn from(repr: TableRepr<R, C>) -> Self {
        let rows = repr
            .rows
            .into_iter()
            .map(|r| (r.row, Row { default: r.default, entries: r.entries.into_iter().collect() }))
            .collect();
        ProbTable { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_row_reads_as_floor() {
        let t: ProbTable<isize, u32> = ProbTable::new();
        assert_eq!(t.get_or_floor(&3, &1), MIN_PROB);
        assert!(t.is_empty());
    }

    #[test]
    fn row_default_covers_unseen_columns() {
        let mut t: ProbTable<isize, u32> = ProbTable::new();
        t.reset_row(-2, 0.25);
        t.insert(-2, 7, 0.5);
        assert_eq!(t.get_or_floor(&-2, &7), 0.5);
        assert_eq!(t.get_or_floor(&-2, &8), 0.25);
        assert_eq!(t.get_or_floor(&2, &7), MIN_PROB);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn reset_row_drops_entries() {
        let mut t: ProbTable<usize, u32> = ProbTable::new();
        t.insert(1, 4, 0.9);
        t.reset_row(1, 0.65);
        assert_eq!(t.get_or_floor(&1, &4), 0.65);
    }

    #[test]
    fn tuple_columns_survive_json() {
        let mut t: ProbTable<isize, (Option<u32>, u32)> = ProbTable::new();
        t.reset_row(1, 0.1);
        t.insert(1, (None, 3), 0.75);
        t.insert(-1, (Some(2), 3), 0.5);
        let json = serde_json::to_string(&t).unwrap();
        let back: ProbTable<isize, (Option<u32>, u32)> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
        assert_eq!(back.get_or_floor(&1, &(Some(9), 9)), 0.1);
    }
}
