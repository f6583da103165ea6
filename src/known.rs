use std::collections::hash_map::Iter;

use fnv::FnvHashMap;

use crate::record::Value;
use crate::types::{self, Id, IdSet};

/// Per row, the columns currently present in the interaction matrix ("known items" of a user).
/// A row is only kept while its set is non-empty.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct KnownItems {
    items_by_row: FnvHashMap<Id, IdSet>,
}

impl KnownItems {

    pub fn new() -> Self {
        KnownItems::default()
    }

    pub fn insert(&mut self, row: Id, column: Id) {
        self.items_by_row
            .entry(row)
            .or_insert_with(|| types::new_id_set(1))
            .insert(column);
    }

    pub fn remove(&mut self, row: Id, column: Id) {

        let now_empty = match self.items_by_row.get_mut(&row) {
            Some(columns) => {
                columns.remove(&column);
                columns.is_empty()
            },
            None => false,
        };

        if now_empty {
            self.items_by_row.remove(&row);
        }
    }

    /// Mirrors `DualMatrix::apply`.
    pub fn apply(&mut self, row: Id, column: Id, value: Value) {
        match value {
            Value::Accumulate(_) => self.insert(row, column),
            Value::Remove => self.remove(row, column),
        }
    }

    pub fn get(&self, row: Id) -> Option<&IdSet> {
        self.items_by_row.get(&row)
    }

    pub fn contains(&self, row: Id, column: Id) -> bool {
        self.get(row).map_or(false, |columns| columns.contains(&column))
    }

    pub fn iter(&self) -> Iter<Id, IdSet> {
        self.items_by_row.iter()
    }

    pub fn num_rows(&self) -> usize {
        self.items_by_row.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items_by_row.is_empty()
    }
}
