/**
 * ALSIngest
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use std::collections::hash_map::Iter;

use tracing::warn;

use crate::record::Value;
use crate::types::{self, Id, SparseMatrix, SparseVector};

/// The interaction matrix R, held twice: once by row (users) and once by column (items), since
/// ALS alternates between iterating over both. All mutation goes through `accumulate` and
/// `remove`, which always touch both orientations, so the two views cannot drift apart.
///
/// An outer key only exists while its inner map is non-empty.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct DualMatrix {
    by_row: SparseMatrix,
    by_column: SparseMatrix,
}

impl DualMatrix {

    pub fn new() -> Self {
        DualMatrix::default()
    }

    pub fn with_capacity(num_rows: usize, num_columns: usize) -> Self {
        DualMatrix {
            by_row: types::new_sparse_matrix(num_rows),
            by_column: types::new_sparse_matrix(num_columns),
        }
    }

    /// Adds `weight` to the cell, creating it (and its row and column) if necessary. Weights stay
    /// finite: an addition that would overflow is dropped and the cell keeps its weight.
    pub fn accumulate(&mut self, row: Id, column: Id, weight: f32) {
        let current = self.get(row, column).unwrap_or(0.0);
        if !(current + weight).is_finite() {
            warn!("Ignoring {} for ({}, {}), the weight {} would overflow", weight, row, column, current);
            return;
        }

        add_to(&mut self.by_row, row, column, weight);
        add_to(&mut self.by_column, column, row, weight);
    }

    /// Deletes the cell from both views, returning its former weight. Removing a cell that is not
    /// there is a no-op.
    pub fn remove(&mut self, row: Id, column: Id) -> Option<f32> {
        let removed = remove_from(&mut self.by_row, row, column);
        if removed.is_some() {
            remove_from(&mut self.by_column, column, row);
        }
        removed
    }

    pub fn apply(&mut self, row: Id, column: Id, value: Value) {
        match value {
            Value::Accumulate(weight) => self.accumulate(row, column, weight),
            Value::Remove => { self.remove(row, column); },
        }
    }

    /// Deletes every cell with an absolute weight strictly below `zero_threshold` and returns the
    /// deleted cells. Candidates are taken from the row view only, each one is then removed via
    /// `remove`, which handles the column view.
    pub fn prune(&mut self, zero_threshold: f32) -> Vec<(Id, Id)> {

        let mut negligible = Vec::new();

        for (row, entries) in self.by_row.iter() {
            for (column, weight) in entries.iter() {
                if weight.abs() < zero_threshold {
                    negligible.push((*row, *column));
                }
            }
        }

        for &(row, column) in negligible.iter() {
            self.remove(row, column);
        }

        negligible
    }

    pub fn get(&self, row: Id, column: Id) -> Option<f32> {
        self.by_row.get(&row).and_then(|entries| entries.get(&column)).cloned()
    }

    pub fn row(&self, row: Id) -> Option<&SparseVector> {
        self.by_row.get(&row)
    }

    pub fn column(&self, column: Id) -> Option<&SparseVector> {
        self.by_column.get(&column)
    }

    pub fn rows(&self) -> Iter<Id, SparseVector> {
        self.by_row.iter()
    }

    pub fn columns(&self) -> Iter<Id, SparseVector> {
        self.by_column.iter()
    }

    pub fn num_rows(&self) -> usize {
        self.by_row.len()
    }

    pub fn num_columns(&self) -> usize {
        self.by_column.len()
    }

    pub fn num_entries(&self) -> usize {
        self.by_row.values().map(|entries| entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_row.is_empty()
    }
}

fn add_to(matrix: &mut SparseMatrix, outer: Id, inner: Id, weight: f32) {
    *matrix.entry(outer)
        .or_insert_with(|| types::new_sparse_vector(1))
        .entry(inner)
        .or_insert(0.0) += weight;
}

fn remove_from(matrix: &mut SparseMatrix, outer: Id, inner: Id) -> Option<f32> {

    let (removed, now_empty) = match matrix.get_mut(&outer) {
        Some(entries) => {
            let removed = entries.remove(&inner);
            (removed, entries.is_empty())
        },
        None => return None,
    };

    if now_empty {
        matrix.remove(&outer);
    }

    removed
}


#[cfg(test)]
pub(crate) mod tests {

    use rand::{Rng, SeedableRng, XorShiftRng};

    use super::DualMatrix;
    use crate::record::Value;
    use crate::types::Id;

    /// Both orientations must hold exactly the same triples and no empty outer entries.
    pub fn assert_mirrored(matrix: &DualMatrix) {

        let mut from_rows: Vec<(Id, Id, f32)> = Vec::new();
        for (row, entries) in matrix.rows() {
            assert!(!entries.is_empty(), "row {} left behind without entries", row);
            for (column, weight) in entries.iter() {
                from_rows.push((*row, *column, *weight));
            }
        }

        let mut from_columns: Vec<(Id, Id, f32)> = Vec::new();
        for (column, entries) in matrix.columns() {
            assert!(!entries.is_empty(), "column {} left behind without entries", column);
            for (row, weight) in entries.iter() {
                from_columns.push((*row, *column, *weight));
            }
        }

        from_rows.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
        from_columns.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        assert_eq!(from_rows, from_columns);
    }

    #[test]
    fn accumulation_is_additive() {
        let mut stepwise = DualMatrix::new();
        stepwise.accumulate(1, 2, 2.0);
        stepwise.accumulate(1, 2, 3.0);

        let mut direct = DualMatrix::new();
        direct.accumulate(1, 2, 5.0);

        assert_eq!(stepwise, direct);
        assert_eq!(stepwise.get(1, 2), Some(5.0));
        assert_eq!(stepwise.column(2).and_then(|entries| entries.get(&1)), Some(&5.0));
    }

    #[test]
    fn overflowing_additions_are_dropped() {
        let mut matrix = DualMatrix::new();
        matrix.accumulate(1, 2, std::f32::MAX);
        matrix.accumulate(1, 2, std::f32::MAX);
        matrix.accumulate(1, 2, -1.0e38);

        assert_eq!(matrix.get(1, 2), Some(std::f32::MAX - 1.0e38));
        assert!(matrix.rows().all(|(_, entries)| entries.values().all(|weight| weight.is_finite())));
        assert_mirrored(&matrix);
    }

    #[test]
    fn removal_overrides_accumulated_weight() {
        let mut matrix = DualMatrix::new();
        matrix.accumulate(1, 2, 5.0);
        matrix.accumulate(1, 3, 1.0);

        assert_eq!(matrix.remove(1, 2), Some(5.0));

        assert_eq!(matrix.get(1, 2), None);
        assert!(matrix.column(2).is_none());
        assert_eq!(matrix.num_rows(), 1);
        assert_eq!(matrix.num_entries(), 1);
        assert_mirrored(&matrix);
    }

    #[test]
    fn removing_last_cell_drops_outer_keys() {
        let mut matrix = DualMatrix::new();
        matrix.apply(7, 8, Value::Accumulate(1.0));
        matrix.apply(7, 8, Value::Remove);

        assert!(matrix.is_empty());
        assert_eq!(matrix.num_columns(), 0);
    }

    #[test]
    fn removing_missing_cell_is_noop() {
        let mut matrix = DualMatrix::new();
        matrix.accumulate(1, 1, 1.0);

        assert_eq!(matrix.remove(1, 2), None);
        assert_eq!(matrix.remove(2, 1), None);
        assert_eq!(matrix.remove(3, 3), None);

        assert_eq!(matrix.num_entries(), 1);
        assert_mirrored(&matrix);
    }

    #[test]
    fn prune_uses_strict_threshold() {
        let mut matrix = DualMatrix::new();
        matrix.accumulate(1, 1, 0.05);
        matrix.accumulate(1, 2, 0.2);
        matrix.accumulate(2, 1, -0.05);
        matrix.accumulate(3, 3, 0.1);

        let mut pruned = matrix.prune(0.1);
        pruned.sort();

        assert_eq!(pruned, vec![(1, 1), (2, 1)]);
        assert_eq!(matrix.get(1, 2), Some(0.2));
        assert_eq!(matrix.get(3, 3), Some(0.1));
        assert!(matrix.row(2).is_none());
        assert_mirrored(&matrix);
    }

    #[test]
    fn prune_is_idempotent() {
        let mut matrix = DualMatrix::new();
        matrix.accumulate(1, 1, 0.01);
        matrix.accumulate(1, 2, 3.0);
        matrix.accumulate(2, 2, -0.5);

        matrix.prune(1.0);
        let once = matrix.clone();

        assert!(matrix.prune(1.0).is_empty());
        assert_eq!(matrix, once);
    }

    #[test]
    fn random_operations_keep_views_mirrored() {
        let mut rng: XorShiftRng = SeedableRng::from_seed([7, 11, 13, 17]);
        let mut matrix = DualMatrix::new();

        for step in 0..5_000 {
            let row: Id = rng.gen_range(0, 20);
            let column: Id = rng.gen_range(0, 30);

            if rng.gen_weighted_bool(4) {
                matrix.remove(row, column);
            } else {
                let weight = rng.gen_range(-1.0_f32, 2.0_f32);
                matrix.accumulate(row, column, weight);
            }

            if step % 1_000 == 999 {
                matrix.prune(0.05);
            }
        }

        assert_mirrored(&matrix);
    }
}
