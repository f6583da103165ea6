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

use fnv::{FnvHashMap, FnvHashSet};

/// Row and column keys. Inbound string ids are resolved to these, historical files already
/// contain them.
pub type Id = i64;

pub type SparseVector = FnvHashMap<Id, f32>;
pub type SparseMatrix = FnvHashMap<Id, SparseVector>;

pub type IdSet = FnvHashSet<Id>;

pub fn new_sparse_vector(capacity: usize) -> SparseVector {
    FnvHashMap::with_capacity_and_hasher(capacity, Default::default())
}

pub fn new_sparse_matrix(num_rows: usize) -> SparseMatrix {
    FnvHashMap::with_capacity_and_hasher(num_rows, Default::default())
}

pub fn new_id_set(capacity: usize) -> IdSet {
    FnvHashSet::with_capacity_and_hasher(capacity, Default::default())
}
