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

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{Config, DecayConfig};
use crate::error::{IngestError, IngestResult};
use crate::io;
use crate::known::KnownItems;
use crate::matrix::DualMatrix;
use crate::record::{Batch, Interaction, RecordParser};
use crate::stats::IdMapping;

/// Reads one directory of interaction files into the interaction matrix.
///
/// Files are processed oldest first and records strictly in order, so that later records win.
/// Historical batches are skipped entirely if the decay factor is zero. After the pass, cells
/// whose absolute weight is below the zero threshold are pruned.
#[derive(Debug, Clone)]
pub struct IngestionTask {
    input_dir: PathBuf,
    batch: Batch,
    decay: DecayConfig,
    delimiter: u8,
}

/// The interactions read by a task, to be merged into a matrix later on.
#[derive(Debug, Clone, PartialEq)]
pub struct Delta {
    interactions: Vec<Interaction>,
    zero_threshold: Option<f32>,
}

impl IngestionTask {

    pub fn new(input_dir: impl Into<PathBuf>, batch: Batch, config: &Config) -> IngestResult<Self> {
        Ok(IngestionTask {
            input_dir: input_dir.into(),
            batch,
            decay: config.model.decay,
            delimiter: config.input.delimiter_byte()?,
        })
    }

    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    pub fn batch(&self) -> Batch {
        self.batch
    }

    /// Past data only matters if it still carries some weight.
    fn should_read(&self) -> bool {
        self.batch == Batch::Inbound || self.decay.factor() > 0.0
    }

    fn zero_threshold(&self) -> Option<f32> {
        let zero_threshold = self.decay.zero_threshold();
        if zero_threshold > 0.0 { Some(zero_threshold) } else { None }
    }

    /// Applies all records of the input directory to `matrix` (and `known`, if given), resolving
    /// inbound ids through `mapping`. On error, everything applied so far stays in place.
    pub fn run(
        &self,
        matrix: &mut DualMatrix,
        mut known: Option<&mut KnownItems>,
        mapping: &mut dyn IdMapping,
    ) -> IngestResult<()> {

        if !self.should_read() {
            info!("Decay factor is 0, ignoring past data in {}", self.input_dir.display());
            return Ok(());
        }

        self.read(mapping, |interaction| {
            let Interaction { row, column, value } = interaction;
            matrix.apply(row, column, value);
            if let Some(known) = known.as_mut() {
                known.apply(row, column, value);
            }
        })?;

        if let Some(zero_threshold) = self.zero_threshold() {
            prune(matrix, known, zero_threshold);
        }

        Ok(())
    }

    /// Reads the input directory like `run` does, but collects the interactions instead of
    /// applying them. If reading fails, the delta still holds everything read before the failure
    /// and does not prune, just like a failed `run` leaves its earlier records unpruned in place.
    pub fn read_delta(&self, mapping: &mut dyn IdMapping) -> (Delta, IngestResult<()>) {

        let mut interactions = Vec::new();

        if !self.should_read() {
            info!("Decay factor is 0, ignoring past data in {}", self.input_dir.display());
            return (Delta { interactions, zero_threshold: None }, Ok(()));
        }

        let result = self.read(mapping, |interaction| interactions.push(interaction));

        let zero_threshold = if result.is_ok() { self.zero_threshold() } else { None };

        (Delta { interactions, zero_threshold }, result)
    }

    fn read<F>(&self, mapping: &mut dyn IdMapping, mut on_interaction: F) -> IngestResult<()>
        where F: FnMut(Interaction) {

        let input_files = io::input_files(&self.input_dir)?;

        if input_files.is_empty() {
            info!("No input files in {}", self.input_dir.display());
            return Ok(());
        }

        let mut parser = RecordParser::new(self.batch, self.decay.factor(), mapping);

        for input_file in input_files.iter() {
            info!("Reading {}", input_file.display());

            let mut reader = io::csv_reader(input_file, self.delimiter)?;
            let mut num_records: u64 = 0;

            for result in reader.records() {
                let record = result
                    .map_err(|source| IngestError::Csv { path: input_file.clone(), source })?;

                let interaction = parser.parse(&record)
                    .map_err(|source| IngestError::Record {
                        path: input_file.clone(),
                        line: record.position().map_or(0, |position| position.line()),
                        source,
                    })?;

                on_interaction(interaction);
                num_records += 1;
            }

            debug!("{} records in {}", num_records, input_file.display());
        }

        Ok(())
    }
}

impl Delta {

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Applies the interactions in the order they were read, then prunes with the zero threshold
    /// of the task that produced the delta.
    pub fn merge_into(self, matrix: &mut DualMatrix, mut known: Option<&mut KnownItems>) {

        for Interaction { row, column, value } in self.interactions.into_iter() {
            matrix.apply(row, column, value);
            if let Some(known) = known.as_mut() {
                known.apply(row, column, value);
            }
        }

        if let Some(zero_threshold) = self.zero_threshold {
            prune(matrix, known, zero_threshold);
        }
    }
}

/// Removes negligible cells from the matrix, and from the known items as well so that a row is
/// only known while it has entries.
pub fn prune(matrix: &mut DualMatrix, known: Option<&mut KnownItems>, zero_threshold: f32) {

    info!("Pruning near-zero entries");

    let pruned = matrix.prune(zero_threshold);

    if let Some(known) = known {
        for &(row, column) in pruned.iter() {
            known.remove(row, column);
        }
    }

    info!("Pruned {} entries below {}", pruned.len(), zero_threshold);
}
