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

use csv::StringRecord;

use crate::error::RecordError;
use crate::stats::IdMapping;
use crate::types::Id;

/// What a single record does to its cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Accumulate(f32),
    Remove,
}

/// Inbound data is the current batch and uses the original string ids. Historical data was
/// written by an earlier run, uses numeric ids and is down-weighted by the decay factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Batch {
    Inbound,
    Historical,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub row: Id,
    pub column: Id,
    pub value: Value,
}

/// Turns decoded records of one batch into interactions.
pub struct RecordParser<'a> {
    batch: Batch,
    decay_factor: f32,
    mapping: &'a mut dyn IdMapping,
}

impl<'a> RecordParser<'a> {

    pub fn new(batch: Batch, decay_factor: f32, mapping: &'a mut dyn IdMapping) -> Self {
        RecordParser { batch, decay_factor, mapping }
    }

    /// Expects `row, column[, value]`, further fields are ignored. A missing value counts as a
    /// single interaction (1.0), an empty one removes the cell.
    pub fn parse(&mut self, record: &StringRecord) -> Result<Interaction, RecordError> {

        if record.len() < 2 {
            return Err(RecordError::TooFewFields(record.len()));
        }

        let row = self.resolve(&record[0])?;
        let column = self.resolve(&record[1])?;

        let value = match record.get(2) {
            None => Value::Accumulate(1.0),
            Some("") => Value::Remove,
            Some(token) => Value::Accumulate(parse_weight(token)?),
        };

        let value = match (self.batch, value) {
            (Batch::Historical, Value::Accumulate(weight)) =>
                Value::Accumulate(weight * self.decay_factor),
            (_, value) => value,
        };

        Ok(Interaction { row, column, value })
    }

    fn resolve(&mut self, token: &str) -> Result<Id, RecordError> {
        match self.batch {
            Batch::Inbound => Ok(self.mapping.add(token)),
            Batch::Historical => token.parse::<Id>()
                .map_err(|_| RecordError::InvalidId(token.to_owned())),
        }
    }
}

/// Surrounding whitespace is tolerated, a blank token is not a number.
fn parse_weight(token: &str) -> Result<f32, RecordError> {
    match token.trim().parse::<f32>() {
        Ok(weight) if weight.is_finite() => Ok(weight),
        _ => Err(RecordError::InvalidValue(token.to_owned())),
    }
}
