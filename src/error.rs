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

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type IngestResult<T> = Result<T, IngestError>;

/// Everything that can abort an ingestion pass. There is no partial-success reporting, the
/// first error wins and whatever was applied to the matrix before it stays applied.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unable to parse configuration: {0}")]
    ConfigFormat(#[from] serde_json::Error),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Reading {0} did not complete")]
    Aborted(PathBuf),

    #[error("Bad record in {path} at line {line}: {source}")]
    Record {
        path: PathBuf,
        line: u64,
        #[source]
        source: RecordError,
    },
}

/// Problems with a single decoded line.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("expected at least 2 fields, found {0}")]
    TooFewFields(usize),

    #[error("not a numeric id: {0:?}")]
    InvalidId(String),

    #[error("not a finite number: {0:?}")]
    InvalidValue(String),
}
