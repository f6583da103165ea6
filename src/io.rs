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

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use flate2::read::GzDecoder;
use fnv::FnvHashMap;
use serde_derive::Serialize;
use tracing::info;

use crate::error::{IngestError, IngestResult};
use crate::known::KnownItems;
use crate::matrix::DualMatrix;
use crate::stats::StringIdMapping;
use crate::types::Id;

/// Lists the input files of a directory, oldest first, so that later files override what earlier
/// files did to the same cell. Hidden files and marker files (starting with `_`) are skipped, as
/// are subdirectories. Files with the same modification time are ordered by name. A directory
/// that does not exist simply has no input files.
pub fn input_files(dir: &Path) -> IngestResult<Vec<PathBuf>> {

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(ref e) if e.kind() == io::ErrorKind::NotFound => {
            info!("Input directory {} does not exist", dir.display());
            return Ok(Vec::new());
        },
        Err(source) => return Err(IngestError::Io { path: dir.to_path_buf(), source }),
    };

    let as_ingest_error = |source| IngestError::Io { path: dir.to_path_buf(), source };

    let mut files: Vec<(SystemTime, PathBuf)> = Vec::new();

    for entry in entries {
        let entry = entry.map_err(as_ingest_error)?;

        if is_hidden(&entry.file_name().to_string_lossy()) {
            continue;
        }

        let metadata = fs::metadata(entry.path()).map_err(as_ingest_error)?;
        if !metadata.is_file() {
            continue;
        }

        let last_modified = metadata.modified().map_err(as_ingest_error)?;
        files.push((last_modified, entry.path()));
    }

    files.sort();

    Ok(files.into_iter().map(|(_, path)| path).collect())
}

fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with('.') || file_name.starts_with('_')
}

/// Reads delimited records without headers. Records may have different numbers of fields, gzipped
/// files (ending in `.gz`) are decompressed on the fly.
pub fn csv_reader(path: &Path, delimiter: u8) -> IngestResult<csv::Reader<Box<dyn Read>>> {

    let file = File::open(path)
        .map_err(|source| IngestError::Io { path: path.to_path_buf(), source })?;

    let input: Box<dyn Read> = if path.extension().map_or(false, |extension| extension == "gz") {
        Box::new(GzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(file)
    };

    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(input);

    Ok(reader)
}

/// Struct used for JSON serialization of a matrix row. Field names will be used in JSON.
#[derive(Serialize)]
struct MatrixRow<'a> {
    row: Cow<'a, str>,
    weights: FnvHashMap<Cow<'a, str>, f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    known_items: Option<Vec<Cow<'a, str>>>,
}

/// Output the rows of the matrix in JSON format, one row per line, using the original identifiers
/// wherever the mapping knows them. Rows are written in ascending id order. If an `output_path`
/// is supplied, we write to a file at the specified path, otherwise, we output to stdout.
pub fn write_matrix(
    matrix: &DualMatrix,
    known: Option<&KnownItems>,
    mapping: &StringIdMapping,
    output_path: Option<String>,
) -> IngestResult<()> {

    let target = output_path.clone().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("-"));
    let as_ingest_error = |source| IngestError::Io { path: target.clone(), source };

    let mut out: Box<dyn Write> = match output_path {
        Some(path) => Box::new(BufWriter::new(File::create(&path).map_err(as_ingest_error)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let mut row_ids: Vec<Id> = matrix.rows().map(|(row, _)| *row).collect();
    row_ids.sort();

    for row_id in row_ids {

        let weights: FnvHashMap<Cow<str>, f32> = match matrix.row(row_id) {
            Some(entries) => entries.iter()
                .map(|(column, weight)| (mapping.name_or_id(*column), *weight))
                .collect(),
            None => FnvHashMap::default(),
        };

        let known_items = known.map(|known| {
            let mut columns: Vec<Id> = match known.get(row_id) {
                Some(columns) => columns.iter().cloned().collect(),
                None => Vec::new(),
            };
            columns.sort();
            columns.into_iter().map(|column| mapping.name_or_id(column)).collect()
        });

        let row = MatrixRow { row: mapping.name_or_id(row_id), weights, known_items };

        serde_json::to_writer(&mut out, &row)
            .map_err(|e| as_ingest_error(io::Error::from(e)))?;
        writeln!(out).map_err(as_ingest_error)?;
    }

    out.flush().map_err(as_ingest_error)?;

    Ok(())
}
