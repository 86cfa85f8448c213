// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fs::File;
use std::path::Path;

use polars::prelude::*;

use crate::constant::SUPPORTED_TABLE_FORMATS;
use crate::error::RoiFerryError;

/// A source image and the target image its ROIs are copied to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePair {
    pub source_id: i64,
    pub target_id: i64,
}

/// Read a table from a CSV or TSV file
///
/// # Arguments
///
/// * `path` - A path to a delimited file with a header row
/// * `separator` - Field separator (e.g. b',' or b'\t')
pub fn read_table_csv<P: AsRef<Path>>(path: P, separator: u8) -> Result<DataFrame, RoiFerryError> {
    if !path.as_ref().is_file() {
        return Err(RoiFerryError::NoFileError(
            path.as_ref().display().to_string(),
        ));
    }

    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|options| options.with_separator(separator))
        .try_into_reader_with_file_path(Some(path.as_ref().to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|err| RoiFerryError::TableReadError(err.to_string()))
}

/// Read a table from a parquet file
pub fn read_table_pq<P: AsRef<Path>>(path: P) -> Result<DataFrame, RoiFerryError> {
    let file = File::open(&path)
        .map_err(|_| RoiFerryError::NoFileError(path.as_ref().display().to_string()))?;

    ParquetReader::new(file)
        .finish()
        .map_err(|err| RoiFerryError::TableReadError(err.to_string()))
}

/// Read a table from disk based on its extension
///
/// # Examples
///
/// ```no_run
/// use roiferry_core::io::read_table;
///
/// let df = read_table("pairs.csv").unwrap();
/// ```
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<DataFrame, RoiFerryError> {
    let extension = path
        .as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    if let Some(ext) = extension {
        match ext.as_str() {
            "csv" => read_table_csv(path, b','),
            "tsv" => read_table_csv(path, b'\t'),
            "txt" => read_table_csv(path, b'\t'),
            "parquet" => read_table_pq(path),
            "pq" => read_table_pq(path),
            _ => Err(RoiFerryError::TableReadError(format!(
                "Invalid extension {}. Must be one of: {:?}",
                ext, SUPPORTED_TABLE_FORMATS
            ))),
        }
    } else {
        Err(RoiFerryError::TableReadError(
            "Provided table path has an invalid extension. Must be one of: csv, tsv, txt, parquet, or pq.".to_string()
        ))
    }
}

fn id_column(df: &DataFrame, name: &str) -> Result<Vec<i64>, RoiFerryError> {
    let column = df
        .column(name)
        .map_err(|_| RoiFerryError::TableColumnError(format!("Column '{}' not found", name)))?;

    if !column.dtype().is_integer() {
        return Err(RoiFerryError::TableColumnError(format!(
            "'{}' must hold integer ids but has type {}",
            name,
            column.dtype()
        )));
    }

    let series = column
        .as_materialized_series()
        .cast(&DataType::Int64)
        .map_err(|err| RoiFerryError::TableColumnError(format!("'{}': {}", name, err)))?;

    let ids = series
        .i64()
        .map_err(|err| RoiFerryError::TableColumnError(format!("'{}': {}", name, err)))?;

    ids.into_iter()
        .enumerate()
        .map(|(row, id)| {
            id.ok_or_else(|| {
                RoiFerryError::TableColumnError(format!(
                    "'{}' has a missing id in row {}",
                    name,
                    row + 1
                ))
            })
        })
        .collect()
}

/// Read ordered image pairs from a table
///
/// # Arguments
///
/// * `path` - A csv, tsv, txt, parquet or pq table
/// * `source_column` - Column holding source image ids
/// * `target_column` - Column holding target image ids
///
/// # Examples
///
/// ```no_run
/// use roiferry_core::io::read_image_pairs;
///
/// let pairs = read_image_pairs("pairs.csv", "omero_id_1", "omero_id_2").unwrap();
/// ```
pub fn read_image_pairs<P: AsRef<Path>>(
    path: P,
    source_column: &str,
    target_column: &str,
) -> Result<Vec<ImagePair>, RoiFerryError> {
    let df = read_table(path)?;

    let sources = id_column(&df, source_column)?;
    let targets = id_column(&df, target_column)?;

    Ok(sources
        .into_iter()
        .zip(targets)
        .map(|(source_id, target_id)| ImagePair {
            source_id,
            target_id,
        })
        .collect())
}
