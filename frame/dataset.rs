//! # Dataset Loading and Column Classification
//!
//! This module is the exclusive entry point for user-provided data. It reads
//! a comma-delimited CSV file (header row required, UTF-8) into a polars
//! `DataFrame` and classifies its columns so the rest of the application can
//! offer valid target/feature/grouping choices.
//!
//! - Row-index handling: spreadsheet exports frequently carry an unnamed
//!   leading column holding the row number. If the raw first header cell is
//!   empty or starts with `Unnamed`, that column is treated as a row index
//!   and dropped from the data columns. The heuristic is deliberately narrow;
//!   a named index column anywhere else is left alone.
//! - User-centric errors: failures are assumed to be user-input errors and
//!   `DataError` is worded to be actionable.

use polars::prelude::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

/// Text columns with more distinct values than this are not offered as
/// grouping variables.
pub const MAX_CATEGORY_LEVELS: usize = 15;

/// A loaded table. Immutable after construction; every later stage borrows it.
#[derive(Debug)]
pub struct Dataset {
    df: DataFrame,
}

/// A comprehensive error type for data loading failures.
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Error from the underlying Polars DataFrame library: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("The input file '{0}' contains a header but no data rows.")]
    EmptyTable(String),
    #[error("The column '{0}' was not found in the dataset.")]
    ColumnNotFound(String),
    #[error("The column '{0}' is not numeric.")]
    ColumnNotNumeric(String),
}

impl Dataset {
    /// Loads a dataset from a CSV file.
    ///
    /// The raw first header cell is sniffed before parsing: if it is empty or
    /// begins with `Unnamed`, the first column is a row index and is excluded
    /// from the data columns.
    pub fn from_csv(path: &Path) -> Result<Self, DataError> {
        let drop_index = sniff_index_column(path)?;

        let mut df = CsvReader::new(File::open(path)?)
            .with_options(
                CsvReadOptions::default()
                    .with_has_header(true)
                    .with_parse_options(CsvParseOptions::default().with_separator(b',')),
            )
            .finish()?;

        if drop_index {
            let first = df
                .get_column_names()
                .first()
                .map(|name| name.to_string())
                .unwrap_or_default();
            log::info!("Dropping row-index column '{first}'");
            df = df.drop(&first)?;
        }

        if df.height() == 0 {
            return Err(DataError::EmptyTable(path.display().to_string()));
        }

        log::info!(
            "Loaded {} rows x {} columns from '{}'",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(Self { df })
    }

    /// Wraps an already-built frame. Used by tests and the summary helpers.
    pub fn from_frame(df: DataFrame) -> Result<Self, DataError> {
        if df.height() == 0 {
            return Err(DataError::EmptyTable("<in-memory frame>".to_string()));
        }
        Ok(Self { df })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    /// First `n` rows, for the preview the shell prints after loading.
    pub fn preview(&self, n: usize) -> DataFrame {
        self.df.head(Some(n))
    }

    pub fn column_names(&self) -> Vec<String> {
        self.df
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.df.get_column_names().iter().any(|c| c.as_str() == name)
    }

    /// The ordered list of columns with a numeric dtype. These are the valid
    /// targets, and the default feature set.
    pub fn numeric_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|col| is_numeric_dtype(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// The ordered list of text columns with at most [`MAX_CATEGORY_LEVELS`]
    /// distinct non-null values. These are the valid grouping variables.
    pub fn category_columns(&self) -> Vec<String> {
        self.df
            .get_columns()
            .iter()
            .filter(|col| {
                col.dtype() == &DataType::String
                    && distinct_string_count(col) <= MAX_CATEGORY_LEVELS
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        self.df
            .column(name)
            .map(|col| is_numeric_dtype(col.dtype()))
            .unwrap_or(false)
    }
}

pub(crate) fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

/// Extracts a column as `f64` values, preserving nulls.
pub(crate) fn numeric_column_values(
    df: &DataFrame,
    name: &str,
) -> Result<Vec<Option<f64>>, DataError> {
    let column = df
        .column(name)
        .map_err(|_| DataError::ColumnNotFound(name.to_string()))?;
    if !is_numeric_dtype(column.dtype()) {
        return Err(DataError::ColumnNotNumeric(name.to_string()));
    }
    let casted = column
        .cast(&DataType::Float64)
        .map_err(|_| DataError::ColumnNotNumeric(name.to_string()))?;
    let chunked = casted.f64()?.rechunk();
    Ok((0..chunked.len()).map(|i| chunked.get(i)).collect())
}

/// Extracts a column as strings, preserving nulls. Numeric columns are
/// rendered through their display form so mixed selections still work.
pub(crate) fn string_column_values(
    df: &DataFrame,
    name: &str,
) -> Result<Vec<Option<String>>, DataError> {
    let column = df
        .column(name)
        .map_err(|_| DataError::ColumnNotFound(name.to_string()))?;
    if column.dtype() == &DataType::String {
        let chunked = column.str()?.rechunk();
        return Ok((0..chunked.len())
            .map(|i| chunked.get(i).map(|s| s.to_string()))
            .collect());
    }
    let casted = column.cast(&DataType::String)?;
    let chunked = casted.str()?.rechunk();
    Ok((0..chunked.len())
        .map(|i| chunked.get(i).map(|s| s.to_string()))
        .collect())
}

fn distinct_string_count(column: &Column) -> usize {
    let mut seen: HashSet<&str> = HashSet::new();
    if let Ok(chunked) = column.str() {
        for i in 0..chunked.len() {
            if let Some(value) = chunked.get(i) {
                seen.insert(value);
            }
        }
    }
    seen.len()
}

/// Reads the raw first header cell and applies the row-index heuristic.
fn sniff_index_column(path: &Path) -> Result<bool, DataError> {
    let mut header = String::new();
    BufReader::new(File::open(path)?).read_line(&mut header)?;
    let first_cell = header
        .trim_end_matches(['\r', '\n'])
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches('"');
    Ok(first_cell.is_empty() || first_cell.starts_with("Unnamed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Write};
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> io::Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "{}", content)?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn loads_plain_csv() {
        let file = create_test_csv("size,city,price\n120,A,300\n80,B,150").unwrap();
        let data = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(data.height(), 2);
        assert_eq!(data.column_names(), vec!["size", "city", "price"]);
    }

    #[test]
    fn drops_unnamed_index_column() {
        let file = create_test_csv("Unnamed: 0,size,price\n0,120,300\n1,80,150").unwrap();
        let data = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(data.column_names(), vec!["size", "price"]);
    }

    #[test]
    fn drops_empty_header_index_column() {
        let file = create_test_csv(",size,price\n0,120,300\n1,80,150").unwrap();
        let data = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(data.column_names(), vec!["size", "price"]);
    }

    #[test]
    fn keeps_named_first_column() {
        let file = create_test_csv("id,size,price\n7,120,300\n9,80,150").unwrap();
        let data = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(data.column_names(), vec!["id", "size", "price"]);
    }

    #[test]
    fn empty_table_is_an_error() {
        let file = create_test_csv("size,price").unwrap();
        let err = Dataset::from_csv(file.path()).unwrap_err();
        assert!(matches!(err, DataError::EmptyTable(_)));
    }

    #[test]
    fn numeric_columns_are_exactly_the_numeric_ones() {
        let file =
            create_test_csv("size,city,price\n120,A,300.5\n80,B,150.0\n95,A,210.0").unwrap();
        let data = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(data.numeric_columns(), vec!["size", "price"]);
        assert_eq!(data.category_columns(), vec!["city"]);
    }

    #[test]
    fn category_limit_is_fifteen_levels() {
        let mut rows = vec!["wide,narrow,y".to_string()];
        for i in 0..16 {
            // "wide" takes 16 distinct values, "narrow" repeats one of 15.
            rows.push(format!("w{i},n{},1.0", i % 15));
        }
        let file = create_test_csv(&rows.join("\n")).unwrap();
        let data = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(data.category_columns(), vec!["narrow"]);
    }

    #[test]
    fn numeric_extraction_preserves_nulls() {
        let file = create_test_csv("a,b\n1.5,x\n,y\n3.0,z").unwrap();
        let data = Dataset::from_csv(file.path()).unwrap();
        let values = numeric_column_values(data.frame(), "a").unwrap();
        assert_eq!(values, vec![Some(1.5), None, Some(3.0)]);
        let err = numeric_column_values(data.frame(), "b").unwrap_err();
        assert!(matches!(err, DataError::ColumnNotNumeric(_)));
    }
}
