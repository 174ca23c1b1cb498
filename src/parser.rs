//! Reading sample tables from delimited text.
//!
//! Calibration recordings are plain text, one sample per line. Fields are
//! separated by a configurable delimiter; runs of spaces or tabs always
//! separate fields too, so space-aligned and comma-separated files both
//! load with the defaults adjusted only for the delimiter.
//!
//! The data block ends at the first empty line. Anything after it (logger
//! trailers, summaries) is ignored with a warning.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use nalgebra::DMatrix;
use tracing::{debug, info, warn};

use crate::error::{IdentError, Result};
use crate::sample::SampleTable;

/// Layout options for delimited sample files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Field delimiter in addition to whitespace.
    pub delimiter: u8,
    /// Number of leading lines to skip (titles, column names).
    pub header_lines: usize,
    /// Zero-based columns to drop before interpretation, e.g. a timestamp.
    pub skip_columns: Vec<usize>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b' ',
            header_lines: 0,
            skip_columns: Vec::new(),
        }
    }
}

impl ReaderOptions {
    /// Set the field delimiter.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the number of header lines.
    #[must_use]
    pub const fn with_header_lines(mut self, lines: usize) -> Self {
        self.header_lines = lines;
        self
    }

    /// Set the columns to drop.
    #[must_use]
    pub fn with_skip_columns(mut self, columns: impl Into<Vec<usize>>) -> Self {
        self.skip_columns = columns.into();
        self
    }
}

/// Reader turning delimited text into a numeric matrix.
#[derive(Debug, Clone, Default)]
pub struct TableReader {
    options: ReaderOptions,
}

impl TableReader {
    /// Create a reader with the given layout options.
    #[must_use]
    pub const fn new(options: ReaderOptions) -> Self {
        Self { options }
    }

    /// Layout options in use.
    #[must_use]
    pub const fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Read the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, or for any reason
    /// listed in [`TableReader::read`].
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<DMatrix<f64>> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading sample file");
        self.read(File::open(path)?)
    }

    /// Read from an in-memory string.
    ///
    /// # Errors
    ///
    /// See [`TableReader::read`].
    pub fn read_str(&self, text: &str) -> Result<DMatrix<f64>> {
        self.read(text.as_bytes())
    }

    /// Read a numeric matrix from `input`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentError::EmptyInput`] if no data rows remain,
    /// [`IdentError::Parse`] for a non-numeric field, [`IdentError::RaggedRow`]
    /// if rows differ in width, and [`IdentError::InvalidInput`] if the first row
    /// holds a single column (usually a wrong delimiter).
    pub fn read<R: Read>(&self, mut input: R) -> Result<DMatrix<f64>> {
        let mut text = String::new();
        input.read_to_string(&mut text)?;

        let mut lines = text.lines().skip(self.options.header_lines);
        let block: Vec<&str> = lines
            .by_ref()
            .take_while(|line| !line.trim().is_empty())
            .collect();
        let trailing = lines.filter(|line| !line.trim().is_empty()).count();
        if trailing > 0 {
            warn!(
                ignored_lines = trailing,
                "Data block ended at an empty line; remaining lines ignored"
            );
        }
        if block.is_empty() {
            return Err(IdentError::EmptyInput);
        }

        let content = block.join("\n");
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .delimiter(self.options.delimiter)
            .from_reader(content.as_bytes());

        let mut values: Vec<f64> = Vec::new();
        let mut n_cols: Option<usize> = None;
        let mut n_rows = 0;

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            let line = self.options.header_lines + index + 1;
            let tokens: Vec<&str> = record.iter().flat_map(str::split_whitespace).collect();
            if n_cols.is_none() && tokens.len() == 1 {
                return Err(IdentError::invalid_input(format!(
                    "only one column detected; check the delimiter ({:?})",
                    char::from(self.options.delimiter)
                )));
            }
            let row = self.parse_tokens(&tokens, line)?;

            let expected = *n_cols.get_or_insert(row.len());
            if row.len() != expected {
                return Err(IdentError::RaggedRow {
                    line,
                    expected,
                    actual: row.len(),
                });
            }
            values.extend(row);
            n_rows += 1;
        }

        let n_cols = n_cols.unwrap_or(0);
        if n_rows == 0 || n_cols == 0 {
            return Err(IdentError::EmptyInput);
        }
        info!(rows = n_rows, columns = n_cols, "Sample table read");
        Ok(DMatrix::from_row_slice(n_rows, n_cols, &values))
    }

    fn parse_tokens(&self, tokens: &[&str], line: usize) -> Result<Vec<f64>> {
        tokens
            .iter()
            .enumerate()
            .filter(|(column, _)| !self.options.skip_columns.contains(column))
            .map(|(column, token)| {
                token
                    .parse::<f64>()
                    .map_err(|_| IdentError::parse(line, column + 1, *token))
            })
            .collect()
    }
}

/// Read a sample table for an `n_joints` chain from `path`.
///
/// # Errors
///
/// Returns any reading error from [`TableReader::read_path`] or validation
/// error from [`SampleTable::new`].
pub fn load_samples(
    path: impl AsRef<Path>,
    n_joints: usize,
    options: &ReaderOptions,
) -> Result<SampleTable> {
    let data = TableReader::new(options.clone()).read_path(path)?;
    SampleTable::new(data, n_joints)
}
