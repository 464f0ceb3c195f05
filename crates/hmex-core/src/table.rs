//! Column-ordered tables and their fixed-width text representation.
//!
//! Files produced here have a single header row followed by right-aligned
//! cells separated by whitespace, with no index column and no delimiter.
//! Numeric cells carry ten decimal places, so a write/read cycle reproduces
//! values to within `1e-9`. Missing values are written as `NaN`.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;

use crate::errors::{ErrorInfo, HmexError};

const DECIMALS: usize = 10;

fn table_error(code: &str, message: impl Into<String>) -> HmexError {
    HmexError::Table(ErrorInfo::new(code, message))
}

/// Values held by one column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    /// Floating point cells.
    Numeric(Vec<f64>),
    /// Free-form text cells (no whitespace).
    Labels(Vec<String>),
}

impl ColumnData {
    /// Number of cells in the column.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(values) => values.len(),
            ColumnData::Labels(values) => values.len(),
        }
    }

    /// True when the column holds no cells.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric cells, if this is a numeric column.
    pub fn as_numeric(&self) -> Option<&[f64]> {
        match self {
            ColumnData::Numeric(values) => Some(values),
            ColumnData::Labels(_) => None,
        }
    }

    fn cell(&self, row: usize) -> String {
        match self {
            ColumnData::Numeric(values) => format_cell(values[row]),
            ColumnData::Labels(values) => values[row].clone(),
        }
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(values: Vec<f64>) -> Self {
        ColumnData::Numeric(values)
    }
}

impl From<Vec<String>> for ColumnData {
    fn from(values: Vec<String>) -> Self {
        ColumnData::Labels(values)
    }
}

/// Ordered set of equally long named columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, ColumnData>,
}

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows (zero for a table without columns).
    pub fn n_rows(&self) -> usize {
        self.columns.values().next().map_or(0, ColumnData::len)
    }

    /// Number of columns, axis columns included.
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Columns in insertion order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnData)> {
        self.columns.iter().map(|(name, data)| (name.as_str(), data))
    }

    /// True when a column with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Looks up a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnData> {
        self.columns.get(name)
    }

    /// Looks up a numeric column, failing when it is absent or holds labels.
    pub fn numeric(&self, name: &str) -> Result<&[f64], HmexError> {
        match self.columns.get(name) {
            Some(ColumnData::Numeric(values)) => Ok(values),
            Some(ColumnData::Labels(_)) => Err(HmexError::Table(
                ErrorInfo::new("column_not_numeric", "column holds labels")
                    .with_context("column", name),
            )),
            None => Err(HmexError::Table(
                ErrorInfo::new("column_missing", "column not present in table")
                    .with_context("column", name),
            )),
        }
    }

    /// Numeric columns other than `axis`, in order.
    pub fn data_columns<'a>(&'a self, axis: &'a str) -> impl Iterator<Item = (&'a str, &'a [f64])> {
        self.columns.iter().filter_map(move |(name, data)| {
            if name == axis {
                return None;
            }
            data.as_numeric().map(|values| (name.as_str(), values))
        })
    }

    /// Appends a column.
    ///
    /// Fails on empty, whitespace-bearing or duplicate names, on labels
    /// containing whitespace, and when the length differs from existing columns.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        data: impl Into<ColumnData>,
    ) -> Result<(), HmexError> {
        let name = name.into();
        let data = data.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(HmexError::Table(
                ErrorInfo::new("column_name", "column names must be non-empty without whitespace")
                    .with_context("column", name),
            ));
        }
        if self.columns.contains_key(&name) {
            return Err(HmexError::Table(
                ErrorInfo::new("column_duplicate", "column already present")
                    .with_context("column", name),
            ));
        }
        if let ColumnData::Labels(labels) = &data {
            if labels
                .iter()
                .any(|label| label.is_empty() || label.chars().any(char::is_whitespace))
            {
                return Err(HmexError::Table(
                    ErrorInfo::new("label_whitespace", "label cells must be non-empty without whitespace")
                        .with_context("column", name),
                ));
            }
        }
        if !self.columns.is_empty() && data.len() != self.n_rows() {
            return Err(HmexError::Table(
                ErrorInfo::new("ragged_column", "column length differs from table row count")
                    .with_context("column", name)
                    .with_context("expected", self.n_rows().to_string())
                    .with_context("found", data.len().to_string()),
            ));
        }
        self.columns.insert(name, data);
        Ok(())
    }

    /// Renders the table in the fixed-width text format.
    pub fn to_fixed_width(&self) -> String {
        let n_rows = self.n_rows();
        let rendered: Vec<(String, Vec<String>)> = self
            .columns
            .iter()
            .map(|(name, data)| (name.clone(), (0..n_rows).map(|row| data.cell(row)).collect()))
            .collect();
        let widths: Vec<usize> = rendered
            .iter()
            .map(|(name, cells)| {
                cells
                    .iter()
                    .map(String::len)
                    .chain(std::iter::once(name.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let header: Vec<String> = rendered
            .iter()
            .zip(&widths)
            .map(|((name, _), &width)| format!("{name:>width$}"))
            .collect();
        out.push_str(&header.join(" "));
        out.push('\n');
        for row in 0..n_rows {
            let line: Vec<String> = rendered
                .iter()
                .zip(&widths)
                .map(|((_, cells), &width)| format!("{:>width$}", cells[row]))
                .collect();
            out.push_str(&line.join(" "));
            out.push('\n');
        }
        out
    }

    /// Parses the fixed-width text format.
    ///
    /// A column whose cells all parse as floats becomes numeric, otherwise it
    /// is kept as labels.
    pub fn parse_fixed_width(text: &str) -> Result<Self, HmexError> {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());
        let Some(header_line) = lines.next() else {
            return Err(table_error("empty_table", "table text has no header row"));
        };
        let header: Vec<&str> = header_line.split_whitespace().collect();
        let mut cells: Vec<Vec<&str>> = vec![Vec::new(); header.len()];
        for (line_idx, line) in lines.enumerate() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() != header.len() {
                return Err(HmexError::Table(
                    ErrorInfo::new("row_width", "row has a different number of cells than the header")
                        .with_context("row", (line_idx + 1).to_string())
                        .with_context("expected", header.len().to_string())
                        .with_context("found", tokens.len().to_string()),
                ));
            }
            for (column, token) in cells.iter_mut().zip(tokens) {
                column.push(token);
            }
        }

        let mut table = Table::new();
        for (name, raw) in header.into_iter().zip(cells) {
            let parsed: Result<Vec<f64>, _> = raw.iter().map(|cell| cell.parse::<f64>()).collect();
            match parsed {
                Ok(values) => table.push_column(name, values)?,
                Err(_) => table.push_column(
                    name,
                    raw.into_iter().map(str::to_string).collect::<Vec<String>>(),
                )?,
            }
        }
        Ok(table)
    }

    /// Writes the table to `path`, creating parent directories.
    pub fn write(&self, path: &Path) -> Result<(), HmexError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| HmexError::io("table_dir", parent, err))?;
        }
        fs::write(path, self.to_fixed_width()).map_err(|err| HmexError::io("table_write", path, err))
    }

    /// Reads a table from `path`; an absent file is a missing-input error.
    pub fn read(path: &Path) -> Result<Self, HmexError> {
        if !path.exists() {
            return Err(HmexError::missing("table_missing", path));
        }
        let text = fs::read_to_string(path).map_err(|err| HmexError::io("table_read", path, err))?;
        Table::parse_fixed_width(&text).map_err(|err| match err {
            HmexError::Table(info) => HmexError::Table(info.with_path(path)),
            other => other,
        })
    }
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:.*}", DECIMALS, value)
    }
}
