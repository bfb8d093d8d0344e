use std::fmt;
use std::io::Read;

use log::debug;

use crate::input::{has_suffix_ignore_case, NamedInput};

/// Join key columns, in key order.
pub const KEY_COLUMNS: [&str; 3] = ["seqname", "start", "end"];

/// One row of the known-intron reference list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownIntron {
    pub seqname: String,
    pub start: i64,
    pub end: i64,
    /// Every field of the row as read, aligned with the table columns.
    pub fields: Vec<String>,
}

/// The known-intron reference list.
///
/// Needs the columns `seqname`, `start` and `end`; any other column is kept
/// and passed through to the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownIntronTable {
    pub columns: Vec<String>,
    pub rows: Vec<KnownIntron>,
    key_idx: [usize; 3],
}

/// Errors while reading the reference list.
#[derive(Debug)]
pub enum TableError {
    Csv(csv::Error),
    MissingColumn { column: &'static str },
    BadCoordinate { line: u64, column: &'static str, value: String },
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::Csv(e) => write!(f, "Could not read known-intron table: {}", e),
            TableError::MissingColumn { column } => {
                write!(f, "Known-intron table has no '{}' column", column)
            }
            TableError::BadCoordinate {
                line,
                column,
                value,
            } => write!(
                f,
                "Known-intron table line {}: '{}' is not an integer in column '{}'",
                line, value, column
            ),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Csv(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for TableError {
    fn from(e: csv::Error) -> Self {
        TableError::Csv(e)
    }
}

impl KnownIntronTable {
    /// Tab for a `.tsv` name (also `.tsv.gz`), comma otherwise.
    pub fn delimiter_for(input: &NamedInput) -> u8 {
        if has_suffix_ignore_case(input.stem(), ".tsv") {
            b'\t'
        } else {
            b','
        }
    }

    /// Read an in-memory input, picking gzip and delimiter from its name.
    pub fn from_input(input: &NamedInput) -> Result<Self, TableError> {
        Self::from_reader(input.reader(), Self::delimiter_for(input))
    }

    /// Read a delimited table with a header row.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, TableError> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();

        let mut key_idx = [0usize; 3];
        for (slot, name) in key_idx.iter_mut().zip(KEY_COLUMNS) {
            *slot = columns
                .iter()
                .position(|c| c == name)
                .ok_or(TableError::MissingColumn { column: name })?;
        }

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);

            let coord = |i: usize| -> Result<i64, TableError> {
                let raw = record.get(key_idx[i]).unwrap_or("");
                raw.trim().parse().map_err(|_| TableError::BadCoordinate {
                    line,
                    column: KEY_COLUMNS[i],
                    value: raw.to_string(),
                })
            };

            rows.push(KnownIntron {
                seqname: record.get(key_idx[0]).unwrap_or("").to_string(),
                start: coord(1)?,
                end: coord(2)?,
                fields: record.iter().map(str::to_string).collect(),
            });
        }

        debug!("loaded {} known introns ({} columns)", rows.len(), columns.len());

        Ok(Self {
            columns,
            rows,
            key_idx,
        })
    }

    /// Positions of `seqname`, `start`, `end` in [`Self::columns`].
    pub fn key_indices(&self) -> [usize; 3] {
        self.key_idx
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
