use std::io::BufRead;

use crate::annotation::attributes::{parse_attributes, Attributes};
use crate::types::{Interval, Strand};

/// A single parsed record line from a GTF annotation.
///
/// Coordinates are kept as written: 1-based, closed.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub line_no: usize,        // 1-based line in the input
    pub seqname: String,       // chromosome / contig
    pub source: String,        // column 2
    pub feature: String,       // column 3
    pub start: i64,            // 1-based start
    pub end: i64,              // 1-based end (inclusive)
    pub score: Option<String>, // '.' => None
    pub strand: Strand,        // + / -, anything else is Unknown
    pub frame: Option<String>, // '.' => None
    pub attribute: String,     // raw column 9
}

impl AnnotationRecord {
    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    pub fn is_feature(&self, feature: &str) -> bool {
        self.feature == feature
    }

    /// Decode the attribute column.
    pub fn attributes(&self) -> Attributes {
        parse_attributes(&self.attribute)
    }
}

/// Parsing errors for annotation input.
#[derive(Debug)]
pub enum ParseError {
    IoPath { path: String, source: std::io::Error },
    MalformedLine { line_no: usize, problem: String, line: String },
    BadCoordinates { line_no: usize, line: String },
    MalformedAttribute { line_no: usize, segment: String },
}

impl ParseError {
    /// Line the error was found on, if it is tied to one.
    pub fn line_no(&self) -> Option<usize> {
        match self {
            ParseError::IoPath { .. } => None,
            ParseError::MalformedLine { line_no, .. }
            | ParseError::BadCoordinates { line_no, .. }
            | ParseError::MalformedAttribute { line_no, .. } => Some(*line_no),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::IoPath { path, source } => {
                write!(f, "I/O error while reading '{}': {}", path, source)
            }
            ParseError::MalformedLine { line_no, problem, line } => {
                write!(f, "Malformed GTF line {}: {}: {}", line_no, problem, preview(line))
            }
            ParseError::BadCoordinates { line_no, line } => {
                write!(f, "Bad coordinates in line {}: {}", line_no, preview(line))
            }
            ParseError::MalformedAttribute { line_no, segment } => {
                write!(
                    f,
                    "Malformed attribute in line {}: '{}' has no key/value separator",
                    line_no, segment
                )
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::IoPath { source, .. } => Some(source),
            _ => None,
        }
    }
}

const PREVIEW_CHARS: usize = 80;

fn preview(line: &str) -> String {
    if line.chars().count() <= PREVIEW_CHARS {
        line.to_string()
    } else {
        let mut s: String = line.chars().take(PREVIEW_CHARS).collect();
        s.push_str("...");
        s
    }
}

/// Streaming parser for GTF files.
///
/// Most callers go through [`crate::annotation::AnnotationLoader`], which
/// applies the line error policy and handles gzip.
///
/// # Example
/// ```
/// use std::io::Cursor;
/// use brain_intron_filter::annotation::AnnotationReader;
///
/// let gtf = "#header\nchr1\tsrc\texon\t1\t100\t.\t+\t.\ttranscript_id \"T1\";\n";
/// let recs: Vec<_> = AnnotationReader::new(Cursor::new(gtf.as_bytes()))
///     .records()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(recs.len(), 1);
/// assert_eq!(recs[0].line_no, 2);
/// ```
pub struct AnnotationReader<R: BufRead> {
    reader: R,
    buf: String,
    line_no: usize,
    failed: bool,
}

impl<R: BufRead> AnnotationReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: String::new(),
            line_no: 0,
            failed: false,
        }
    }

    /// Returns an iterator over parsed records.
    ///
    /// - Skips blank lines
    /// - Skips comment lines starting with '#'
    /// - Stops after the first I/O error
    pub fn records(mut self) -> impl Iterator<Item = Result<AnnotationRecord, ParseError>> {
        std::iter::from_fn(move || loop {
            if self.failed {
                return None;
            }

            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => return None,
                Ok(_) => self.line_no += 1,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(ParseError::IoPath {
                        path: "<reader>".to_string(),
                        source: e,
                    }));
                }
            }

            let line = self.buf.trim_end_matches(&['\n', '\r'][..]);
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            return Some(parse_record_line(line, self.line_no));
        })
    }
}

/// Parse a single non-comment line into an `AnnotationRecord`.
pub fn parse_record_line(line: &str, line_no: usize) -> Result<AnnotationRecord, ParseError> {
    // seqname source feature start end score strand frame attribute
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 9 {
        return Err(ParseError::MalformedLine {
            line_no,
            problem: format!("expected 9 tab-separated fields, found {}", fields.len()),
            line: line.to_string(),
        });
    }

    let start: i64 = fields[3].trim().parse().map_err(|_| ParseError::BadCoordinates {
        line_no,
        line: line.to_string(),
    })?;
    let end: i64 = fields[4].trim().parse().map_err(|_| ParseError::BadCoordinates {
        line_no,
        line: line.to_string(),
    })?;

    let strand = Strand::parse(fields[6].trim()).unwrap_or(Strand::Unknown);

    Ok(AnnotationRecord {
        line_no,
        seqname: fields[0].to_string(),
        source: fields[1].to_string(),
        feature: fields[2].to_string(),
        start,
        end,
        score: optional(fields[5]),
        strand,
        frame: optional(fields[7]),
        attribute: fields[8].to_string(),
    })
}

fn optional(field: &str) -> Option<String> {
    match field.trim() {
        "" | "." => None,
        v => Some(v.to_string()),
    }
}
