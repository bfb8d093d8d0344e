use std::io::BufRead;
use std::path::Path;

use log::{debug, warn};

use crate::annotation::io::{AnnotationReader, AnnotationRecord, ParseError};
use crate::input::NamedInput;

/// What to do with a line that cannot be parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LinePolicy {
    /// Fail the whole load on the first bad line.
    #[default]
    Abort,
    /// Keep every valid line and report the bad ones.
    Collect,
}

/// Records of one annotation input plus the lines that were rejected.
#[derive(Debug, Default)]
pub struct LoadedAnnotation {
    pub records: Vec<AnnotationRecord>,
    pub issues: Vec<ParseError>,
}

impl LoadedAnnotation {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads a whole GTF (optionally gzipped) into memory.
///
/// I/O errors always abort; the line policy only decides what happens with
/// lines that were read but did not parse.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnnotationLoader {
    pub line_policy: LinePolicy,
}

impl AnnotationLoader {
    pub fn new(line_policy: LinePolicy) -> Self {
        Self { line_policy }
    }

    /// Load from anything implementing `BufRead`.
    pub fn load_from_reader<R: BufRead>(&self, reader: R) -> Result<LoadedAnnotation, ParseError> {
        let mut out = LoadedAnnotation::default();

        for rec in AnnotationReader::new(reader).records() {
            match rec {
                Ok(rec) => out.records.push(rec),
                Err(e @ ParseError::IoPath { .. }) => return Err(e),
                Err(e) => match self.line_policy {
                    LinePolicy::Abort => return Err(e),
                    LinePolicy::Collect => {
                        warn!("skipping line: {}", e);
                        out.issues.push(e);
                    }
                },
            }
        }

        debug!(
            "loaded {} annotation records ({} rejected lines)",
            out.records.len(),
            out.issues.len()
        );

        Ok(out)
    }

    /// Load an in-memory input; a `.gz` name means gzip.
    pub fn load_input(&self, input: &NamedInput) -> Result<LoadedAnnotation, ParseError> {
        self.load_from_reader(input.reader()).map_err(|e| match e {
            ParseError::IoPath { source, .. } => ParseError::IoPath {
                path: input.name().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Load from a file path.
    ///
    /// - If path ends with `.gz`, uses the gzip decoder.
    /// - Otherwise reads as plain text.
    pub fn load_from_path<P: AsRef<Path>>(&self, path: P) -> Result<LoadedAnnotation, ParseError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ParseError::IoPath {
            path: path.display().to_string(),
            source: e,
        })?;

        self.load_input(&NamedInput::new(path.display().to_string(), bytes))
    }
}

// -------------------- tests --------------------

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::{Cursor, Write};

    const GTF: &str = "\
chr1\tsrc\texon\t101\t150\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon
chr1\tsrc\texon\t201\t250\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
";

    #[test]
    fn abort_policy_fails_on_bad_line() {
        let err = AnnotationLoader::new(LinePolicy::Abort)
            .load_from_reader(Cursor::new(GTF.as_bytes()))
            .unwrap_err();
        assert_eq!(err.line_no(), Some(2));
    }

    #[test]
    fn collect_policy_keeps_valid_rows() {
        let loaded = AnnotationLoader::new(LinePolicy::Collect)
            .load_from_reader(Cursor::new(GTF.as_bytes()))
            .unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.issues.len(), 1);
        assert_eq!(loaded.issues[0].line_no(), Some(2));
        assert_eq!(loaded.records[1].start, 201);
    }

    #[test]
    fn gz_input_loads_like_plain() {
        let clean = "chr1\tsrc\texon\t101\t150\t.\t+\t.\ttranscript_id \"T1\";\n";
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(clean.as_bytes()).unwrap();
        let gz = NamedInput::new("genes.gtf.gz", enc.finish().unwrap());
        let plain = NamedInput::new("genes.gtf", clean.as_bytes());

        let loader = AnnotationLoader::default();
        let a = loader.load_input(&gz).unwrap();
        let b = loader.load_input(&plain).unwrap();
        assert_eq!(a.records, b.records);
    }

    #[test]
    fn corrupt_gz_is_an_io_error_even_when_collecting() {
        let bad = NamedInput::new("genes.gtf.gz", b"definitely not gzip".to_vec());
        let err = AnnotationLoader::new(LinePolicy::Collect)
            .load_input(&bad)
            .unwrap_err();
        match err {
            ParseError::IoPath { path, .. } => assert_eq!(path, "genes.gtf.gz"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
