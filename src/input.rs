use std::fs;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

/// One raw input stream together with the name it was supplied under.
///
/// The name is only used for format hints:
/// - a `.gz` suffix means the bytes are gzip-compressed
/// - for the known-intron table, a `.tsv` stem means tab-delimited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedInput {
    name: String,
    bytes: Vec<u8>,
}

impl NamedInput {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a whole file into memory, keeping its file name as the input name.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).with_context(|| format!("read input file {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_gz(&self) -> bool {
        has_suffix_ignore_case(&self.name, ".gz")
    }

    /// The name with a trailing `.gz` removed.
    pub fn stem(&self) -> &str {
        if self.is_gz() {
            &self.name[..self.name.len() - 3]
        } else {
            &self.name
        }
    }

    /// Open the bytes as `BufRead`, plain or gz depending on the name.
    pub fn reader(&self) -> Box<dyn BufRead + '_> {
        if self.is_gz() {
            Box::new(BufReader::new(GzDecoder::new(self.bytes.as_slice())))
        } else {
            Box::new(BufReader::new(self.bytes.as_slice()))
        }
    }
}

pub(crate) fn has_suffix_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name.is_char_boundary(name.len() - suffix.len())
        && name[name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
