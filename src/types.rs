use std::fmt;

use serde::{Deserialize, Serialize};

/// Genomic strand/orientation.
///
/// Serialized with the GTF column spelling (`+`, `-`, `.`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = ".")]
    Unknown,
}

impl Strand {
    /// Parse the strand column. `?` is accepted as unknown.
    pub fn parse(s: &str) -> Option<Strand> {
        match s {
            "+" => Some(Strand::Plus),
            "-" => Some(Strand::Minus),
            "." | "?" => Some(Strand::Unknown),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strand::Plus => "+",
            Strand::Minus => "-",
            Strand::Unknown => ".",
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A genomic interval in annotation coordinates.
/// Coordinates are 1-based, closed: [start, end]
///
/// Nothing enforces `start <= end`; an interval with `end < start` is empty
/// and overlaps nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.end < self.start
    }

    #[inline]
    pub fn len(self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.end.saturating_sub(self.start).saturating_add(1)
        }
    }

    /// Closed-interval overlap: touching endpoints count.
    #[inline]
    pub fn overlaps(self, other: Interval) -> bool {
        self.start.max(other.start) <= self.end.min(other.end)
    }

    /// Compute the gaps between consecutive blocks of an ordered list.
    ///
    /// Gap i is: [blocks[i].end + 1, blocks[i+1].start - 1],
    /// except that touching or overlapping neighbours leave no gap and are skipped.
    ///
    /// For fewer than two blocks, this returns an empty vec.
    pub fn gaps_between(blocks: &[Interval]) -> Vec<Interval> {
        let mut out = Vec::new();
        if blocks.len() < 2 {
            return out;
        }

        for w in blocks.windows(2) {
            // a block ending at i64::MAX has nothing after it
            let (Some(start), Some(end)) = (w[0].end.checked_add(1), w[1].start.checked_sub(1))
            else {
                continue;
            };
            let gap = Interval::new(start, end);
            if !gap.is_empty() {
                out.push(gap);
            }
        }

        out
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
