use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::annotation::io::{AnnotationRecord, ParseError};
use crate::types::{Interval, Strand};

/// Transcript key used for exons without a transcript id attribute.
pub const UNKNOWN_TRANSCRIPT: &str = "unknown";

/// How exons without a transcript id are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum MissingTranscriptPolicy {
    /// All such exons share the single transcript "unknown".
    #[default]
    SharedSentinel,
    /// Each such exon is its own transcript, keyed `seqname:start-end`.
    PerRecord,
}

/// What to do with an attribute segment that has no key/value separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AttributePolicy {
    /// Drop the segment, log a warning and keep the exon.
    #[default]
    Skip,
    /// Fail the derivation.
    Abort,
}

/// An intron between two consecutive exons of one transcript.
/// Coordinates are 1-based, closed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntronRecord {
    pub transcript_id: String,
    pub seqname: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
}

impl IntronRecord {
    /// Column names, in field order.
    pub const COLUMNS: [&'static str; 5] = ["transcript_id", "seqname", "start", "end", "strand"];

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

/// Output of one derivation run.
#[derive(Debug, Default)]
pub struct Derivation {
    pub introns: Vec<IntronRecord>,
    pub exons: usize,
    pub transcripts: usize,
    /// Attribute segments that were skipped.
    pub issues: Vec<ParseError>,
}

/// Derives introns from the exon features of an annotation.
///
/// Workflow:
/// 1) pick exon features, decode their attributes and transcript key
/// 2) group exons by transcript key
/// 3) sort each group by start
/// 4) emit the gap between every two consecutive exons, if it is non-empty
///
/// Transcripts are visited in key order, so the output is deterministic.
/// `seqname` and `strand` of every intron come from the first exon of the
/// sorted group; the other exons are not checked against it.
#[derive(Debug, Clone)]
pub struct IntronDeriver {
    pub transcript_id_key: String,
    pub exon_feature: String,
    pub missing_transcript: MissingTranscriptPolicy,
    pub attribute_policy: AttributePolicy,
}

impl Default for IntronDeriver {
    fn default() -> Self {
        Self {
            transcript_id_key: "transcript_id".into(),
            exon_feature: "exon".into(),
            missing_transcript: MissingTranscriptPolicy::default(),
            attribute_policy: AttributePolicy::default(),
        }
    }
}

impl IntronDeriver {
    pub fn derive<'a, I>(&self, records: I) -> Result<Derivation, ParseError>
    where
        I: IntoIterator<Item = &'a AnnotationRecord>,
    {
        let mut out = Derivation::default();
        let mut groups: BTreeMap<String, Vec<&AnnotationRecord>> = BTreeMap::new();

        for rec in records {
            if !rec.is_feature(&self.exon_feature) {
                continue;
            }
            out.exons += 1;

            let attrs = rec.attributes();
            for segment in attrs.malformed() {
                let err = ParseError::MalformedAttribute {
                    line_no: rec.line_no,
                    segment: segment.clone(),
                };
                match self.attribute_policy {
                    AttributePolicy::Abort => return Err(err),
                    AttributePolicy::Skip => {
                        warn!("{}", err);
                        out.issues.push(err);
                    }
                }
            }

            let key = match attrs.get(&self.transcript_id_key) {
                Some(tid) => tid.to_string(),
                None => self.fallback_key(rec),
            };
            groups.entry(key).or_default().push(rec);
        }

        out.transcripts = groups.len();

        for (tid, mut exons) in groups {
            // stable: equal starts keep input order
            exons.sort_by_key(|r| r.start);

            let first = exons[0];
            let blocks: Vec<Interval> = exons.iter().map(|r| r.interval()).collect();

            for gap in Interval::gaps_between(&blocks) {
                out.introns.push(IntronRecord {
                    transcript_id: tid.clone(),
                    seqname: first.seqname.clone(),
                    start: gap.start,
                    end: gap.end,
                    strand: first.strand,
                });
            }
        }

        debug!(
            "derived {} introns from {} exons in {} transcripts",
            out.introns.len(),
            out.exons,
            out.transcripts
        );

        Ok(out)
    }

    fn fallback_key(&self, rec: &AnnotationRecord) -> String {
        match self.missing_transcript {
            MissingTranscriptPolicy::SharedSentinel => UNKNOWN_TRANSCRIPT.to_string(),
            MissingTranscriptPolicy::PerRecord => {
                format!("{}:{}-{}", rec.seqname, rec.start, rec.end)
            }
        }
    }
}
