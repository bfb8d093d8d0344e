use serde::{Deserialize, Serialize};

use crate::annotation::io::AnnotationRecord;
use crate::model::intron::IntronRecord;
use crate::types::{Interval, Strand};

/// An annotated region interval (every non-exon feature of the region input).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionRecord {
    pub seqname: String,
    pub source: String,
    pub start: i64,
    pub end: i64,
}

impl RegionRecord {
    pub fn from_record(rec: &AnnotationRecord) -> Self {
        Self {
            seqname: rec.seqname.clone(),
            source: rec.source.clone(),
            start: rec.start,
            end: rec.end,
        }
    }

    pub fn interval(&self) -> Interval {
        Interval::new(self.start, self.end)
    }
}

/// Keep every record whose feature is not `exon_feature`, in input order.
pub fn collect_regions<'a, I>(records: I, exon_feature: &str) -> Vec<RegionRecord>
where
    I: IntoIterator<Item = &'a AnnotationRecord>,
{
    records
        .into_iter()
        .filter(|r| !r.is_feature(exon_feature))
        .map(RegionRecord::from_record)
        .collect()
}

/// One (intron, overlapping region) pair.
///
/// Field order is the column order of the region-matched table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionMatchedIntron {
    pub transcript_id: String,
    pub seqname: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
    pub brain_region_source: String,
    pub brain_region_start: i64,
    pub brain_region_end: i64,
}

impl RegionMatchedIntron {
    /// Column names, in field order.
    pub const COLUMNS: [&'static str; 8] = [
        "transcript_id",
        "seqname",
        "start",
        "end",
        "strand",
        "brain_region_source",
        "brain_region_start",
        "brain_region_end",
    ];

    pub fn new(intron: &IntronRecord, region: &RegionRecord) -> Self {
        Self {
            transcript_id: intron.transcript_id.clone(),
            seqname: intron.seqname.clone(),
            start: intron.start,
            end: intron.end,
            strand: intron.strand,
            brain_region_source: region.source.clone(),
            brain_region_start: region.start,
            brain_region_end: region.end,
        }
    }

    /// Values rendered as text, aligned with [`Self::COLUMNS`].
    pub fn values(&self) -> [String; 8] {
        [
            self.transcript_id.clone(),
            self.seqname.clone(),
            self.start.to_string(),
            self.end.to_string(),
            self.strand.to_string(),
            self.brain_region_source.clone(),
            self.brain_region_start.to_string(),
            self.brain_region_end.to_string(),
        ]
    }
}
