//! brain_intron_filter
//!
//! Filters a list of known introns down to the ones that
//! - are derived from the exons of a GTF genome annotation,
//! - overlap a region of a second GTF annotation (its non-exon features),
//! - match the known list on exact `(seqname, start, end)`.
//!
//! Coordinates are GTF coordinates throughout: 1-based, closed.

pub mod types;
pub mod input;
pub mod annotation;
pub mod model;
pub mod index;
pub mod known;
pub mod join;
pub mod pipeline;

pub use index::{BinnedMatcher, IntervalMatcher, MatcherKind, PairwiseMatcher};

pub use annotation::{AnnotationLoader, LinePolicy, ParseError};

pub use types::{Interval, Strand};
pub use input::NamedInput;

pub use model::{
    AttributePolicy, IntronDeriver, IntronRecord, MissingTranscriptPolicy, RegionMatchedIntron,
    RegionRecord,
};
pub use known::{KnownIntronTable, TableError};
pub use join::ResultTable;
pub use pipeline::{FilterReport, FilterStats, IntronFilter};
