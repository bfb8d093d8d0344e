use std::io::Write;

use serde::Serialize;

pub mod intron;
pub mod region;

pub use intron::{
    AttributePolicy, Derivation, IntronDeriver, IntronRecord, MissingTranscriptPolicy,
    UNKNOWN_TRANSCRIPT,
};
pub use region::{collect_regions, RegionMatchedIntron, RegionRecord};

/// Tab-delimited records under an explicit header; no rows still gives the header line.
///
/// `columns` must follow the field order of `T`.
pub fn write_records_tsv<T: Serialize, W: Write>(
    columns: &[&str],
    rows: &[T],
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(columns)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;

    Ok(())
}
