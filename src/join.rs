use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io::Write;

use crate::known::{KnownIntronTable, KEY_COLUMNS};
use crate::model::region::RegionMatchedIntron;

/// Suffix for a known-table column whose name also exists on the region side.
pub const KNOWN_SUFFIX: &str = "_known";
/// Suffix for a region-side column whose name also exists in the known table.
pub const REGION_SUFFIX: &str = "_region";

/// The final filtered table: known-intron columns, then the region-matched
/// columns other than the join keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ResultTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    /// Tab-delimited, header row first.
    pub fn write_tsv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);

        wtr.write_record(&self.columns)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;

        Ok(())
    }

    pub fn to_tsv_string(&self) -> Result<String, csv::Error> {
        let mut buf: Vec<u8> = Vec::new();
        self.write_tsv(&mut buf)?;
        // every cell came in as a String
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Plain tab-separated rendering for terminals and logs.
impl fmt::Display for ResultTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.join("\t"))?;
        for row in &self.rows {
            writeln!(f, "{}", row.join("\t"))?;
        }
        Ok(())
    }
}

/// Inner join on `(seqname, start, end)` with exact integer equality.
///
/// - one output row per matching (known, region-matched) pair, no dedup
/// - rows follow known-table order, then region-matched order
/// - key columns keep their name and position from the known table
/// - a non-key name present on both sides becomes `<name>_known` / `<name>_region`
pub fn join_known(known: &KnownIntronTable, matched: &[RegionMatchedIntron]) -> ResultTable {
    let key_idx = known.key_indices();

    let region_cols: Vec<(usize, &str)> = RegionMatchedIntron::COLUMNS
        .iter()
        .enumerate()
        .filter(|(_, c)| !KEY_COLUMNS.contains(*c))
        .map(|(i, c)| (i, *c))
        .collect();

    let known_names: HashSet<&str> = known
        .columns
        .iter()
        .enumerate()
        .filter(|(i, _)| !key_idx.contains(i))
        .map(|(_, c)| c.as_str())
        .collect();
    let region_names: HashSet<&str> = region_cols.iter().map(|(_, c)| *c).collect();

    let mut columns: Vec<String> = Vec::with_capacity(known.columns.len() + region_cols.len());
    for (i, c) in known.columns.iter().enumerate() {
        if !key_idx.contains(&i) && region_names.contains(c.as_str()) {
            columns.push(format!("{c}{KNOWN_SUFFIX}"));
        } else {
            columns.push(c.clone());
        }
    }
    for (_, c) in &region_cols {
        if known_names.contains(c) {
            columns.push(format!("{c}{REGION_SUFFIX}"));
        } else {
            columns.push(c.to_string());
        }
    }

    let mut by_key: HashMap<(&str, i64, i64), Vec<usize>> = HashMap::new();
    for (i, m) in matched.iter().enumerate() {
        by_key
            .entry((m.seqname.as_str(), m.start, m.end))
            .or_default()
            .push(i);
    }

    let mut rows = Vec::new();
    for k in &known.rows {
        let Some(hits) = by_key.get(&(k.seqname.as_str(), k.start, k.end)) else {
            continue;
        };

        for &i in hits {
            let values = matched[i].values();

            let mut row = k.fields.clone();
            // keys as integers, like the region side
            row[key_idx[1]] = k.start.to_string();
            row[key_idx[2]] = k.end.to_string();
            row.extend(region_cols.iter().map(|(j, _)| values[*j].clone()));

            rows.push(row);
        }
    }

    ResultTable { columns, rows }
}
