use std::collections::{BTreeMap, HashMap};
use std::fmt;

use log::debug;

use crate::model::intron::IntronRecord;
use crate::model::region::{RegionMatchedIntron, RegionRecord};
use crate::types::Interval;

/// Default bin width of [`BinnedMatcher`], in base pairs.
pub const DEFAULT_BIN_WIDTH: u32 = 100_000;

/// Finds the regions overlapping a query interval.
///
/// Every implementation must use the closed-interval predicate of
/// [`Interval::overlaps`] and return region indices in ascending order, so
/// that all matchers produce identical output.
pub trait IntervalMatcher {
    /// Indices into the region slice the matcher was built from.
    fn overlapping(&self, seqname: &str, query: Interval) -> Vec<usize>;
}

/// Checks every region for every query.
#[derive(Debug, Clone, Copy)]
pub struct PairwiseMatcher<'a> {
    regions: &'a [RegionRecord],
}

impl<'a> PairwiseMatcher<'a> {
    pub fn new(regions: &'a [RegionRecord]) -> Self {
        Self { regions }
    }
}

impl IntervalMatcher for PairwiseMatcher<'_> {
    fn overlapping(&self, seqname: &str, query: Interval) -> Vec<usize> {
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.seqname == seqname && query.overlaps(r.interval()))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Per-sequence bucket index: bin -> region ids.
///
/// Bins are stored sparsely. A region covering more than [`MAX_SPAN_BINS`]
/// bins is kept in `wide` and offered as a candidate to every query.
/// This is a pre-filter only: candidates are re-checked with the exact predicate.
#[derive(Debug, Clone)]
struct ChrBuckets {
    bin_width: i64,
    bins: BTreeMap<usize, Vec<usize>>,
    wide: Vec<usize>,
}

/// Widest span, in bins, that a region is spread over.
const MAX_SPAN_BINS: usize = 1024;

impl ChrBuckets {
    fn new(bin_width: i64) -> Self {
        Self {
            bin_width,
            bins: BTreeMap::new(),
            wide: Vec::new(),
        }
    }

    // positions below 1 share bin 0
    fn bin_of(&self, pos: i64) -> usize {
        (pos.max(0) / self.bin_width) as usize
    }

    fn add_span(&mut self, region_id: usize, span: Interval) {
        if span.is_empty() {
            return;
        }

        let b0 = self.bin_of(span.start);
        let b1 = self.bin_of(span.end);

        if b1 - b0 >= MAX_SPAN_BINS {
            self.wide.push(region_id);
            return;
        }
        for b in b0..=b1 {
            self.bins.entry(b).or_default().push(region_id);
        }
    }

    fn candidates(&self, span: Interval) -> Vec<usize> {
        if span.is_empty() {
            return Vec::new();
        }

        let b0 = self.bin_of(span.start);
        let b1 = self.bin_of(span.end);

        let mut out: Vec<usize> = self.wide.clone();
        for (_, ids) in self.bins.range(b0..=b1) {
            out.extend_from_slice(ids);
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Fixed-width bins per sequence.
///
/// A query only looks at regions sharing at least one bin with it.
#[derive(Debug, Clone)]
pub struct BinnedMatcher<'a> {
    regions: &'a [RegionRecord],
    bin_width: u32,
    chr_to_id: HashMap<String, usize>,
    chr_buckets: Vec<ChrBuckets>,
}

impl<'a> BinnedMatcher<'a> {
    /// Build the index. A zero bin width is treated as 1.
    pub fn new(regions: &'a [RegionRecord], bin_width: u32) -> Self {
        let bin_width = bin_width.max(1);
        let mut chr_to_id: HashMap<String, usize> = HashMap::new();
        let mut chr_buckets: Vec<ChrBuckets> = Vec::new();

        for (region_id, region) in regions.iter().enumerate() {
            let chr_id = match chr_to_id.get(&region.seqname) {
                Some(&id) => id,
                None => {
                    let id = chr_buckets.len();
                    chr_to_id.insert(region.seqname.clone(), id);
                    chr_buckets.push(ChrBuckets::new(bin_width as i64));
                    id
                }
            };
            chr_buckets[chr_id].add_span(region_id, region.interval());
        }

        debug!(
            "binned {} regions over {} sequences (bin_width={})",
            regions.len(),
            chr_buckets.len(),
            bin_width
        );

        Self {
            regions,
            bin_width,
            chr_to_id,
            chr_buckets,
        }
    }
}

impl IntervalMatcher for BinnedMatcher<'_> {
    fn overlapping(&self, seqname: &str, query: Interval) -> Vec<usize> {
        let Some(&chr_id) = self.chr_to_id.get(seqname) else {
            return Vec::new();
        };

        let mut hits = self.chr_buckets[chr_id].candidates(query);
        hits.retain(|&i| query.overlaps(self.regions[i].interval()));
        hits
    }
}

/// Summary of the bucket layout, for logging.
impl fmt::Display for BinnedMatcher<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "BinnedMatcher: {} regions, {} sequences, bin_width={} bp",
            self.regions.len(),
            self.chr_buckets.len(),
            self.bin_width
        )?;

        let mut names: Vec<(&String, &usize)> = self.chr_to_id.iter().collect();
        names.sort_by_key(|(_, id)| **id);

        for (name, &id) in names {
            let cb = &self.chr_buckets[id];
            let filled = cb.bins.len();
            let entries: usize = cb.bins.values().map(Vec::len).sum();
            let mean = if filled == 0 {
                0.0
            } else {
                entries as f64 / filled as f64
            };
            writeln!(
                f,
                "  - {}: filled={}, wide={}, mean_regions/filled_bin={:.3}",
                name,
                filled,
                cb.wide.len(),
                mean
            )?;
        }

        Ok(())
    }
}

/// Which matcher a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatcherKind {
    Pairwise,
    Binned { bin_width: u32 },
}

impl Default for MatcherKind {
    fn default() -> Self {
        MatcherKind::Binned {
            bin_width: DEFAULT_BIN_WIDTH,
        }
    }
}

impl MatcherKind {
    pub fn build<'a>(self, regions: &'a [RegionRecord]) -> Box<dyn IntervalMatcher + 'a> {
        match self {
            MatcherKind::Pairwise => Box::new(PairwiseMatcher::new(regions)),
            MatcherKind::Binned { bin_width } => Box::new(BinnedMatcher::new(regions, bin_width)),
        }
    }
}

/// One row per (intron, overlapping region); introns without a region produce nothing.
///
/// Rows follow intron order, then region input order.
pub fn match_regions(
    introns: &[IntronRecord],
    regions: &[RegionRecord],
    matcher: &dyn IntervalMatcher,
) -> Vec<RegionMatchedIntron> {
    let mut out = Vec::new();
    for intron in introns {
        for region_id in matcher.overlapping(&intron.seqname, intron.interval()) {
            out.push(RegionMatchedIntron::new(intron, &regions[region_id]));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Strand;

    fn region(seqname: &str, source: &str, start: i64, end: i64) -> RegionRecord {
        RegionRecord {
            seqname: seqname.into(),
            source: source.into(),
            start,
            end,
        }
    }

    fn intron(tid: &str, seqname: &str, start: i64, end: i64) -> IntronRecord {
        IntronRecord {
            transcript_id: tid.into(),
            seqname: seqname.into(),
            start,
            end,
            strand: Strand::Plus,
        }
    }

    fn both(regions: &[RegionRecord]) -> Vec<Box<dyn IntervalMatcher + '_>> {
        vec![
            MatcherKind::Pairwise.build(regions),
            MatcherKind::Binned { bin_width: 50 }.build(regions),
        ]
    }

    #[test]
    fn touching_endpoint_counts_as_overlap() {
        let regions = vec![region("chr1", "a", 200, 250), region("chr1", "b", 201, 250)];
        for m in both(&regions) {
            assert_eq!(m.overlapping("chr1", Interval::new(101, 200)), vec![0]);
        }
    }

    #[test]
    fn other_sequence_never_matches() {
        let regions = vec![region("chr2", "a", 1, 1_000)];
        for m in both(&regions) {
            assert!(m.overlapping("chr1", Interval::new(101, 200)).is_empty());
        }
    }

    #[test]
    fn one_intron_over_two_regions_fans_out() {
        let regions = vec![region("chr1", "a", 90, 120), region("chr1", "b", 180, 260)];
        let introns = vec![intron("T1", "chr1", 101, 200), intron("T1", "chr1", 301, 400)];
        for m in both(&regions) {
            let rows = match_regions(&introns, &regions, m.as_ref());
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].brain_region_source, "a");
            assert_eq!(rows[1].brain_region_source, "b");
            assert!(rows.iter().all(|r| (r.start, r.end) == (101, 200)));
        }
    }

    #[test]
    fn wide_region_spanning_many_bins_is_found_once() {
        let regions = vec![region("chr1", "wide", 1, 10_000)];
        let m = BinnedMatcher::new(&regions, 10);
        assert_eq!(m.overlapping("chr1", Interval::new(500, 2_500)), vec![0]);
    }

    #[test]
    fn query_past_last_bin_is_empty() {
        let regions = vec![region("chr1", "a", 1, 100)];
        let m = BinnedMatcher::new(&regions, 10);
        assert!(m.overlapping("chr1", Interval::new(5_000, 6_000)).is_empty());
    }

    #[test]
    fn region_reaching_max_coordinate_matches_like_pairwise() {
        let regions = vec![
            region("chr1", "huge", 150, i64::MAX),
            region("chr1", "small", 90, 120),
            region("chr1", "from_zero", 0, i64::MAX),
        ];
        let queries = [
            Interval::new(101, 200),
            Interval::new(1, 100),
            Interval::new(i64::MAX - 10, i64::MAX),
            Interval::new(1, i64::MAX),
        ];

        let pairwise = PairwiseMatcher::new(&regions);
        let binned = BinnedMatcher::new(&regions, DEFAULT_BIN_WIDTH);
        for q in queries {
            assert_eq!(binned.overlapping("chr1", q), pairwise.overlapping("chr1", q), "{q}");
        }
        assert_eq!(binned.overlapping("chr1", Interval::new(101, 200)), vec![0, 1, 2]);
        assert_eq!(binned.overlapping("chr1", Interval::new(1, 100)), vec![1, 2]);
    }

    #[test]
    fn region_over_many_bins_goes_to_the_wide_list() {
        let regions = vec![region("chr1", "a", 1, 1_000_000), region("chr1", "b", 5, 9)];
        let m = BinnedMatcher::new(&regions, 1);
        let cb = &m.chr_buckets[0];
        assert_eq!(cb.wide, vec![0]);
        assert_eq!(cb.bins.len(), 5);
        assert_eq!(m.overlapping("chr1", Interval::new(999_999, 1_000_005)), vec![0]);
        assert_eq!(m.overlapping("chr1", Interval::new(9, 9)), vec![0, 1]);
    }

    #[test]
    fn zero_bin_width_still_matches() {
        let regions = vec![region("chr1", "a", 5, 9)];
        let m = BinnedMatcher::new(&regions, 0);
        assert_eq!(m.overlapping("chr1", Interval::new(9, 12)), vec![0]);
    }

    #[test]
    fn inverted_region_matches_nothing() {
        let regions = vec![region("chr1", "bad", 300, 100)];
        for m in both(&regions) {
            assert!(m.overlapping("chr1", Interval::new(150, 200)).is_empty());
        }
    }

    #[test]
    fn binned_and_pairwise_agree() {
        // deterministic pseudo-random layout
        let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
        let mut next = |modulo: i64| {
            seed ^= seed << 13;
            seed ^= seed >> 7;
            seed ^= seed << 17;
            (seed % modulo as u64) as i64
        };

        let chrs = ["chr1", "chr2", "chrX"];
        let mut regions = Vec::new();
        for i in 0..200 {
            let start = next(50_000) + 1;
            let len = next(3_000);
            regions.push(region(chrs[i % 3], "r", start, start + len));
        }
        let mut introns = Vec::new();
        for i in 0..300 {
            let start = next(50_000) + 1;
            let len = next(5_000);
            introns.push(intron("T", chrs[(i * 7) % 3], start, start + len));
        }

        let pairwise = match_regions(&introns, &regions, &PairwiseMatcher::new(&regions));
        for width in [1, 64, 1_000, 100_000] {
            let binned = match_regions(&introns, &regions, &BinnedMatcher::new(&regions, width));
            assert_eq!(pairwise, binned, "bin width {width}");
        }
        assert!(!pairwise.is_empty());
    }

    #[test]
    fn display_lists_sequences() {
        let regions = vec![region("chr1", "a", 1, 100), region("chr2", "b", 1, 100)];
        let s = BinnedMatcher::new(&regions, 50).to_string();
        assert!(s.starts_with("BinnedMatcher: 2 regions, 2 sequences"));
        assert!(s.contains("  - chr1:"));
        assert!(s.contains("  - chr2:"));
    }
}
