use std::fmt;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::annotation::{AnnotationLoader, LinePolicy, LoadedAnnotation, ParseError};
use crate::index::{match_regions, MatcherKind};
use crate::input::NamedInput;
use crate::join::{join_known, ResultTable};
use crate::known::KnownIntronTable;
use crate::model::intron::{AttributePolicy, Derivation, IntronDeriver, MissingTranscriptPolicy};
use crate::model::region::{collect_regions, RegionMatchedIntron, RegionRecord};

/// One-shot filter: genome GTF + region GTF + known-intron list -> result table.
///
/// Each run is a pure function of its three inputs; the struct only holds
/// configuration and can be reused.
///
/// # Example
/// ```
/// use brain_intron_filter::{IntronFilter, NamedInput};
///
/// let genome = NamedInput::new("genes.gtf", "\
/// chr1\tsrc\texon\t1\t100\t.\t+\t.\ttranscript_id \"T1\";\n\
/// chr1\tsrc\texon\t201\t300\t.\t+\t.\ttranscript_id \"T1\";\n");
/// let regions = NamedInput::new("brain.gtf", "chr1\tallen\tregion\t150\t160\t.\t.\t.\tname \"r\";\n");
/// let known = NamedInput::new("known.tsv", "seqname\tstart\tend\nchr1\t101\t200\n");
///
/// let report = IntronFilter::default().run(&genome, &regions, &known).unwrap();
/// assert_eq!(report.table.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct IntronFilter {
    pub deriver: IntronDeriver,
    pub line_policy: LinePolicy,
    pub matcher: MatcherKind,
}

impl IntronFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute key holding the transcript id.
    pub fn transcript_id_key(mut self, key: &str) -> Self {
        self.deriver.transcript_id_key = key.to_string();
        self
    }

    /// Feature type that counts as an exon; every other feature of the
    /// region input is a region.
    pub fn exon_feature(mut self, feature: &str) -> Self {
        self.deriver.exon_feature = feature.to_string();
        self
    }

    pub fn missing_transcript(mut self, policy: MissingTranscriptPolicy) -> Self {
        self.deriver.missing_transcript = policy;
        self
    }

    pub fn attribute_policy(mut self, policy: AttributePolicy) -> Self {
        self.deriver.attribute_policy = policy;
        self
    }

    pub fn line_policy(mut self, policy: LinePolicy) -> Self {
        self.line_policy = policy;
        self
    }

    pub fn matcher(mut self, matcher: MatcherKind) -> Self {
        self.matcher = matcher;
        self
    }

    /// Run the whole pipeline.
    pub fn run(
        &self,
        genome: &NamedInput,
        regions: &NamedInput,
        known: &NamedInput,
    ) -> Result<FilterReport> {
        let mut issues = Vec::new();

        let derivation = self.derive_introns(genome, &mut issues)?;
        let region_records = self.load_regions(regions, &mut issues)?;
        let matched = self.match_regions(&derivation, &region_records);

        let known_table = KnownIntronTable::from_input(known)
            .with_context(|| format!("read known introns {}", known.name()))?;
        let table = join_known(&known_table, &matched);

        let stats = FilterStats {
            exons: derivation.exons,
            transcripts: derivation.transcripts,
            introns: derivation.introns.len(),
            regions: region_records.len(),
            region_matches: matched.len(),
            known_introns: known_table.len(),
            rows: table.len(),
        };

        Ok(FilterReport {
            table,
            stats,
            issues,
        })
    }

    /// Stage 1+2: parse the genome annotation and derive introns.
    ///
    /// Rejected lines and skipped attribute segments are appended to `issues`.
    pub fn derive_introns(
        &self,
        genome: &NamedInput,
        issues: &mut Vec<ParseError>,
    ) -> Result<Derivation> {
        let loaded = self.load(genome, issues)?;

        let mut derivation = self
            .deriver
            .derive(&loaded.records)
            .with_context(|| format!("derive introns from {}", genome.name()))?;
        issues.append(&mut derivation.issues);

        info!(
            "{}: {} introns from {} transcripts",
            genome.name(),
            derivation.introns.len(),
            derivation.transcripts
        );
        Ok(derivation)
    }

    /// Parse the region annotation and keep its non-exon features.
    pub fn load_regions(
        &self,
        regions: &NamedInput,
        issues: &mut Vec<ParseError>,
    ) -> Result<Vec<RegionRecord>> {
        let loaded = self.load(regions, issues)?;
        let out = collect_regions(&loaded.records, &self.deriver.exon_feature);

        info!("{}: {} regions", regions.name(), out.len());
        Ok(out)
    }

    /// Stage 3: one row per (intron, overlapping region).
    pub fn match_regions(
        &self,
        derivation: &Derivation,
        regions: &[RegionRecord],
    ) -> Vec<RegionMatchedIntron> {
        let matcher = self.matcher.build(regions);
        let matched = match_regions(&derivation.introns, regions, matcher.as_ref());

        info!("{} intron/region overlaps", matched.len());
        matched
    }

    fn load(&self, input: &NamedInput, issues: &mut Vec<ParseError>) -> Result<LoadedAnnotation> {
        let mut loaded = AnnotationLoader::new(self.line_policy)
            .load_input(input)
            .with_context(|| format!("parse annotation {}", input.name()))?;

        if !loaded.issues.is_empty() {
            warn!(
                "{}: skipped {} malformed lines",
                input.name(),
                loaded.issues.len()
            );
        }
        issues.append(&mut loaded.issues);

        Ok(loaded)
    }
}

/// Row counts of each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub exons: usize,
    pub transcripts: usize,
    pub introns: usize,
    pub regions: usize,
    pub region_matches: usize,
    pub known_introns: usize,
    pub rows: usize,
}

impl fmt::Display for FilterStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "genome: {} exons, {} transcripts, {} introns",
            self.exons, self.transcripts, self.introns
        )?;
        writeln!(
            f,
            "regions: {} regions, {} intron/region overlaps",
            self.regions, self.region_matches
        )?;
        write!(
            f,
            "known: {} introns, {} result rows",
            self.known_introns, self.rows
        )
    }
}

/// Everything a caller gets back from [`IntronFilter::run`].
#[derive(Debug)]
pub struct FilterReport {
    pub table: ResultTable,
    pub stats: FilterStats,
    /// Lines and attribute segments that were skipped under lenient policies.
    pub issues: Vec<ParseError>,
}

impl FilterReport {
    pub fn status_message(&self) -> String {
        format!(
            "Found {} known introns overlapping brain regions.",
            self.table.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENOME: &str = "\
#!genome-build test
chr1\tsrc\tgene\t1\t500\t.\t+\t.\tgene_id \"G1\";
chr1\tsrc\texon\t1\t100\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t201\t300\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
chr1\tsrc\texon\t401\t500\t.\t+\t.\tgene_id \"G1\"; transcript_id \"T1\";
";
    const REGIONS: &str = "chr1\tallen\tregion\t120\t180\t.\t.\t.\tname \"hippocampus\";\n";
    const KNOWN: &str = "seqname\tstart\tend\tlabel\nchr1\t101\t200\tk1\nchr1\t301\t400\tk2\n";

    fn inputs() -> (NamedInput, NamedInput, NamedInput) {
        (
            NamedInput::new("genes.gtf", GENOME),
            NamedInput::new("brain.gtf", REGIONS),
            NamedInput::new("known.tsv", KNOWN),
        )
    }

    #[test]
    fn end_to_end_single_match() {
        let (g, r, k) = inputs();
        let report = IntronFilter::default().run(&g, &r, &k).unwrap();

        assert_eq!(report.table.len(), 1);
        assert_eq!(
            report.status_message(),
            "Found 1 known introns overlapping brain regions."
        );
        assert_eq!(report.table.get(0, "label"), Some("k1"));
        assert_eq!(report.table.get(0, "brain_region_source"), Some("allen"));
        assert_eq!(
            report.stats,
            FilterStats {
                exons: 3,
                transcripts: 1,
                introns: 2,
                regions: 1,
                region_matches: 1,
                known_introns: 2,
                rows: 1,
            }
        );
        assert!(report.issues.is_empty());
    }

    #[test]
    fn pairwise_and_binned_give_the_same_table() {
        let (g, r, k) = inputs();
        let a = IntronFilter::new()
            .matcher(MatcherKind::Pairwise)
            .run(&g, &r, &k)
            .unwrap();
        let b = IntronFilter::new()
            .matcher(MatcherKind::Binned { bin_width: 7 })
            .run(&g, &r, &k)
            .unwrap();
        assert_eq!(a.table, b.table);
    }

    #[test]
    fn bad_genome_line_aborts_by_default() {
        let g = NamedInput::new("genes.gtf", format!("{GENOME}chr1\tsrc\texon\tx\t9\t.\t+\t.\tt \"1\";\n"));
        let (_, r, k) = inputs();

        let err = IntronFilter::default().run(&g, &r, &k).unwrap_err();
        let root = err.downcast_ref::<ParseError>().unwrap();
        assert!(matches!(root, ParseError::BadCoordinates { line_no: 6, .. }));
        assert!(format!("{err:#}").contains("genes.gtf"));
    }

    #[test]
    fn collect_policy_reports_and_continues() {
        let g = NamedInput::new("genes.gtf", format!("{GENOME}chr1\tsrc\texon\n"));
        let (_, r, k) = inputs();

        let report = IntronFilter::new()
            .line_policy(LinePolicy::Collect)
            .run(&g, &r, &k)
            .unwrap();
        assert_eq!(report.table.len(), 1);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn missing_known_column_names_the_input() {
        let (g, r, _) = inputs();
        let k = NamedInput::new("known.csv", "chrom,start,end\nchr1,101,200\n");

        let err = IntronFilter::default().run(&g, &r, &k).unwrap_err();
        assert!(format!("{err:#}").contains("known.csv"));
    }

    #[test]
    fn stats_render_one_line_per_stage() {
        let (g, r, k) = inputs();
        let report = IntronFilter::default().run(&g, &r, &k).unwrap();
        assert_eq!(report.stats.to_string().lines().count(), 3);
    }
}
