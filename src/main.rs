use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, Level};
use simple_logger::init_with_level;

use brain_intron_filter::index::DEFAULT_BIN_WIDTH;
use brain_intron_filter::model::write_records_tsv;
use brain_intron_filter::{
    AttributePolicy, IntronFilter, IntronRecord, LinePolicy, MatcherKind,
    MissingTranscriptPolicy, NamedInput, RegionMatchedIntron,
};

/// Filter known introns to those derived from a genome GTF that overlap brain regions.
#[derive(Parser, Debug)]
#[command(name = "brain-intron-filter")]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,

    /// Logging verbosity level
    #[arg(short = 'L', long, global = true, default_value = "info")]
    level: Level,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join known introns against genome introns that overlap brain regions
    Filter(FilterArgs),

    /// Write the introns derived from a genome GTF (optionally only those overlapping regions)
    Introns(IntronsArgs),
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Genome annotation (.gtf or .gtf.gz)
    #[arg(long, short)]
    genome: PathBuf,

    /// Brain region annotation (.gtf or .gtf.gz); every non-exon feature is a region
    #[arg(long, short)]
    regions: PathBuf,

    /// Known introns with seqname/start/end columns (.tsv is tab-separated, anything else comma)
    #[arg(long, short)]
    known: PathBuf,

    /// Output TSV (stdout if not given)
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[command(flatten)]
    options: PipelineArgs,
}

#[derive(Args, Debug)]
struct IntronsArgs {
    /// Genome annotation (.gtf or .gtf.gz)
    #[arg(long, short)]
    genome: PathBuf,

    /// Only write introns overlapping these regions, one row per overlap
    #[arg(long, short)]
    regions: Option<PathBuf>,

    /// Output TSV (stdout if not given)
    #[arg(long, short)]
    output: Option<PathBuf>,

    #[command(flatten)]
    options: PipelineArgs,
}

#[derive(Args, Debug)]
struct PipelineArgs {
    /// Attribute key holding the transcript id
    #[arg(long = "transcript-id-key", value_name = "KEY", default_value = "transcript_id")]
    transcript_id_key: String,

    /// Feature type that counts as an exon
    #[arg(long = "exon-feature", value_name = "TYPE", default_value = "exon")]
    exon_feature: String,

    /// Grouping of exons without a transcript id
    #[arg(long = "missing-transcript", value_enum, default_value_t = MissingTranscriptPolicy::SharedSentinel)]
    missing_transcript: MissingTranscriptPolicy,

    /// What to do with malformed annotation lines
    #[arg(long = "on-bad-line", value_enum, default_value_t = LinePolicy::Abort)]
    line_policy: LinePolicy,

    /// What to do with attribute segments without a key/value separator
    #[arg(long = "on-bad-attribute", value_enum, default_value_t = AttributePolicy::Skip)]
    attribute_policy: AttributePolicy,

    /// Overlap search strategy
    #[arg(long, value_enum, default_value_t = MatcherChoice::Binned)]
    matcher: MatcherChoice,

    /// Bin width in base pairs for the binned matcher
    #[arg(long, default_value_t = DEFAULT_BIN_WIDTH)]
    bin_width: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum MatcherChoice {
    Pairwise,
    Binned,
}

impl PipelineArgs {
    fn filter(&self) -> IntronFilter {
        let matcher = match self.matcher {
            MatcherChoice::Pairwise => MatcherKind::Pairwise,
            MatcherChoice::Binned => MatcherKind::Binned {
                bin_width: self.bin_width,
            },
        };

        IntronFilter::new()
            .transcript_id_key(&self.transcript_id_key)
            .exon_feature(&self.exon_feature)
            .missing_transcript(self.missing_transcript)
            .attribute_policy(self.attribute_policy)
            .line_policy(self.line_policy)
            .matcher(matcher)
    }
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(p) => {
            let f = File::create(p).with_context(|| format!("create output {}", p.display()))?;
            Ok(Box::new(BufWriter::new(f)))
        }
        None => Ok(Box::new(BufWriter::new(io::stdout().lock()))),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_with_level(cli.level).map_err(|e| anyhow!("init logger: {e}"))?;

    match cli.cmd {
        Command::Filter(args) => {
            let genome = NamedInput::from_path(&args.genome)?;
            let regions = NamedInput::from_path(&args.regions)?;
            let known = NamedInput::from_path(&args.known)?;

            let report = args.options.filter().run(&genome, &regions, &known)?;
            info!("{}", report.stats.to_string().replace('\n', "; "));

            let out = open_output(args.output.as_deref())?;
            report
                .table
                .write_tsv(out)
                .context("write result table")?;

            if let Some(p) = &args.output {
                info!("Result written to {}", p.display());
            }
            info!("{}", report.status_message());
        }

        Command::Introns(args) => {
            let filter = args.options.filter();
            let genome = NamedInput::from_path(&args.genome)?;

            let mut issues = Vec::new();
            let derivation = filter.derive_introns(&genome, &mut issues)?;

            // all inputs are parsed before the output is created
            match &args.regions {
                Some(path) => {
                    let regions = NamedInput::from_path(path)?;
                    let records = filter.load_regions(&regions, &mut issues)?;
                    let matched = filter.match_regions(&derivation, &records);

                    let out = open_output(args.output.as_deref())?;
                    write_records_tsv(&RegionMatchedIntron::COLUMNS, &matched, out)
                        .context("write region-matched introns")?;
                }
                None => {
                    let out = open_output(args.output.as_deref())?;
                    write_records_tsv(&IntronRecord::COLUMNS, &derivation.introns, out)
                        .context("write introns")?;
                }
            }

            if !issues.is_empty() {
                info!("{} lines or attributes were skipped", issues.len());
            }
        }
    }

    Ok(())
}
