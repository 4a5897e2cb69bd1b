//! Command-line argument definitions. Using `clap`'s derive API, the way
//! the ambient stack favors typed, validated config over loose `ArgMatches`
//! lookups threaded through call sites.

use clap::Parser;
use log::LevelFilter;

use crate::config::ScanConfig;

#[derive(Parser, Debug)]
#[command(name = "scanitd", version, about = "Detects internal tandem duplications from BAM alignments")]
pub struct Cli {
    /// Input BAM file, coordinate-sorted and indexed.
    #[arg(short = 'i', long = "input")]
    pub input: String,

    /// Reference FASTA, indexed with `samtools faidx`.
    #[arg(short = 'r', long = "ref")]
    pub reference: String,

    /// Output VCF file.
    #[arg(short = 'o', long = "output")]
    pub output: String,

    /// Minimum mapping quality for a read to be considered.
    #[arg(short = 'm', long = "mapq", default_value_t = 15)]
    pub mapq: u8,

    /// Minimum alternate observation count to report an event.
    #[arg(short = 'c', long = "ao", default_value_t = 4)]
    pub ao_cutoff: i64,

    /// Minimum total depth to report an event.
    #[arg(short = 'd', long = "depth", default_value_t = 10)]
    pub depth_cutoff: i64,

    /// Minimum variant allele fraction to report an event.
    #[arg(short = 'f', long = "vaf", default_value_t = 0.1)]
    pub vaf_cutoff: f64,

    /// Minimum ITD length to consider as an in-CIGAR event.
    #[arg(long = "length", default_value_t = 10)]
    pub itd_length_cutoff: i64,

    /// Allowed mismatches when rescuing soft-clipped reads against a
    /// synthesized duplication-spanning reference window.
    #[arg(short = 'n', long = "aln-mismatches", default_value_t = 1)]
    pub aln_mismatches: usize,

    /// Allowed mismatches in the rotational self-loop check for in-CIGAR
    /// insertions.
    #[arg(long = "ins-mismatches", default_value_t = 2)]
    pub ins_mismatches: usize,

    /// Target region(s): a BED file path, an inline `chrom:start-end`
    /// (one or more, newline-separated), or empty for the whole file.
    #[arg(short = 't', long = "target", default_value = "")]
    pub target: String,

    /// Log verbosity.
    #[arg(short = 'l', long = "log-level", default_value = "info", value_parser = ["trace", "debug", "info", "warning", "error"])]
    pub log_level: String,
}

impl Cli {
    pub fn into_config(self) -> ScanConfig {
        ScanConfig::new(
            self.input,
            self.reference,
            self.output,
            self.mapq,
            self.ao_cutoff,
            self.depth_cutoff,
            self.vaf_cutoff,
            self.itd_length_cutoff,
            self.aln_mismatches,
            self.ins_mismatches,
            20,
            self.target,
            self.log_level,
        )
    }
}

/// Initialize `env_logger` at the level named by `log_level`, honoring
/// `RUST_LOG` if set (mirrors the teacher's own `set_log_level`).
pub fn init_logging(log_level: &str) {
    let level = match log_level {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        builder.parse_filters(&rust_log);
    }
    if builder.try_init().is_err() {
        log::warn!("logger already initialized");
    }
}
