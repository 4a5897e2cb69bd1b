//! Collects every CLI-tunable threshold into a single struct passed by
//! reference into the scanner and emitter, rather than threaded as a
//! dozen loose arguments or read from a global.

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub input_bam: String,
    pub ref_fasta: String,
    pub output_vcf: String,
    pub mapq_cutoff: u8,
    pub ao_cutoff: i64,
    pub depth_cutoff: i64,
    pub vaf_cutoff: f64,
    pub itd_length_cutoff: i64,
    pub allowed_mismatches_for_sr_rescue: usize,
    pub allowed_mismatches_for_insertion: usize,
    pub microinsertion_cutoff: i64,
    pub target: String,
    pub log_level: String,
}

impl ScanConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        input_bam: String,
        ref_fasta: String,
        output_vcf: String,
        mapq_cutoff: u8,
        ao_cutoff: i64,
        depth_cutoff: i64,
        vaf_cutoff: f64,
        itd_length_cutoff: i64,
        allowed_mismatches_for_sr_rescue: usize,
        allowed_mismatches_for_insertion: usize,
        microinsertion_cutoff: i64,
        target: String,
        log_level: String,
    ) -> ScanConfig {
        ScanConfig {
            input_bam,
            ref_fasta,
            output_vcf,
            mapq_cutoff,
            ao_cutoff,
            depth_cutoff,
            vaf_cutoff,
            itd_length_cutoff,
            allowed_mismatches_for_sr_rescue,
            allowed_mismatches_for_insertion,
            microinsertion_cutoff,
            target,
            log_level,
        }
    }

    /// Output-filter predicate: whether an event passes the `-c/-d/-f`
    /// thresholds and should be written by the emitter. Does not affect
    /// candidate aggregation, only emission.
    pub fn passes_output_filter(&self, ao: i64, dp: i64, vaf: f64) -> bool {
        ao >= self.ao_cutoff && dp >= self.depth_cutoff && vaf >= self.vaf_cutoff
    }
}
