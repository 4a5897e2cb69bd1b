//! A single chimeric (split) or soft-clipped read and the derived
//! quantities the scanner keys candidates on.

use crate::cigar::{parse_cigar, CigarOp};
use crate::errors::ScanItdError;
use crate::interval::Strand;

/// Which side of a read's CIGAR carries the larger soft clip.
///
/// `Type0` marks a read that hasn't been classified yet (mirrors the
/// Python `MappingMode.Type0` sentinel used before `simple_mode` runs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingMode {
    Type0,
    Ms,
    Sm,
}

impl MappingMode {
    pub fn reversed(self) -> MappingMode {
        match self {
            MappingMode::Ms => MappingMode::Sm,
            MappingMode::Sm => MappingMode::Ms,
            MappingMode::Type0 => MappingMode::Type0,
        }
    }

    pub fn is_sm(self) -> bool {
        matches!(self, MappingMode::Sm)
    }

    pub fn is_ms(self) -> bool {
        matches!(self, MappingMode::Ms)
    }
}

/// One chimeric/split-read alignment record, carrying both the raw SAM
/// fields and the CIGAR-derived quantities used by the split-read handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Read {
    pub query_name: String,
    pub chrom: String,
    pub ref_start: i64,
    pub ref_end: i64,
    pub strand: Strand,
    pub cigarstring: String,
    pub mapq: u8,
    pub nm: i64,
    pub query_sequence: String,
    pub lt_soft_len: i64,
    pub rt_soft_len: i64,
    pub read_match_size: i64,
    pub reference_match_size: i64,
    pub indel_size: i64,
    pub cigar_no_soft: Vec<(CigarOp, u32)>,
    pub query_length: i64,
    /// Per-base phred quality scores, same order as `query_sequence`.
    /// Not consumed downstream yet; kept for structural fidelity with the
    /// original model, which stores qualities on every read it builds.
    pub query_qualities: Vec<u8>,
}

impl Read {
    /// Build a `Read` from raw SAM/BAM fields, parsing `cigar_str` and
    /// deriving `ref_end`/`sms` quantities. Mirrors `Read.new` /
    /// `Read.__init__` in the original Python model.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        query_name: String,
        chrom: String,
        ref_start: i64,
        strand: Strand,
        cigar_str: String,
        mapq: u8,
        nm: i64,
        query_sequence: String,
        query_qualities: Vec<u8>,
    ) -> Result<Read, ScanItdError> {
        let summary = parse_cigar(&cigar_str)?;
        let query_length = summary.query_len;
        let reference_match_size = summary.ref_match;
        Ok(Read {
            query_name,
            chrom,
            ref_start,
            ref_end: ref_start + reference_match_size,
            strand,
            cigarstring: cigar_str,
            mapq,
            nm,
            query_sequence,
            lt_soft_len: summary.lt_soft_len,
            rt_soft_len: summary.rt_soft_len,
            read_match_size: summary.read_match,
            reference_match_size,
            indel_size: summary.indel_len,
            cigar_no_soft: summary.cigar_no_soft,
            query_length,
            query_qualities,
        })
    }

    /// `(lt_soft_len, read_match_size, rt_soft_len)`, the triple the
    /// split-read handler switches on.
    pub fn sms(&self) -> (i64, i64, i64) {
        (self.lt_soft_len, self.read_match_size, self.rt_soft_len)
    }

    /// `Sm` if the left clip is at least as long as the right clip,
    /// else `Ms`. Ties resolve to `Sm`, matching the Python `>=`.
    pub fn simple_mode(&self) -> MappingMode {
        if self.lt_soft_len >= self.rt_soft_len {
            MappingMode::Sm
        } else {
            MappingMode::Ms
        }
    }
}

/// Reverse-complement a DNA sequence over the `ACGT` alphabet.
/// Any base outside that alphabet (e.g. `N`) is passed through unchanged.
pub fn reverse_complement(seq: &str) -> String {
    seq.chars()
        .rev()
        .map(|c| match c {
            'A' => 'T',
            'C' => 'G',
            'G' => 'C',
            'T' => 'A',
            'a' => 't',
            'c' => 'g',
            'g' => 'c',
            't' => 'a',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_read() -> Read {
        Read::new(
            "r1".to_string(),
            "chr1".to_string(),
            6524193,
            Strand::Forward,
            "5S27M2I5M10N10M15S".to_string(),
            60,
            0,
            "ATCGAAATTAGCTGGGTGTAGTGGCAGGTACCTATGGTCCTGGCTAC".to_string(),
            vec![30; 48],
        )
        .unwrap()
    }

    #[test]
    fn derives_read_and_reference_match_sizes() {
        let read = sample_read();
        assert_eq!(read.read_match_size, 44);
        assert_eq!(read.reference_match_size, 52);
        assert_eq!(read.ref_end, 6524193 + 52);
        assert_eq!(read.sms(), (5, 44, 15));
    }

    #[test]
    fn simple_mode_picks_larger_soft_clip_side() {
        let read = sample_read();
        assert_eq!(read.simple_mode(), MappingMode::Sm);
    }

    #[test]
    fn simple_mode_ties_resolve_to_sm() {
        let read = Read::new(
            "r2".to_string(),
            "chr1".to_string(),
            0,
            Strand::Forward,
            "5S10M5S".to_string(),
            60,
            0,
            "AAAAAAAAAAAAAAAAAAAA".to_string(),
            vec![30; 20],
        )
        .unwrap();
        assert_eq!(read.simple_mode(), MappingMode::Sm);
    }

    #[test]
    fn reverse_complement_round_trips() {
        assert_eq!(reverse_complement("ACGT"), "ACGT");
        assert_eq!(reverse_complement("AATTCCGG"), "CCGGAATT");
    }

    #[test]
    fn malformed_cigar_propagates_error() {
        assert!(Read::new(
            "r3".to_string(),
            "chr1".to_string(),
            0,
            Strand::Forward,
            "garbage".to_string(),
            60,
            0,
            "A".to_string(),
            vec![30],
        )
        .is_err());
    }
}
