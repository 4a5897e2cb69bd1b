//! Split-read (SA-tag) handler: given a representative alignment and its
//! single supplementary alignment, decides whether the pair describes a
//! tandem duplication and, if so, in which orientation.

use crate::errors::ScanItdError;
use crate::interval::Strand;
use crate::micro_region::MicroRegion;
use crate::read::{MappingMode, Read};
use crate::reference::GenomeReference;

/// Parsed orientation-neutral outcome of a split-read pair: the junction
/// coordinates, the two reads in lt/rt order, their breakpoint-region
/// sequences, and their strands — everything the scanner needs to build
/// a `tdup_anchors` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitReadTdup {
    pub chrom: String,
    pub junction_start: i64,
    pub junction_end: i64,
    pub lt_read: (i64, i64),
    pub rt_read: (i64, i64),
    pub lt_bp_seq: String,
    pub rt_bp_seq: String,
    pub lt_strand: Strand,
    pub rt_strand: Strand,
}

/// Parse the `chrm,pos,strand,cigar,mapq,nm` SA-tag entry (one segment).
/// `pos` is 1-based in the tag and is converted to 0-based here.
pub fn parse_sa_tag(entry: &str) -> Result<(String, i64, char, String, u8, i64), ScanItdError> {
    let fields: Vec<&str> = entry.split(',').collect();
    if fields.len() != 6 {
        return Err(ScanItdError::MalformedCigar(format!(
            "malformed SA tag entry: {}",
            entry
        )));
    }
    let chrom = fields[0].to_string();
    let pos: i64 = fields[1]
        .parse::<i64>()
        .map_err(|_| ScanItdError::MalformedCigar(entry.to_string()))?
        - 1;
    let strand = fields[2]
        .chars()
        .next()
        .ok_or_else(|| ScanItdError::MalformedCigar(entry.to_string()))?;
    let cigar = fields[3].to_string();
    let mapq: u8 = fields[4]
        .parse()
        .map_err(|_| ScanItdError::MalformedCigar(entry.to_string()))?;
    let nm: i64 = fields[5]
        .parse()
        .map_err(|_| ScanItdError::MalformedCigar(entry.to_string()))?;
    Ok((chrom, pos, strand, cigar, mapq, nm))
}

/// Query sequence to use for the supplementary alignment: the
/// representative read's sequence as-is if both segments share a
/// strand, else its reverse complement.
pub fn sa_query_seq_from_ra(seq_ra: &str, strand_ra: char, strand_sa: char) -> String {
    if strand_ra == strand_sa {
        seq_ra.to_string()
    } else {
        crate::read::reverse_complement(seq_ra)
    }
}

/// Per-base qualities to use for the supplementary alignment: the
/// representative read's qualities as-is if both segments share a
/// strand, else reversed (not complemented — qualities have no
/// complement) to match the reverse-complemented sequence.
pub fn sa_query_qual_from_ra(qual_ra: &[u8], strand_ra: char, strand_sa: char) -> Vec<u8> {
    if strand_ra == strand_sa {
        qual_ra.to_vec()
    } else {
        qual_ra.iter().rev().copied().collect()
    }
}

/// Extract the breakpoint-region sequence of `read` (classified as
/// microinsertion `+seq`, microhomology `-seq`, or blunt) given the
/// signed `bp_region_seq_len` computed by the caller.
pub fn obtain_bp_region_seq(
    read: &Read,
    mode: MappingMode,
    bp_region_seq_len: i64,
    genome: &GenomeReference,
) -> Result<String, ScanItdError> {
    if bp_region_seq_len > 0 {
        let len = bp_region_seq_len as usize;
        let seq = match mode {
            MappingMode::Sm => {
                let lt_clip: &str = &read.query_sequence[..read.lt_soft_len as usize];
                tail_str(lt_clip, len)
            }
            MappingMode::Ms => {
                let rt_clip: &str =
                    &read.query_sequence[read.query_sequence.len() - read.rt_soft_len as usize..];
                head_str(rt_clip, len)
            }
            MappingMode::Type0 => String::new(),
        };
        Ok(format!("+{}", seq))
    } else if bp_region_seq_len < 0 {
        let seq = match mode {
            MappingMode::Sm => {
                genome.fetch_seq(&read.chrom, read.ref_start, read.ref_start - bp_region_seq_len)?
            }
            MappingMode::Ms => {
                genome.fetch_seq(&read.chrom, read.ref_end + bp_region_seq_len, read.ref_end)?
            }
            MappingMode::Type0 => String::new(),
        };
        Ok(format!("-{}", seq))
    } else {
        Ok(String::new())
    }
}

fn tail_str(s: &str, n: usize) -> String {
    let n = n.min(s.len());
    s[s.len() - n..].to_string()
}

fn head_str(s: &str, n: usize) -> String {
    let n = n.min(s.len());
    s[..n].to_string()
}

/// Whether `read`'s soft-clipped length is *less than* the inferred
/// event size plus the breakpoint-region length — if true, treat the
/// locus as a TDUP (§4.2). Checks the left clip for `Sm` mode, the
/// right clip otherwise.
fn softclipped_length_and_event_size_checker(
    read: &Read,
    mode: MappingMode,
    event_size: i64,
    bp_region_seq_len: i64,
) -> bool {
    if mode == MappingMode::Sm {
        read.lt_soft_len < event_size + bp_region_seq_len
    } else {
        read.rt_soft_len < event_size + bp_region_seq_len
    }
}

/// Dispatches on the pair's soft-clip modes: only `(Sm, Ms)` and
/// `(Ms, Sm)` combinations describe a tandem duplication; any other
/// combination yields no candidate.
pub fn same_chrom_same_strand_handler(
    read_a: &Read,
    read_b: &Read,
    mode_a: MappingMode,
    mode_b: MappingMode,
    genome: &GenomeReference,
    microinsertion_cutoff: i64,
) -> Result<Option<(SplitReadTdup, MicroRegion)>, ScanItdError> {
    if mode_a == MappingMode::Sm && mode_b == MappingMode::Ms {
        mode21_handler(read_a, read_b, mode_a, mode_b, genome, microinsertion_cutoff, false)
    } else if mode_a == MappingMode::Ms && mode_b == MappingMode::Sm {
        mode21_handler(read_b, read_a, mode_b, mode_a, genome, microinsertion_cutoff, true)
    } else {
        Ok(None)
    }
}

#[allow(clippy::too_many_arguments)]
fn mode21_handler(
    read_lt: &Read,
    read_rt: &Read,
    lt_mode: MappingMode,
    rt_mode: MappingMode,
    genome: &GenomeReference,
    microinsertion_cutoff: i64,
    is_reverse: bool,
) -> Result<Option<(SplitReadTdup, MicroRegion)>, ScanItdError> {
    let lt_chrom = read_lt.chrom.clone();

    let target_start = read_rt.ref_start;
    let target_end = read_lt.ref_end;
    let target_offset = target_end - target_start;

    let bp_region_seq_len = read_lt.query_length
        - read_lt.rt_soft_len
        - read_rt.lt_soft_len
        - read_lt.read_match_size
        - read_rt.read_match_size;

    if bp_region_seq_len > microinsertion_cutoff {
        return Ok(None);
    }

    let query_offset = if bp_region_seq_len > 0 {
        read_lt.reference_match_size + read_rt.reference_match_size
    } else {
        read_lt.reference_match_size + read_rt.reference_match_size + bp_region_seq_len
    };

    let lt_bp_seq = obtain_bp_region_seq(read_lt, lt_mode, bp_region_seq_len, genome)?;
    let rt_bp_seq = obtain_bp_region_seq(read_rt, rt_mode, bp_region_seq_len, genome)?;

    let evt_size = query_offset - target_offset;

    if evt_size <= 0 {
        // Deletion, not a duplication.
        return Ok(None);
    }
    if evt_size < query_offset {
        // Read is longer than the inferred duplication; both outcomes of
        // this check are accepted as TDUP (see §9.1), it only changes the
        // trace message.
        if softclipped_length_and_event_size_checker(read_lt, lt_mode, evt_size, bp_region_seq_len) {
            log::trace!("softclipped length < event size: TDUP");
        } else {
            log::trace!("softclipped length >= event size: TDUP");
        }
    }

    let junc_start = read_lt.ref_start;
    let junc_end = junc_start + evt_size;

    let break_point_region = MicroRegion::parse(&lt_bp_seq);

    let outcome = if !is_reverse {
        SplitReadTdup {
            chrom: lt_chrom,
            junction_start: junc_start,
            junction_end: junc_end,
            lt_read: (read_lt.ref_start, read_lt.ref_end),
            rt_read: (read_rt.ref_start, read_rt.ref_end),
            lt_bp_seq,
            rt_bp_seq,
            lt_strand: read_lt.strand,
            rt_strand: read_rt.strand,
        }
    } else {
        SplitReadTdup {
            chrom: lt_chrom,
            junction_start: junc_start,
            junction_end: junc_end,
            lt_read: (read_rt.ref_start, read_rt.ref_end),
            rt_read: (read_lt.ref_start, read_lt.ref_end),
            lt_bp_seq: rt_bp_seq,
            rt_bp_seq: lt_bp_seq,
            lt_strand: read_rt.strand,
            rt_strand: read_lt.strand,
        }
    };

    Ok(Some((outcome, break_point_region)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sa_tag_parses_and_converts_to_zero_based() {
        let (chrom, pos, strand, cigar, mapq, nm) =
            parse_sa_tag("chr1,100,+,10M,60,0").unwrap();
        assert_eq!(chrom, "chr1");
        assert_eq!(pos, 99);
        assert_eq!(strand, '+');
        assert_eq!(cigar, "10M");
        assert_eq!(mapq, 60);
        assert_eq!(nm, 0);
    }

    #[test]
    fn sa_query_seq_same_strand_is_unchanged() {
        assert_eq!(sa_query_seq_from_ra("ACGT", '+', '+'), "ACGT");
    }

    #[test]
    fn sa_query_seq_opposite_strand_is_reverse_complemented() {
        assert_eq!(sa_query_seq_from_ra("ACGT", '+', '-'), "ACGT");
        assert_eq!(sa_query_seq_from_ra("AATT", '+', '-'), "AATT");
        assert_eq!(sa_query_seq_from_ra("AACC", '+', '-'), "GGTT");
    }

    #[test]
    fn malformed_sa_tag_is_rejected() {
        assert!(parse_sa_tag("chr1,100,+").is_err());
    }
}
