//! Soft-clip rescue: confirms additional supporting reads for a TDUP
//! candidate by local (Smith–Waterman) alignment against a synthesized
//! duplication-spanning reference window.

use crate::micro_region::{MicroKind, MicroRegion};
use crate::read::MappingMode;
use bio::alignment::pairwise::Aligner;
use bio::alignment::AlignmentOperation;

const MATCH_SCORE: i32 = 2;
const MISMATCH_SCORE: i32 = -2;
const GAP_OPEN: i32 = -3;
const GAP_EXTEND: i32 = -1;

fn score(a: u8, b: u8) -> i32 {
    if a == b {
        MATCH_SCORE
    } else {
        MISMATCH_SCORE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct VariantTally {
    insertions: usize,
    deletions: usize,
    snvs: usize,
    mismatches: usize,
}

/// Build the reference window for a TDUP candidate `(s, n)` with
/// breakpoint region `br`, for one of the two oriented rescue checks.
pub fn build_reference_window(
    window: &str,
    mode: MappingMode,
    br: &MicroRegion,
) -> String {
    match (mode, br.kind) {
        (MappingMode::Sm, MicroKind::Microinsertion) => format!("{}{}", window, br.sequence),
        (MappingMode::Sm, MicroKind::Microhomology) => {
            window[..window.len().saturating_sub(br.length)].to_string()
        }
        (MappingMode::Ms, MicroKind::Microinsertion) => format!("{}{}", br.sequence, window),
        (MappingMode::Ms, MicroKind::Microhomology) => {
            window[br.length.min(window.len())..].to_string()
        }
        _ => window.to_string(),
    }
}

/// Local-align `query` against `reference_seq` and decide whether it
/// supports the junction implied by `read_mode`: reaching the trailing
/// edge of both sequences for `Sm`, the leading edge for `Ms`, with a
/// mismatch tally at or below `mismatches_cutoff`.
pub fn alignment_operation(
    query: &str,
    reference_seq: &str,
    read_mode: MappingMode,
    mismatches_cutoff: usize,
) -> bool {
    if query.is_empty() || reference_seq.is_empty() {
        return false;
    }

    // `x` is the query (read), `y` is the synthesized reference window.
    let mut aligner = Aligner::new(GAP_OPEN, GAP_EXTEND, &score);
    let alignment = aligner.local(query.as_bytes(), reference_seq.as_bytes());

    let tally = calculate_variants(
        &alignment.operations,
        reference_seq.as_bytes(),
        query.as_bytes(),
        alignment.ystart,
        alignment.xstart,
    );

    if tally.mismatches > mismatches_cutoff {
        return false;
    }

    match read_mode {
        MappingMode::Sm => alignment.yend == reference_seq.len() && alignment.xend == query.len(),
        MappingMode::Ms => alignment.ystart == 0 && alignment.xstart == 0,
        MappingMode::Type0 => false,
    }
}

fn calculate_variants(
    ops: &[AlignmentOperation],
    reference_seq: &[u8],
    query_seq: &[u8],
    mut ref_pos: usize,
    mut read_pos: usize,
) -> VariantTally {
    let mut tally = VariantTally::default();
    let mut in_ins_run = false;
    let mut in_del_run = false;
    for op in ops {
        match op {
            AlignmentOperation::Match => {
                in_ins_run = false;
                in_del_run = false;
                if read_pos < query_seq.len() && ref_pos < reference_seq.len() {
                    if query_seq[read_pos] != reference_seq[ref_pos] {
                        tally.snvs += 1;
                        tally.mismatches += 1;
                    }
                }
                read_pos += 1;
                ref_pos += 1;
            }
            AlignmentOperation::Subst => {
                in_ins_run = false;
                in_del_run = false;
                tally.snvs += 1;
                tally.mismatches += 1;
                read_pos += 1;
                ref_pos += 1;
            }
            AlignmentOperation::Ins => {
                in_del_run = false;
                if !in_ins_run {
                    tally.insertions += 1;
                    in_ins_run = true;
                }
                tally.mismatches += 1;
                read_pos += 1;
            }
            AlignmentOperation::Del => {
                in_ins_run = false;
                if !in_del_run {
                    tally.deletions += 1;
                    in_del_run = true;
                }
                tally.mismatches += 1;
                ref_pos += 1;
            }
            AlignmentOperation::Xclip(len) => {
                in_ins_run = false;
                in_del_run = false;
                read_pos += len;
            }
            AlignmentOperation::Yclip(len) => {
                in_ins_run = false;
                in_del_run = false;
                ref_pos += len;
            }
        }
    }
    tally
}

/// Count of query sequences in `candidates` that are accepted as
/// supporting the TDUP junction described by `reference_seq`/`read_mode`.
pub fn rescue_count<'a>(
    candidates: impl Iterator<Item = &'a str>,
    reference_seq: &str,
    read_mode: MappingMode,
    mismatches_cutoff: usize,
) -> i64 {
    candidates
        .filter(|q| alignment_operation(q, reference_seq, read_mode, mismatches_cutoff))
        .count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sm_side_accepts_exact_suffix_match() {
        let reference = "ACGTACGTAC";
        let query = "GTACGTAC";
        assert!(alignment_operation(query, reference, MappingMode::Sm, 0));
    }

    #[test]
    fn ms_side_accepts_exact_prefix_match() {
        let reference = "ACGTACGTAC";
        let query = "ACGTACG";
        assert!(alignment_operation(query, reference, MappingMode::Ms, 0));
    }

    #[test]
    fn unrelated_query_is_rejected() {
        let reference = "ACGTACGTAC";
        let query = "TTTTTTTT";
        assert!(!alignment_operation(query, reference, MappingMode::Sm, 1));
    }

    #[test]
    fn microinsertion_window_appends_sequence() {
        let br = MicroRegion::parse("+TT");
        let window = build_reference_window("ACGT", MappingMode::Sm, &br);
        assert_eq!(window, "ACGTTT");
    }

    #[test]
    fn microhomology_window_trims_from_the_relevant_end() {
        let br = MicroRegion::parse("-AC");
        let sm_window = build_reference_window("ACGTAC", MappingMode::Sm, &br);
        assert_eq!(sm_window, "ACGT");
        let ms_window = build_reference_window("ACGTAC", MappingMode::Ms, &br);
        assert_eq!(ms_window, "GTAC");
    }
}
