//! Rotational self-loop checker: decides whether an in-CIGAR insertion is
//! really a tandem duplication by rotating the inserted sequence against
//! its flanking reference and looking for a bounded-mismatch match.

/// Python-style slice: negative-from-`len` clamping on both bounds, no
/// panics on out-of-range indices. `start`/`end` of `None` behave like a
/// bare `s[:]` side.
fn py_slice(s: &[u8], start: Option<i64>, end: Option<i64>) -> &[u8] {
    let len = s.len() as i64;
    let norm = |idx: i64, default: i64| -> i64 {
        let idx = if idx < 0 { idx + len } else { idx };
        idx.clamp(0, len).max(default.min(0))
    };
    let start = norm(start.unwrap_or(0), 0).clamp(0, len);
    let end = norm(end.unwrap_or(len), len).clamp(0, len);
    if start >= end {
        &s[0..0]
    } else {
        &s[start as usize..end as usize]
    }
}

fn tail(s: &[u8], count: i64) -> &[u8] {
    py_slice(s, Some(-count), None)
}

fn head(s: &[u8], count: i64) -> &[u8] {
    py_slice(s, None, Some(count))
}

fn count_mismatches(a: &[u8], b: &[u8]) -> usize {
    let min_len = a.len().min(b.len());
    let overlap_mismatches = (0..min_len).filter(|&i| a[i] != b[i]).count();
    overlap_mismatches + (a.len() as i64 - b.len() as i64).unsigned_abs() as usize
}

fn rotate_right(seq: &[u8]) -> Vec<u8> {
    if seq.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(seq.len());
    out.push(seq[seq.len() - 1]);
    out.extend_from_slice(&seq[..seq.len() - 1]);
    out
}

fn rotate_left(seq: &[u8]) -> Vec<u8> {
    if seq.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(seq.len());
    out.extend_from_slice(&seq[1..]);
    out.push(seq[0]);
    out
}

/// `(is_tandem_duplication, rotation_offset, matched_combo_sequence)`.
///
/// Rolls `insertion_seq` first rightward then leftward against a
/// `left_seq || right_seq` window, accepting the first rotation whose
/// Hamming-plus-length-difference mismatch count is within
/// `allowed_mismatches`.
pub fn self_loop_checker(
    insertion_seq: &str,
    left_seq: &str,
    right_seq: &str,
    allowed_mismatches: usize,
) -> (bool, i64, String) {
    let insertion_bytes = insertion_seq.as_bytes();
    let left_bytes = left_seq.as_bytes();
    let right_bytes = right_seq.as_bytes();
    let ins_len = insertion_bytes.len() as i64;
    let steps = if ins_len % 2 == 0 {
        ins_len / 2
    } else {
        ins_len / 2 + 1
    };

    let mut ins_seq = insertion_bytes.to_vec();
    let mut k = 1i64;
    for _ in 0..steps {
        ins_seq = rotate_right(&ins_seq);
        let mut combo = tail(left_bytes, k).to_vec();
        combo.extend_from_slice(head(right_bytes, ins_len - k));
        if count_mismatches(&ins_seq, &combo) <= allowed_mismatches {
            return (true, k, String::from_utf8_lossy(&combo).into_owned());
        }
        k += 1;
    }

    let mut ins_seq = insertion_bytes.to_vec();
    let mut k = 1i64;
    for _ in 0..steps {
        ins_seq = rotate_left(&ins_seq);
        let mut combo = tail(left_bytes, ins_len - k).to_vec();
        combo.extend_from_slice(head(right_bytes, k));
        if count_mismatches(&ins_seq, &combo) <= allowed_mismatches {
            return (true, ins_len - k, String::from_utf8_lossy(&combo).into_owned());
        }
        k += 1;
    }

    (false, 0, String::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_tandem_duplication_is_detected() {
        // "AC" inserted, flanked so that rotating finds an exact match.
        let (is_dup, _offset, combo) = self_loop_checker("AC", "XXAC", "ACYY", 0);
        assert!(is_dup);
        assert!(!combo.is_empty());
    }

    #[test]
    fn unrelated_insertion_is_not_a_duplication() {
        let (is_dup, offset, combo) = self_loop_checker("GGGGGG", "AAAA", "TTTT", 0);
        assert!(!is_dup);
        assert_eq!(offset, 0);
        assert_eq!(combo, "");
    }

    #[test]
    fn mismatches_within_budget_still_count_as_duplication() {
        let (is_dup, _offset, _combo) = self_loop_checker("ACGT", "XXAC", "ACGG", 2);
        assert!(is_dup);
    }

    #[test]
    fn count_mismatches_penalizes_length_difference() {
        assert_eq!(count_mismatches(b"AAAA", b"AAAAAA"), 2);
        assert_eq!(count_mismatches(b"AAAA", b"AAAA"), 0);
        assert_eq!(count_mismatches(b"AAAA", b"AAAT"), 1);
    }
}
