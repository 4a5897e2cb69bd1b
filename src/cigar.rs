//! CIGAR string parsing and the derived-quantity summary used throughout
//! the caller. Operates purely on the textual CIGAR representation so that
//! the same code can be driven off `Record::cigar().to_string()` (BAM
//! reads) or a freestanding literal (the in-CIGAR insertion landmark
//! search in the scanner).

use crate::errors::ScanItdError;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref CIGAR_TOKEN: Regex = Regex::new(r"(\d+)([MIDNSHP=XB])").unwrap();
    static ref CIGAR_FULL: Regex = Regex::new(r"^(\d+[MIDNSHP=XB])+$").unwrap();
}

/// One CIGAR operation, ordered to match the SAM spec's `MIDNSHP=XB` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CigarOp {
    Match,
    Ins,
    Del,
    RefSkip,
    SoftClip,
    HardClip,
    Pad,
    Equal,
    Diff,
}

impl CigarOp {
    fn from_char(c: char) -> Option<CigarOp> {
        match c {
            'M' => Some(CigarOp::Match),
            'I' => Some(CigarOp::Ins),
            'D' => Some(CigarOp::Del),
            'N' => Some(CigarOp::RefSkip),
            'S' => Some(CigarOp::SoftClip),
            'H' => Some(CigarOp::HardClip),
            'P' => Some(CigarOp::Pad),
            '=' => Some(CigarOp::Equal),
            'X' => Some(CigarOp::Diff),
            _ => None,
        }
    }

    fn consumes_query(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Ins | CigarOp::SoftClip | CigarOp::Equal | CigarOp::Diff
        )
    }

    fn consumes_reference(self) -> bool {
        matches!(
            self,
            CigarOp::Match | CigarOp::Del | CigarOp::RefSkip | CigarOp::Equal | CigarOp::Diff
        )
    }
}

/// Derived quantities from a parsed CIGAR string, per spec §3/§4.1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CigarSummary {
    pub ops: Vec<(CigarOp, u32)>,
    pub cigar_no_soft: Vec<(CigarOp, u32)>,
    pub read_match: i64,
    pub ref_match: i64,
    pub indel_len: i64,
    pub query_len: i64,
    pub lt_soft_len: i64,
    pub rt_soft_len: i64,
}

/// Parse a CIGAR string (e.g. `"5S27M15S"`) into its derived summary.
///
/// Traverses the op list once. `=`/`X` are folded into `Match`-equivalent
/// accounting (both consume query and reference bases identically to `M`
/// for every aggregate tracked here); `H`/`P` contribute to neither.
pub fn parse_cigar(cigar: &str) -> Result<CigarSummary, ScanItdError> {
    if cigar.is_empty() || !CIGAR_FULL.is_match(cigar) {
        return Err(ScanItdError::MalformedCigar(cigar.to_string()));
    }

    let mut ops = Vec::new();
    let mut cigar_no_soft = Vec::new();
    let mut read_match = 0i64;
    let mut ref_match = 0i64;
    let mut indel_len = 0i64;
    let mut query_len = 0i64;

    for cap in CIGAR_TOKEN.captures_iter(cigar) {
        let len: u32 = cap[1].parse().expect("regex guarantees digits");
        let op_char = cap[2].chars().next().expect("regex guarantees one char");
        let op = CigarOp::from_char(op_char).expect("regex guarantees valid op");
        ops.push((op, len));

        match op {
            CigarOp::Match | CigarOp::Equal | CigarOp::Diff => {
                ref_match += len as i64;
                read_match += len as i64;
                query_len += len as i64;
                cigar_no_soft.push((op, len));
            }
            CigarOp::Ins => {
                indel_len -= len as i64;
                read_match += len as i64;
                query_len += len as i64;
                cigar_no_soft.push((op, len));
            }
            CigarOp::Del | CigarOp::RefSkip => {
                indel_len += len as i64;
                ref_match += len as i64;
                cigar_no_soft.push((op, len));
            }
            CigarOp::SoftClip => {
                query_len += len as i64;
            }
            CigarOp::HardClip | CigarOp::Pad => {}
        }
    }

    if ops.is_empty() {
        return Err(ScanItdError::MalformedCigar(cigar.to_string()));
    }

    let lt_soft_len = if ops[0].0 == CigarOp::SoftClip {
        ops[0].1 as i64
    } else {
        0
    };
    let rt_soft_len = if ops[ops.len() - 1].0 == CigarOp::SoftClip {
        ops[ops.len() - 1].1 as i64
    } else {
        0
    };

    Ok(CigarSummary {
        ops,
        cigar_no_soft,
        read_match,
        ref_match,
        indel_len,
        query_len,
        lt_soft_len,
        rt_soft_len,
    })
}

/// Reference position of the `nI` landmark matched by
/// `\d+M{insertion_size}I\d+M` in `cigar`: the sum of all reference-
/// consuming op lengths up to (not including) the insertion, minus one.
/// Returns `None` if the landmark is absent.
pub fn insertion_reference_pos(cigar: &str, read_pos: i64, insertion_size: u32) -> Option<i64> {
    let pattern = Regex::new(&format!(r"(\d+)M{}I(\d+)M", insertion_size)).ok()?;
    let m = pattern.find(cigar)?;
    let prefix = &cigar[..m.start()];

    let mut pos = read_pos;
    for cap in CIGAR_TOKEN.captures_iter(prefix) {
        let len: i64 = cap[1].parse().ok()?;
        let op = CigarOp::from_char(cap[2].chars().next()?)?;
        if op.consumes_reference() {
            pos += len;
        }
    }
    // Account for the M immediately preceding the insertion in `m`.
    let leading_m: i64 = pattern
        .captures(cigar)?
        .get(1)?
        .as_str()
        .parse()
        .ok()?;
    pos += leading_m;

    Some(pos - 1)
}
