//! The `Event` value type: a finished TDUP or INS call ready for VCF
//! emission, plus the candidate-id tuples the scanner aggregates on.

use crate::micro_region::MicroRegion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Tdup,
    Ins,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Tdup => "TDUP",
            EventType::Ins => "INS",
        }
    }
}

/// Identifies a TDUP or INS candidate during aggregation: same id ⇒ same
/// candidate, regardless of which read contributed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateId {
    pub chrom: String,
    pub ref_start: i64,
    pub size: i64,
    pub sequence: String,
    pub break_point_region: MicroRegion,
}

/// A finished TDUP/INS call.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub chrom: String,
    pub ref_start: i64,
    pub event_size: i64,
    pub event_sequence: String,
    pub event_type: EventType,
    pub original_ao: i64,
    pub ao: i64,
    pub dp: i64,
    pub af: f64,
    pub end: i64,
    pub ref_allele: String,
    pub alt_allele: String,
    pub break_point_region: MicroRegion,
}

impl Event {
    /// Build an `Event` from a candidate id and its aggregated counts.
    /// `end = ref_start + event_size` for TDUP, `end = ref_start` for INS,
    /// mirroring `Event.new`. `af` rounds `ao/dp` to 4 decimal places.
    pub fn new(
        event_type: EventType,
        id: CandidateId,
        original_ao: i64,
        ao: i64,
        dp: i64,
        ref_allele: String,
        alt_allele: String,
    ) -> Event {
        let end = match event_type {
            EventType::Tdup => id.ref_start + id.size,
            EventType::Ins => id.ref_start,
        };
        let af = (ao as f64 / dp as f64 * 10000.0).round() / 10000.0;
        Event {
            chrom: id.chrom,
            ref_start: id.ref_start,
            event_size: id.size,
            event_sequence: id.sequence,
            event_type,
            original_ao,
            ao,
            dp,
            af,
            end,
            ref_allele,
            alt_allele,
            break_point_region: id.break_point_region,
        }
    }
}
