//! Classifies the sequence found at a breakpoint as a microinsertion,
//! microhomology, or blunt end, per the `+seq`/`-seq`/plain convention
//! used by `obtain_bp_region_seq`.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MicroKind {
    Microinsertion,
    Microhomology,
    BluntEnd,
}

impl MicroKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MicroKind::Microinsertion => "microinsertion",
            MicroKind::Microhomology => "microhomology",
            MicroKind::BluntEnd => "blunt_end",
        }
    }
}

/// The sequence (if any) found between the two halves of a breakpoint,
/// tagged with its classification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MicroRegion {
    pub kind: MicroKind,
    pub sequence: String,
    pub length: usize,
}

impl MicroRegion {
    /// Parse a breakpoint-region string: a `+`-prefix marks a
    /// microinsertion, a `-`-prefix marks microhomology, anything else
    /// (including the empty string) is a blunt end.
    pub fn parse(input: &str) -> MicroRegion {
        let (kind, sequence) = if let Some(rest) = input.strip_prefix('+') {
            (MicroKind::Microinsertion, rest.to_string())
        } else if let Some(rest) = input.strip_prefix('-') {
            (MicroKind::Microhomology, rest.to_string())
        } else {
            (MicroKind::BluntEnd, String::new())
        };
        let length = sequence.len();
        MicroRegion {
            kind,
            sequence,
            length,
        }
    }
}
