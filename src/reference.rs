//! Thin wrapper over the indexed reference FASTA, returning upper-cased
//! sequence slices (matching `pyfaidx.Fasta(..., sequence_always_upper=True)`).

use crate::errors::ScanItdError;
use rust_htslib::faidx;

pub struct GenomeReference {
    reader: faidx::Reader,
}

impl GenomeReference {
    pub fn open(path: &str) -> Result<GenomeReference, ScanItdError> {
        let reader = faidx::Reader::from_path(path)
            .map_err(|e| ScanItdError::FatalIo(format!("cannot open reference FASTA {}: {}", path, e)))?;
        Ok(GenomeReference { reader })
    }

    /// Half-open `[start, end)` fetch, upper-cased. `rust_htslib`'s
    /// `fetch_seq` takes an inclusive end, so we subtract one; an empty
    /// interval returns an empty string.
    pub fn fetch_seq(&self, chrom: &str, start: i64, end: i64) -> Result<String, ScanItdError> {
        if end <= start {
            return Ok(String::new());
        }
        let seq = self
            .reader
            .fetch_seq(chrom, start as usize, (end - 1) as usize)
            .map_err(|e| ScanItdError::TransientRegion(format!("fetch_seq({}, {}, {}): {}", chrom, start, end, e)))?;
        Ok(String::from_utf8_lossy(&seq).to_ascii_uppercase())
    }
}
