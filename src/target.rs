//! Target-region specification: parses a BED file or an inline
//! `chrom:start-end` string (or list of them) into the regions the
//! scanner iterates, per `parse_target_genomic_coordinates`.

use crate::errors::ScanItdError;
use crate::interval::Interval;
use bio::io::bed;
use std::path::Path;

/// A single target region on a chromosome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRegion {
    pub chrom: String,
    pub interval: Interval,
}

impl TargetRegion {
    pub fn new(chrom: impl Into<String>, start: i64, end: i64) -> Result<TargetRegion, ScanItdError> {
        if start < 0 || end < 0 || start >= end {
            return Err(ScanItdError::InvalidRegion(format!(
                "{}:{}-{}",
                "chrom", start, end
            )));
        }
        Ok(TargetRegion {
            chrom: chrom.into(),
            interval: Interval::new(start, end),
        })
    }

    pub fn to_region_string(&self) -> String {
        format!("{}:{}-{}", self.chrom, self.interval.start, self.interval.end)
    }
}

/// Parse a target specification into the regions to scan. An empty or
/// absent `input` yields a single `None` entry meaning "whole file",
/// matching the original's `regions = [None]` fallback.
pub fn parse_target_regions(input: &str) -> Result<Vec<Option<TargetRegion>>, ScanItdError> {
    if input.is_empty() {
        return Ok(vec![None]);
    }

    if Path::new(input).is_file() {
        return parse_bed_file(input);
    }

    let mut regions = Vec::new();
    for entry in input.split('\n') {
        let entry = entry.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        regions.push(Some(parse_coordinate_entry(entry)?));
    }

    if regions.is_empty() {
        Ok(vec![None])
    } else {
        Ok(regions)
    }
}

fn parse_bed_file(path: &str) -> Result<Vec<Option<TargetRegion>>, ScanItdError> {
    let mut reader = bed::Reader::from_file(path)
        .map_err(|e| ScanItdError::InvalidRegion(format!("cannot open BED file {}: {}", path, e)))?;
    let mut regions = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ScanItdError::InvalidRegion(format!("malformed BED record: {}", e)))?;
        regions.push(Some(TargetRegion::new(
            record.chrom().to_string(),
            record.start() as i64,
            record.end() as i64,
        )?));
    }
    if regions.is_empty() {
        Ok(vec![None])
    } else {
        Ok(regions)
    }
}

fn parse_coordinate_entry(entry: &str) -> Result<TargetRegion, ScanItdError> {
    if entry.contains('\t') {
        let fields: Vec<&str> = entry.split('\t').collect();
        if fields.len() < 3 {
            return Err(ScanItdError::InvalidRegion(format!(
                "invalid BED format: {}",
                entry
            )));
        }
        let start: i64 = fields[1]
            .parse()
            .map_err(|_| ScanItdError::InvalidRegion(entry.to_string()))?;
        let end: i64 = fields[2]
            .parse()
            .map_err(|_| ScanItdError::InvalidRegion(entry.to_string()))?;
        return TargetRegion::new(fields[0], start, end);
    }

    if let (Some(colon), Some(dash)) = (entry.find(':'), entry.rfind('-')) {
        if colon < dash {
            let chrom = &entry[..colon];
            let start_str = &entry[colon + 1..dash];
            let end_str = &entry[dash + 1..];
            let start: i64 = start_str
                .parse()
                .map_err(|_| ScanItdError::InvalidRegion(entry.to_string()))?;
            let end: i64 = end_str
                .parse()
                .map_err(|_| ScanItdError::InvalidRegion(entry.to_string()))?;
            return TargetRegion::new(chrom, start, end);
        }
    }

    Err(ScanItdError::InvalidRegion(format!(
        "unrecognized format: {}",
        entry
    )))
}
