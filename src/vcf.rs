//! VCF 4.3 emitter: header assembly (contigs, INFO/FORMAT/ALT definitions,
//! aligner detection from the BAM `@PG` line) and per-event line writing.

use std::io::Write;

use chrono::Local;

use crate::config::ScanConfig;
use crate::errors::ScanItdError;
use crate::event::{Event, EventType};
use crate::micro_region::MicroKind;
use crate::scanner::BamHeaderInfo;

const RESERVED_INFO: &[(&str, &str, &str)] = &[
    ("DP", "Integer", "Total read depth at the locus"),
    ("OAO", "Integer", "Original alternate allele observations"),
    ("AO", "Integer", "Alternate allele observations"),
    (
        "AF",
        "Float",
        "Estimated allele frequency in the range (0,1], representing the ratio of reads showing the alternative allele to all reads",
    ),
    ("SVMETHOD", "String", "Type of approach used to detect SV"),
    ("SVTYPE", "String", "The type of event, TDUP, INS."),
    ("SVLEN", "Integer", "Difference in length between REF and ALT alleles"),
    ("CHR2", "String", "Chromosome for END coordinate in case of a translocation"),
    ("END", "Integer", "END coordinate in case of a translocation"),
    ("HOMSEQ", "String", "Sequence of micro-homology at event breakpoint"),
    ("INSSEQ", "String", "Sequence of micro-insertion at event breakpoint"),
    ("SEQ", "String", "Duplication/Insertion sequence"),
];

const RESERVED_FORMAT: &[(&str, &str, &str)] = &[("GT", "String", "Genotype")];

const RESERVED_ALT: &[(&str, &str)] = &[("TDUP", "Tandem duplication"), ("INS", "Insertion")];

/// `%.3g`-equivalent: round to `sig_digits` significant figures, fixed
/// notation, trailing zeros stripped (matches Python's `f"{af:.3g}"`).
fn format_significant(value: f64, sig_digits: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let decimal_places = (sig_digits as i32 - 1 - magnitude).max(0) as usize;
    let formatted = format!("{:.*}", decimal_places, value);
    if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        formatted
    }
}

const KNOWN_ALIGNERS: &[&str] = &[
    "CLC",
    "CONTEXTMAP2",
    "CRAC",
    "GSNAP",
    "NOVOALIGN",
    "OLEGO",
    "RUM",
    "SUBREAD",
    "BWA",
    "BOWTIE",
    "BOWTIE2",
];

/// Writes the VCF header and per-event records to a file, keeping one
/// monotonically increasing event id across calls.
pub struct VcfWriter<W: Write> {
    out: W,
    sample_name: String,
    event_id: u64,
}

impl<W: Write> VcfWriter<W> {
    pub fn new(out: W, sample_name: impl Into<String>) -> VcfWriter<W> {
        VcfWriter {
            out,
            sample_name: sample_name.into(),
            event_id: 1,
        }
    }

    pub fn write_header(&mut self, header_info: &BamHeaderInfo) -> Result<(), ScanItdError> {
        let date = Local::now().format("%Y%m%d").to_string();
        let reference = header_info.aligner_cl.clone().unwrap_or_else(|| "Unknown".to_string());

        let mut lines = vec![
            "##fileformat=VCFv4.3".to_string(),
            format!("##fileDate={}", date),
            format!("##source=ScanITDv{}", env!("CARGO_PKG_VERSION")),
            format!("##reference=<CMD={},Description=\"Alignment parameters\">", reference),
        ];

        for (name, len) in &header_info.contigs {
            lines.push(format!("##contig=<ID={},length={}>", name, len));
        }

        for (id, ty, desc) in RESERVED_INFO {
            lines.push(format!(
                "##INFO=<ID={},Number=1,Type={},Description=\"{}\">",
                id, ty, desc
            ));
        }
        for (id, ty, desc) in RESERVED_FORMAT {
            lines.push(format!(
                "##FORMAT=<ID={},Number=1,Type={},Description=\"{}\">",
                id, ty, desc
            ));
        }
        for (id, desc) in RESERVED_ALT {
            lines.push(format!("##ALT=<ID={},Description=\"{}\">", id, desc));
        }

        lines.push(format!(
            "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}",
            self.sample_name
        ));

        writeln!(self.out, "{}", lines.join("\n")).map_err(|e| ScanItdError::FatalIo(e.to_string()))
    }

    /// Write one event as a VCF data line, applying the config's `-c/-d/-f`
    /// output filter first. Returns `Ok(false)` when the event is filtered
    /// out (not written), `Ok(true)` when written.
    pub fn write_event(&mut self, event: &Event, config: &ScanConfig) -> Result<bool, ScanItdError> {
        if !config.passes_output_filter(event.ao, event.dp, event.af) {
            return Ok(false);
        }

        let micro_insertion = if event.break_point_region.kind == MicroKind::Microinsertion {
            event.break_point_region.sequence.as_str()
        } else {
            "."
        };
        let micro_homology = if event.break_point_region.kind == MicroKind::Microhomology {
            event.break_point_region.sequence.as_str()
        } else {
            "."
        };

        let info = format!(
            "SVTYPE={};OAO={};AO={};CHR2={};END={};DP={};AF={};SVLEN={};INSSEQ={};HOMSEQ={};SEQ={};SVMETHOD=ScanITD2",
            event.event_type.as_str(),
            event.original_ao,
            event.ao,
            event.chrom,
            event.end + 1,
            event.dp,
            format_significant(event.af, 3),
            event.event_size,
            micro_insertion,
            micro_homology,
            event.event_sequence,
        );

        let fields = [
            event.chrom.as_str(),
            &(event.ref_start + 1).to_string(),
            &self.event_id.to_string(),
            event.ref_allele.as_str(),
            event.alt_allele.as_str(),
            ".",
            ".",
            info.as_str(),
            "GT",
            "0/1",
        ];

        writeln!(self.out, "{}", fields.join("\t")).map_err(|e| ScanItdError::FatalIo(e.to_string()))?;
        self.event_id += 1;
        Ok(true)
    }

    pub fn write_events(&mut self, events: &[Event], config: &ScanConfig) -> Result<usize, ScanItdError> {
        let mut written = 0;
        for event in events {
            if matches!(event.event_type, EventType::Tdup | EventType::Ins) && self.write_event(event, config)? {
                written += 1;
            }
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CandidateId;
    use crate::micro_region::MicroRegion;

    fn sample_event(ao: i64, dp: i64) -> Event {
        let id = CandidateId {
            chrom: "chr1".to_string(),
            ref_start: 100,
            size: 10,
            sequence: "ACGTACGTAC".to_string(),
            break_point_region: MicroRegion::parse("+TT"),
        };
        Event::new(EventType::Tdup, id, ao, ao, dp, "A".to_string(), "A".to_string())
    }

    #[test]
    fn header_contains_expected_sections() {
        let mut buf = Vec::new();
        let mut writer = VcfWriter::new(&mut buf, "sample1");
        let info = BamHeaderInfo {
            contigs: vec![("chr1".to_string(), 1000)],
            aligner_cl: Some("bwa mem ref.fa reads.fq".to_string()),
        };
        writer.write_header(&info).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("##fileformat=VCFv4.3"));
        assert!(text.contains("##contig=<ID=chr1,length=1000>"));
        assert!(text.contains("##ALT=<ID=TDUP"));
        assert!(text.contains("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tsample1"));
    }

    #[test]
    fn event_below_output_filter_is_skipped() {
        let mut buf = Vec::new();
        let mut writer = VcfWriter::new(&mut buf, "sample1");
        let config = ScanConfig::new(
            "in.bam".to_string(),
            "ref.fa".to_string(),
            "out.vcf".to_string(),
            15,
            4,
            10,
            0.1,
            10,
            1,
            2,
            20,
            String::new(),
            "info".to_string(),
        );
        let event = sample_event(1, 2);
        assert!(!writer.write_event(&event, &config).unwrap());
        assert!(buf.is_empty());
    }

    #[test]
    fn passing_event_writes_one_line_with_expected_info_order() {
        let mut buf = Vec::new();
        let mut writer = VcfWriter::new(&mut buf, "sample1");
        let config = ScanConfig::new(
            "in.bam".to_string(),
            "ref.fa".to_string(),
            "out.vcf".to_string(),
            15,
            4,
            10,
            0.1,
            10,
            1,
            2,
            20,
            String::new(),
            "info".to_string(),
        );
        let event = sample_event(5, 10);
        assert!(writer.write_event(&event, &config).unwrap());
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("chr1\t101\t1\tA\tA\t.\t.\tSVTYPE=TDUP;OAO=5;AO=5;"));
        assert!(text.contains("INSSEQ=TT;HOMSEQ=.;"));
    }
}
