//! Two-pass scanner: pass 1 collects split-read (SA-tag) TDUP anchors,
//! pass 2 walks the pileup to aggregate TDUP/INS candidates, pooling
//! soft-clipped rescue sequences along the way.

use std::collections::{HashMap, HashSet};

use rust_htslib::bam::record::Aux;
use rust_htslib::bam::{self, Read as BamRead};

use crate::cigar::insertion_reference_pos;
use crate::config::ScanConfig;
use crate::errors::ScanItdError;
use crate::event::{CandidateId, Event, EventType};
use crate::interval::Strand;
use crate::micro_region::MicroRegion;
use crate::read::{MappingMode, Read};
use crate::reference::GenomeReference;
use crate::rescue::{alignment_operation, build_reference_window};
use crate::self_loop::self_loop_checker;
use crate::split_read::{parse_sa_tag, same_chrom_same_strand_handler, sa_query_qual_from_ra, sa_query_seq_from_ra};
use crate::target::TargetRegion;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TdupAnchor {
    chrom: String,
    ref_start: i64,
    ref_end: i64,
    strand: char,
    break_point_region: MicroRegion,
}

type RescuePoolKey = (String, i64, MappingMode);

fn aux_i64(record: &bam::Record, tag: &[u8]) -> i64 {
    match record.aux(tag) {
        Ok(Aux::I8(v)) => v as i64,
        Ok(Aux::U8(v)) => v as i64,
        Ok(Aux::I16(v)) => v as i64,
        Ok(Aux::U16(v)) => v as i64,
        Ok(Aux::I32(v)) => v as i64,
        Ok(Aux::U32(v)) => v as i64,
        _ => 0,
    }
}

fn aux_str<'a>(record: &'a bam::Record, tag: &[u8]) -> Option<String> {
    match record.aux(tag) {
        Ok(Aux::String(s)) => Some(s.to_string()),
        _ => None,
    }
}

fn record_strand(record: &bam::Record) -> char {
    if record.is_reverse() {
        '-'
    } else {
        '+'
    }
}

fn record_to_read(record: &bam::Record, chrom: String) -> Result<Read, ScanItdError> {
    let qname = String::from_utf8_lossy(record.qname()).into_owned();
    let cigar = record.cigar().to_string();
    let seq = String::from_utf8_lossy(&record.seq().as_bytes()).into_owned();
    let qual = record.qual().to_vec();
    let strand = Strand::from_is_reverse(record.is_reverse());
    Read::new(
        qname,
        chrom,
        record.pos(),
        strand,
        cigar,
        record.mapq(),
        aux_i64(record, b"NM"),
        seq,
        qual,
    )
}

/// Drives both passes of the scanner and produces the sorted event list
/// and the set of contigs/aligner-CL metadata the VCF header needs.
pub struct BamScanner {
    config: ScanConfig,
    genome: GenomeReference,
}

/// Header metadata the VCF emitter needs from the alignment file.
pub struct BamHeaderInfo {
    pub contigs: Vec<(String, u64)>,
    pub aligner_cl: Option<String>,
}

impl BamScanner {
    pub fn new(config: ScanConfig) -> Result<BamScanner, ScanItdError> {
        let genome = GenomeReference::open(&config.ref_fasta)?;
        Ok(BamScanner { config, genome })
    }

    fn open_reader(&self) -> Result<bam::IndexedReader, ScanItdError> {
        bam::IndexedReader::from_path(&self.config.input_bam)
            .map_err(|e| ScanItdError::FatalIo(format!("cannot open BAM {}: {}", self.config.input_bam, e)))
    }

    fn check_sorted(&self, reader: &bam::IndexedReader) -> Result<(), ScanItdError> {
        let text = String::from_utf8_lossy(reader.header().as_bytes()).into_owned();
        let sorted = text
            .lines()
            .find(|l| l.starts_with("@HD"))
            .map(|l| l.contains("SO:coordinate"))
            .unwrap_or(false);
        if !sorted {
            return Err(ScanItdError::FatalIo(format!(
                "BAM file {} is not coordinate-sorted",
                self.config.input_bam
            )));
        }
        Ok(())
    }

    fn header_info(&self, reader: &bam::IndexedReader) -> BamHeaderInfo {
        let header = reader.header();
        let contigs: Vec<(String, u64)> = header
            .target_names()
            .iter()
            .enumerate()
            .map(|(tid, name)| {
                (
                    String::from_utf8_lossy(name).into_owned(),
                    header.target_len(tid as u32).unwrap_or(0),
                )
            })
            .collect();

        let text = String::from_utf8_lossy(header.as_bytes()).into_owned();
        let mut aligner_cl = None;
        let known_aligners = [
            "CLC", "CONTEXTMAP2", "CRAC", "GSNAP", "NOVOALIGN", "OLEGO", "RUM", "SUBREAD", "BWA",
            "BOWTIE", "BOWTIE2",
        ];
        for line in text.lines() {
            if let Some(rest) = line.strip_prefix("@PG\t") {
                let mut id = None;
                let mut cl = None;
                for field in rest.split('\t') {
                    if let Some(v) = field.strip_prefix("ID:") {
                        id = Some(v.to_string());
                    } else if let Some(v) = field.strip_prefix("CL:") {
                        cl = Some(v.to_string());
                    }
                }
                if let (Some(id), Some(cl)) = (id, cl) {
                    if known_aligners.contains(&id.to_uppercase().as_str()) {
                        aligner_cl = Some(cl);
                    }
                }
            }
        }
        BamHeaderInfo { contigs, aligner_cl }
    }

    /// Pass 1: SA-tag scan populating TDUP anchors keyed by query name.
    fn iter_bam(
        &self,
        reader: &mut bam::IndexedReader,
        regions: &[Option<TargetRegion>],
    ) -> Result<HashMap<String, TdupAnchor>, ScanItdError> {
        log::info!("Iter bam file and extracting primary alignments with SA tags");
        let mut tdup_anchors = HashMap::new();

        for region in regions {
            if let Err(e) = self.fetch_region(reader, region) {
                log::warn!("skipping region {:?}: {}", region, e);
                continue;
            }
            let header = reader.header().clone();
            for record in reader.records() {
                let record = match record {
                    Ok(r) => r,
                    Err(e) => {
                        log::warn!("skipping unreadable record: {}", e);
                        continue;
                    }
                };

                if record.is_secondary() || record.is_supplementary() {
                    continue;
                }
                if aux_str(&record, b"XA").is_some() {
                    continue;
                }
                let sa = match aux_str(&record, b"SA") {
                    Some(s) => s,
                    None => continue,
                };
                if record.mapq() < self.config.mapq_cutoff {
                    continue;
                }

                let chimeric_aln: Vec<&str> = sa.trim_end_matches(';').split(';').collect();
                if chimeric_aln.len() > 1 {
                    continue;
                }

                let chrom_ra = String::from_utf8_lossy(header.tid2name(record.tid() as u32)).into_owned();
                let strand_ra = record_strand(&record);
                let query_name = String::from_utf8_lossy(record.qname()).into_owned();

                let (chrom_sa, pos_sa, strand_sa, cigar_sa, mapq_sa, nm_sa) =
                    match parse_sa_tag(chimeric_aln[0]) {
                        Ok(parsed) => parsed,
                        Err(e) => {
                            log::warn!("malformed SA tag for {}: {}", query_name, e);
                            continue;
                        }
                    };

                if chrom_ra != chrom_sa || strand_ra != strand_sa {
                    continue;
                }

                let seq_ra = String::from_utf8_lossy(&record.seq().as_bytes()).into_owned();
                let seq_sa = sa_query_seq_from_ra(&seq_ra, strand_ra, strand_sa);
                let qual_ra = record.qual().to_vec();
                let qual_sa = sa_query_qual_from_ra(&qual_ra, strand_ra, strand_sa);

                let read_uno = match record_to_read(&record, chrom_ra.clone()) {
                    Ok(r) => r,
                    Err(e) => {
                        log::warn!("malformed CIGAR for {}: {}", query_name, e);
                        continue;
                    }
                };
                let read_dos = match Read::new(
                    query_name.clone(),
                    chrom_sa,
                    pos_sa,
                    Strand::from_char(strand_sa).unwrap_or(Strand::Forward),
                    cigar_sa,
                    mapq_sa,
                    nm_sa,
                    seq_sa,
                    qual_sa,
                ) {
                    Ok(r) => r,
                    Err(e) => {
                        log::warn!("malformed SA CIGAR for {}: {}", query_name, e);
                        continue;
                    }
                };

                let uno_mode = read_uno.simple_mode();
                let dos_mode = read_dos.simple_mode();

                let outcome = match same_chrom_same_strand_handler(
                    &read_uno,
                    &read_dos,
                    uno_mode,
                    dos_mode,
                    &self.genome,
                    self.config.microinsertion_cutoff,
                ) {
                    Ok(o) => o,
                    Err(e) => {
                        log::warn!("split-read handler failed for {}: {}", query_name, e);
                        continue;
                    }
                };

                if let Some((tdup, break_point_region)) = outcome {
                    log::trace!("break_point_region={:?} query_name={}", break_point_region, query_name);
                    tdup_anchors.insert(
                        query_name,
                        TdupAnchor {
                            chrom: tdup.chrom,
                            ref_start: tdup.junction_start,
                            ref_end: tdup.junction_end,
                            strand: strand_ra,
                            break_point_region,
                        },
                    );
                }
            }
        }

        Ok(tdup_anchors)
    }

    fn fetch_region(
        &self,
        reader: &mut bam::IndexedReader,
        region: &Option<TargetRegion>,
    ) -> Result<(), ScanItdError> {
        match region {
            None => reader
                .fetch(bam::FetchDefinition::All)
                .map_err(|e| ScanItdError::TransientRegion(e.to_string())),
            Some(r) => {
                let tid = reader
                    .header()
                    .tid(r.chrom.as_bytes())
                    .ok_or_else(|| ScanItdError::InvalidRegion(r.chrom.clone()))?;
                reader
                    .fetch((tid, r.interval.start, r.interval.end))
                    .map_err(|e| ScanItdError::TransientRegion(e.to_string()))
            }
        }
    }

    /// Pass 2: pileup-driven aggregation of TDUP/INS candidates.
    #[allow(clippy::too_many_arguments)]
    fn scan_pileup(
        &self,
        reader: &mut bam::IndexedReader,
        regions: &[Option<TargetRegion>],
        tdup_anchors: &HashMap<String, TdupAnchor>,
    ) -> (
        HashMap<CandidateId, i64>,
        HashMap<CandidateId, (String, &'static str)>,
        HashMap<CandidateId, (String, String)>,
        HashMap<CandidateId, i64>,
        HashMap<RescuePoolKey, Vec<String>>,
    ) {
        let mut to_be_rescued: HashMap<RescuePoolKey, Vec<String>> = HashMap::new();
        let mut query_reads_total_set: HashSet<String> = HashSet::new();

        let mut tdup_ao: HashMap<CandidateId, i64> = HashMap::new();
        let mut tdup_allele_dict: HashMap<CandidateId, (String, &'static str)> = HashMap::new();

        let mut ins_ao: HashMap<CandidateId, i64> = HashMap::new();
        let mut ins_allele_dict: HashMap<CandidateId, (String, String)> = HashMap::new();

        for region in regions {
            if let Err(e) = self.fetch_region(reader, region) {
                log::warn!("skipping region {:?} in pileup pass: {}", region, e);
                continue;
            }
            let header = reader.header().clone();

            let mut pileup = reader.pileup();
            loop {
                let column = match pileup.next() {
                    Some(Ok(c)) => c,
                    Some(Err(e)) => {
                        log::warn!("pileup error: {}", e);
                        continue;
                    }
                    None => break,
                };

                for pileup_read in column.alignments() {
                    let record = pileup_read.record();
                    if record.mapq() < self.config.mapq_cutoff {
                        continue;
                    }
                    let qpos = match pileup_read.qpos() {
                        Some(p) => p,
                        None => continue,
                    };

                    let chrom_ra = String::from_utf8_lossy(header.tid2name(record.tid() as u32)).into_owned();
                    let cigar_ra = record.cigar().to_string();
                    let has_soft = cigar_ra.contains('S');
                    let has_hard = cigar_ra.contains('H');
                    let read_name = String::from_utf8_lossy(record.qname()).into_owned();
                    let seq_ra = String::from_utf8_lossy(&record.seq().as_bytes()).into_owned();

                    if has_soft && !has_hard {
                        if let Ok(read_obj) = record_to_read(&record, chrom_ra.clone()) {
                            let read_mode = read_obj.simple_mode();

                            if !tdup_anchors.contains_key(&read_name) {
                                let (softclipped_sequence, softclipped_position) =
                                    if read_mode == MappingMode::Ms {
                                        (
                                            read_obj.query_sequence
                                                [read_obj.query_sequence.len() - read_obj.rt_soft_len as usize..]
                                                .to_string(),
                                            read_obj.ref_end,
                                        )
                                    } else {
                                        (
                                            read_obj.query_sequence[..read_obj.lt_soft_len as usize].to_string(),
                                            read_obj.ref_start,
                                        )
                                    };

                                if !query_reads_total_set.contains(&read_name) {
                                    to_be_rescued
                                        .entry((chrom_ra.clone(), softclipped_position, read_mode))
                                        .or_default()
                                        .push(softclipped_sequence);
                                    query_reads_total_set.insert(read_name.clone());
                                }
                            } else {
                                let anchor = &tdup_anchors[&read_name];
                                let tdup_size = anchor.ref_end - anchor.ref_start;
                                let tdup_seq = self
                                    .genome
                                    .fetch_seq(&chrom_ra, anchor.ref_start, anchor.ref_end)
                                    .unwrap_or_default();

                                let id = CandidateId {
                                    chrom: chrom_ra.clone(),
                                    ref_start: anchor.ref_start,
                                    size: tdup_size,
                                    sequence: tdup_seq,
                                    break_point_region: anchor.break_point_region.clone(),
                                };

                                let ref_allele = self
                                    .genome
                                    .fetch_seq(&chrom_ra, anchor.ref_start, anchor.ref_start + 1)
                                    .unwrap_or_default();
                                tdup_allele_dict.insert(id.clone(), (ref_allele, "TDUP"));

                                if !query_reads_total_set.contains(&read_name) {
                                    *tdup_ao.entry(id).or_insert(0) += 1;
                                    query_reads_total_set.insert(read_name.clone());
                                }
                            }
                        }
                    }

                    let indel = pileup_read.indel();
                    let insertion_size = match indel {
                        rust_htslib::bam::pileup::Indel::Ins(n) => n as i64,
                        _ => 0,
                    };

                    if insertion_size >= self.config.itd_length_cutoff && insertion_size > 0 {
                        let reference_pos = column.pos() as i64;
                        let landmark = format!("{}M{}I", "\\d+", insertion_size);
                        let has_landmark = regex::Regex::new(&landmark)
                            .map(|re| re.is_match(&cigar_ra))
                            .unwrap_or(false);

                        if has_landmark {
                            let left_seq = self
                                .genome
                                .fetch_seq(
                                    &chrom_ra,
                                    reference_pos - insertion_size + 2,
                                    reference_pos + 1,
                                )
                                .unwrap_or_default();
                            let right_seq = self
                                .genome
                                .fetch_seq(&chrom_ra, reference_pos + 1, reference_pos + insertion_size)
                                .unwrap_or_default();
                            let insertion_seq_in_read: String = seq_ra
                                .chars()
                                .skip(qpos + 1)
                                .take(insertion_size as usize)
                                .collect();

                            let (is_dup, left_shift, tdup_seq) = self_loop_checker(
                                &insertion_seq_in_read,
                                &left_seq,
                                &right_seq,
                                self.config.allowed_mismatches_for_insertion,
                            );

                            let landmark_pos = insertion_reference_pos(
                                &cigar_ra,
                                record.pos(),
                                insertion_size as u32,
                            );

                            if is_dup && landmark_pos == Some(reference_pos) {
                                let tdup_ref_start = reference_pos - left_shift;
                                let id = CandidateId {
                                    chrom: chrom_ra.clone(),
                                    ref_start: tdup_ref_start,
                                    size: insertion_size,
                                    sequence: tdup_seq,
                                    break_point_region: MicroRegion::parse(""),
                                };
                                if !query_reads_total_set.contains(&read_name) {
                                    *tdup_ao.entry(id.clone()).or_insert(0) += 1;
                                    query_reads_total_set.insert(read_name.clone());
                                }
                                let ref_allele = self
                                    .genome
                                    .fetch_seq(&chrom_ra, tdup_ref_start, tdup_ref_start + 1)
                                    .unwrap_or_default();
                                tdup_allele_dict.insert(id, (ref_allele, "TDUP"));
                            } else {
                                let insertion_seq_in_read_full: String = seq_ra
                                    .chars()
                                    .skip(qpos)
                                    .take(insertion_size as usize)
                                    .collect();
                                let id = CandidateId {
                                    chrom: chrom_ra.clone(),
                                    ref_start: reference_pos,
                                    size: insertion_size,
                                    sequence: insertion_seq_in_read,
                                    break_point_region: MicroRegion::parse(""),
                                };
                                let ref_allele = self
                                    .genome
                                    .fetch_seq(&chrom_ra, reference_pos, reference_pos + 1)
                                    .unwrap_or_default();
                                ins_allele_dict.insert(id.clone(), (ref_allele, insertion_seq_in_read_full));
                                *ins_ao.entry(id).or_insert(0) += 1;
                            }
                        }
                    }
                }
            }
        }

        (tdup_ao, tdup_allele_dict, ins_allele_dict, ins_ao, to_be_rescued)
    }

    fn rescue_ao(
        &self,
        id: &CandidateId,
        original_ao: i64,
        to_be_rescued: &HashMap<RescuePoolKey, Vec<String>>,
    ) -> i64 {
        let ref_end = id.ref_start + id.size;
        let mut rescued = 0i64;

        if let Some(candidates) = to_be_rescued.get(&(id.chrom.clone(), id.ref_start, MappingMode::Sm)) {
            let window = build_reference_window(&id.sequence, MappingMode::Sm, &id.break_point_region);
            rescued += candidates
                .iter()
                .filter(|q| {
                    alignment_operation(
                        q.as_str(),
                        &window,
                        MappingMode::Sm,
                        self.config.allowed_mismatches_for_sr_rescue,
                    )
                })
                .count() as i64;
        }
        if let Some(candidates) = to_be_rescued.get(&(id.chrom.clone(), ref_end, MappingMode::Ms)) {
            let window = build_reference_window(&id.sequence, MappingMode::Ms, &id.break_point_region);
            rescued += candidates
                .iter()
                .filter(|q| {
                    alignment_operation(
                        q.as_str(),
                        &window,
                        MappingMode::Ms,
                        self.config.allowed_mismatches_for_sr_rescue,
                    )
                })
                .count() as i64;
        }

        original_ao + rescued
    }

    fn depth_at(&self, reader: &mut bam::IndexedReader, chrom: &str, position: i64, mode: MappingMode) -> i64 {
        let pos = if mode == MappingMode::Ms { position - 1 } else { position };
        let tid = match reader.header().tid(chrom.as_bytes()) {
            Some(t) => t,
            None => return 0,
        };
        if reader.fetch((tid, pos, pos + 1)).is_err() {
            return 0;
        }
        reader.records().filter(|r| r.is_ok()).count() as i64
    }

    /// Run both passes end-to-end and return the sorted event list plus
    /// BAM header metadata the VCF emitter needs.
    pub fn scan(&self) -> Result<(Vec<Event>, BamHeaderInfo), ScanItdError> {
        let mut reader = self.open_reader()?;
        self.check_sorted(&reader)?;
        let header_info = self.header_info(&reader);

        let regions = crate::target::parse_target_regions(&self.config.target)?;

        let tdup_anchors = self.iter_bam(&mut reader, &regions)?;
        let (tdup_ao, tdup_allele_dict, ins_allele_dict, ins_ao, to_be_rescued) =
            self.scan_pileup(&mut reader, &regions, &tdup_anchors);

        let mut events = Vec::new();

        for (id, original_ao) in tdup_ao {
            let new_ao = self.rescue_ao(&id, original_ao, &to_be_rescued);
            let depth = self.depth_at(&mut reader, &id.chrom, id.ref_start, MappingMode::Sm);
            let (ref_allele, _) = tdup_allele_dict
                .get(&id)
                .cloned()
                .unwrap_or_else(|| (".".to_string(), "TDUP"));
            events.push(Event::new(
                EventType::Tdup,
                id,
                original_ao,
                new_ao,
                depth,
                ref_allele.clone(),
                ref_allele,
            ));
        }

        for (id, ao) in ins_ao {
            let depth = self.depth_at(&mut reader, &id.chrom, id.ref_start, MappingMode::Sm);
            let (ref_allele, alt_allele) = ins_allele_dict
                .get(&id)
                .cloned()
                .unwrap_or_else(|| (".".to_string(), ".".to_string()));
            events.push(Event::new(EventType::Ins, id, ao, ao, depth, ref_allele, alt_allele));
        }

        events.sort_by(|a, b| a.chrom.cmp(&b.chrom).then(a.ref_start.cmp(&b.ref_start)));

        Ok((events, header_info))
    }
}
