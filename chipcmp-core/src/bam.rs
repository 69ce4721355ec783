use anyhow::{Context, Result};
use bed_utils::bed::{BEDLike, GenomicRange};
use log::debug;
use noodles::bam;
use noodles::sam::alignment::record::Cigar as _;
use noodles::sam::alignment::record::Flags;
use noodles::sam::Header;
use serde::Serialize;
use std::path::Path;

use crate::genome::ChromSizes;
use crate::regions::RegionSet;

/// Alignment flag statistics accumulated over a BAM stream. The `mapped`
/// count supplies the library size used by FPKM/CPM normalization.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FlagStat {
    pub read: u64,
    pub mapped: u64,
    pub primary: u64,
    pub primary_mapped: u64,
    pub secondary: u64,
    pub supplementary: u64,
    pub duplicate: u64,
    pub paired: u64,
    pub read_1: u64,
    pub read_2: u64,
    pub proper_pair: u64,
    pub mate_mapped: u64,
    pub singleton: u64,
}

impl FlagStat {
    pub fn update(&mut self, flags: Flags) {
        self.read += 1;

        if flags.is_duplicate() {
            self.duplicate += 1;
        }

        if !flags.is_unmapped() {
            self.mapped += 1;
        }

        if flags.is_secondary() {
            self.secondary += 1;
        } else if flags.is_supplementary() {
            self.supplementary += 1;
        } else {
            self.primary += 1;

            if !flags.is_unmapped() {
                self.primary_mapped += 1;
            }

            if flags.is_segmented() {
                self.paired += 1;

                if flags.is_first_segment() {
                    self.read_1 += 1;
                }

                if flags.is_last_segment() {
                    self.read_2 += 1;
                }

                if !flags.is_unmapped() {
                    if flags.is_properly_segmented() {
                        self.proper_pair += 1;
                    }

                    if flags.is_mate_unmapped() {
                        self.singleton += 1;
                    } else {
                        self.mate_mapped += 1;
                    }
                }
            }
        }
    }
}

/// Genomic span of a mapped record, 0-based half-open, with optional
/// extension to `fragment` length toward the 3' end.
fn extend_3p(chrom: String, start: u64, end: u64, reverse: bool, fragment: Option<u64>) -> GenomicRange {
    match fragment {
        None => GenomicRange::new(chrom, start, end),
        Some(frag) => {
            if reverse {
                GenomicRange::new(chrom, end.saturating_sub(frag), end)
            } else {
                GenomicRange::new(chrom, start, start + frag)
            }
        }
    }
}

fn record_range(
    header: &Header,
    record: &bam::Record,
    fragment: Option<u64>,
) -> Result<Option<GenomicRange>> {
    let flags = record.flags();
    if flags.is_unmapped() {
        return Ok(None);
    }
    let ref_id: usize = record
        .reference_sequence_id()
        .context("mapped record without reference sequence id")??;
    let chrom = header
        .reference_sequences()
        .get_index(ref_id)
        .with_context(|| format!("reference sequence {} not in header", ref_id))?
        .0
        .to_string();
    let start: usize = record
        .alignment_start()
        .context("mapped record without alignment start")??
        .try_into()?;
    let start = start as u64 - 1;
    let span = record.cigar().alignment_span()? as u64;
    Ok(Some(extend_3p(
        chrom,
        start,
        start + span,
        flags.is_reverse_complemented(),
        fragment,
    )))
}

/// Per-region read counts of a BAM file, streamed in a single pass. Also
/// returns the flag statistics of the whole file so the library size is
/// available without reading it twice.
pub fn count_in_regions<P: AsRef<Path>>(
    bam_file: P,
    regions: &RegionSet,
    fragment: Option<u64>,
) -> Result<(Vec<u64>, FlagStat)> {
    let path = bam_file.as_ref();
    let mut reader = bam::io::reader::Builder::default()
        .build_from_path(path)
        .with_context(|| format!("cannot open BAM file: {}", path.display()))?;
    let header = reader.read_header()?;

    let mut counts = vec![0u64; regions.len()];
    let mut flagstat = FlagStat::default();
    for record in reader.records() {
        let record = record?;
        flagstat.update(record.flags());
        if let Some(range) = record_range(&header, &record, fragment)? {
            regions.find_indices(&range).for_each(|i| counts[i] += 1);
        }
    }
    debug!(
        "{}: {} records, {} mapped",
        path.display(),
        flagstat.read,
        flagstat.mapped
    );
    Ok((counts, flagstat))
}

/// Per-region per-base read depth of a BAM file: one `f64` array per region
/// with length equal to the region length. Streams the whole file once, so
/// no BAM index is required.
pub fn base_depth<P: AsRef<Path>>(
    bam_file: P,
    regions: &RegionSet,
    fragment: Option<u64>,
) -> Result<Vec<Vec<f64>>> {
    let path = bam_file.as_ref();
    let mut reader = bam::io::reader::Builder::default()
        .build_from_path(path)
        .with_context(|| format!("cannot open BAM file: {}", path.display()))?;
    let header = reader.read_header()?;

    let mut depth: Vec<Vec<f64>> = regions
        .iter()
        .map(|r| vec![0.0; (r.end() - r.start()) as usize])
        .collect();
    for record in reader.records() {
        let record = record?;
        if let Some(range) = record_range(&header, &record, fragment)? {
            add_overlap(regions, &range, &mut depth);
        }
    }
    Ok(depth)
}

fn add_overlap(regions: &RegionSet, range: &GenomicRange, depth: &mut [Vec<f64>]) {
    let hits: Vec<usize> = regions.find_indices(range).collect();
    for i in hits {
        let region = &regions.regions()[i];
        let lo = range.start().max(region.start());
        let hi = range.end().min(region.end());
        for pos in lo..hi {
            depth[i][(pos - region.start()) as usize] += 1.0;
        }
    }
}

/// Chromosome sizes recorded in a BAM header. Used to clip extended
/// windows when no `chrom.sizes` file is given.
pub fn chrom_sizes<P: AsRef<Path>>(bam_file: P) -> Result<ChromSizes> {
    let path = bam_file.as_ref();
    let mut reader = bam::io::reader::Builder::default()
        .build_from_path(path)
        .with_context(|| format!("cannot open BAM file: {}", path.display()))?;
    let header = reader.read_header()?;
    Ok(ChromSizes::from_header(&header))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(bits: u16) -> Flags {
        Flags::from_bits_retain(bits)
    }

    #[test]
    fn test_flagstat_counts_mapped() {
        let mut stat = FlagStat::default();
        stat.update(flags(0)); // mapped, single-end
        stat.update(flags(0x4)); // unmapped
        stat.update(flags(0x100)); // mapped secondary
        stat.update(flags(0x1 | 0x2 | 0x40)); // mapped, paired, proper, read1
        assert_eq!(stat.read, 4);
        assert_eq!(stat.mapped, 3);
        assert_eq!(stat.primary, 3);
        assert_eq!(stat.secondary, 1);
        assert_eq!(stat.paired, 1);
        assert_eq!(stat.proper_pair, 1);
        assert_eq!(stat.read_1, 1);
    }

    #[test]
    fn test_flagstat_singleton() {
        let mut stat = FlagStat::default();
        stat.update(flags(0x1 | 0x8)); // paired, mate unmapped
        stat.update(flags(0x1)); // paired, both mapped
        assert_eq!(stat.singleton, 1);
        assert_eq!(stat.mate_mapped, 1);
    }

    #[test]
    fn test_extend_3p() {
        let fwd = extend_3p("chr1".into(), 100, 150, false, Some(200));
        assert_eq!(fwd, GenomicRange::new("chr1", 100, 300));
        let rev = extend_3p("chr1".into(), 100, 150, true, Some(200));
        assert_eq!(rev, GenomicRange::new("chr1", 0, 150));
        let plain = extend_3p("chr1".into(), 100, 150, true, None);
        assert_eq!(plain, GenomicRange::new("chr1", 100, 150));
    }

    #[test]
    fn test_chrom_sizes_from_header() {
        use noodles::sam::header::record::value::{map::ReferenceSequence, Map};
        use std::num::NonZeroUsize;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bam");
        let header = Header::builder()
            .add_reference_sequence(
                "chr1",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(1000).unwrap()),
            )
            .add_reference_sequence(
                "chr2",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(500).unwrap()),
            )
            .build();
        let mut writer = bam::io::Writer::new(std::fs::File::create(&path).unwrap());
        writer.write_header(&header).unwrap();
        writer.try_finish().unwrap();

        let sizes = chrom_sizes(&path).unwrap();
        assert_eq!(sizes.get("chr1"), Some(1000));
        assert_eq!(sizes.get("chr2"), Some(500));
        assert_eq!(sizes.get("chrX"), None);
    }

    #[test]
    fn test_add_overlap_depth() {
        let regions = RegionSet::new(vec![GenomicRange::new("chr1", 100, 110)]);
        let mut depth: Vec<Vec<f64>> = vec![vec![0.0; 10]];
        add_overlap(&regions, &GenomicRange::new("chr1", 105, 120), &mut depth);
        add_overlap(&regions, &GenomicRange::new("chr1", 90, 106), &mut depth);
        assert_eq!(depth[0][4], 1.0); // covered by the second read only
        assert_eq!(depth[0][5], 2.0); // covered by both
        assert_eq!(depth[0][9], 1.0);
        assert_eq!(depth[0][0], 1.0);
    }
}
