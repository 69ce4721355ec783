use anyhow::{anyhow, bail, Context, Result};
use bed_utils::bed::map::GIntervalIndexSet;
use bed_utils::bed::{merge_sorted_bed_with, BEDLike, GenomicRange, BED};
use flate2::read::MultiGzDecoder;
use itertools::Itertools;
use log::info;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::genome::ChromSizes;

/// Open a text file, transparently decompressing `.gz` input.
pub fn open_maybe_gzip<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("cannot open file: {}", path.display()))?;
    if path.extension().map_or(false, |x| x == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Derive a sample label from a file name: the part before the first dot.
pub fn sample_label<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .map_or_else(String::new, |name| {
            name.to_string_lossy()
                .split('.')
                .next()
                .unwrap_or_default()
                .to_string()
        })
}

/// An ordered set of genomic regions with an interval index for overlap
/// queries. Region order is the insertion order and is preserved in all
/// outputs.
pub struct RegionSet {
    regions: Vec<GenomicRange>,
    index: GIntervalIndexSet,
}

impl RegionSet {
    pub fn new(regions: Vec<GenomicRange>) -> Self {
        let index = regions.iter().cloned().collect();
        Self { regions, index }
    }

    /// Read a BED file (plain or gzip). Lines starting with `#`, `track` or
    /// `browser` are skipped; only the first three columns are used.
    pub fn from_bed<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(read_bed(path)?))
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> &[GenomicRange] {
        &self.regions
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenomicRange> {
        self.regions.iter()
    }

    /// Whether any region of this set overlaps `query`.
    pub fn is_overlapped<B: BEDLike>(&self, query: &B) -> bool {
        self.index.find_index_of(query).next().is_some()
    }

    /// Indices (in insertion order space) of the regions overlapping `query`.
    pub fn find_indices<'a, B: BEDLike>(&'a self, query: &'a B) -> impl Iterator<Item = usize> + 'a {
        self.index.find_index_of(query)
    }

    /// For every region of this set, the number of `tags` overlapping it.
    pub fn count_overlaps<I, B>(&self, tags: I) -> Vec<u64>
    where
        I: IntoIterator<Item = B>,
        B: BEDLike,
    {
        let mut counts = vec![0u64; self.regions.len()];
        for tag in tags {
            self.index
                .find_index_of(&tag)
                .for_each(|idx| counts[idx] += 1);
        }
        counts
    }

    /// Number of overlapping pairs (a, b) between this set and `other`, one
    /// count per pair of intersecting intervals.
    pub fn n_overlap_pairs(&self, other: &RegionSet) -> u64 {
        other
            .iter()
            .map(|b| self.index.find_index_of(b).count() as u64)
            .sum()
    }
}

impl FromIterator<GenomicRange> for RegionSet {
    fn from_iter<T: IntoIterator<Item = GenomicRange>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

pub fn read_bed<P: AsRef<Path>>(path: P) -> Result<Vec<GenomicRange>> {
    let path = path.as_ref();
    let reader = open_maybe_gzip(path)?;
    let regions = reader
        .lines()
        .filter_map(|line| match line {
            Ok(l) => {
                let t = l.trim();
                if t.is_empty()
                    || t.starts_with('#')
                    || t.starts_with("track")
                    || t.starts_with("browser")
                {
                    None
                } else {
                    Some(Ok(l))
                }
            }
            Err(e) => Some(Err(e)),
        })
        .map(|line| {
            let line = line?;
            let bed: BED<3> = line
                .parse()
                .map_err(|e| anyhow!("invalid BED record {:?}: {:?}", line, e))?;
            Ok(bed.to_genomic_range())
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("cannot read BED file: {}", path.display()))?;
    if regions.is_empty() {
        bail!("no regions found in {}", path.display());
    }
    info!("{}: {} regions", path.display(), regions.len());
    Ok(regions)
}

/// Read a BED file together with a feature name taken from column
/// `name_col` (0-based). Rows without that column fail.
pub fn read_named_bed<P: AsRef<Path>>(
    path: P,
    name_col: usize,
) -> Result<Vec<(GenomicRange, String)>> {
    let path = path.as_ref();
    let reader = open_maybe_gzip(path)?;
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let t = line.trim();
        if t.is_empty() || t.starts_with('#') || t.starts_with("track") || t.starts_with("browser")
        {
            continue;
        }
        let fields: Vec<&str> = t.split('\t').collect();
        let name = fields
            .get(name_col)
            .ok_or_else(|| anyhow!("no column {} in BED record {:?}", name_col, t))?;
        let bed: BED<3> = t
            .parse()
            .map_err(|e| anyhow!("invalid BED record {:?}: {:?}", t, e))?;
        records.push((bed.to_genomic_range(), name.to_string()));
    }
    if records.is_empty() {
        bail!("no regions found in {}", path.display());
    }
    Ok(records)
}

pub fn write_bed<P, I, B>(path: P, regions: I) -> Result<()>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = B>,
    B: BEDLike,
{
    let mut out = BufWriter::new(File::create(&path).with_context(|| {
        format!("cannot create file: {}", path.as_ref().display())
    })?);
    for region in regions {
        writeln!(out, "{}\t{}\t{}", region.chrom(), region.start(), region.end())?;
    }
    Ok(())
}

/// Merge all intervals across the given sets into a sorted list of
/// non-overlapping regions.
pub fn union<'a, I>(sets: I) -> Vec<GenomicRange>
where
    I: IntoIterator<Item = &'a [GenomicRange]>,
{
    let mut all: Vec<GenomicRange> = sets.into_iter().flatten().cloned().collect();
    all.sort_by(BEDLike::compare);
    merge_sorted_bed_with(all.into_iter(), |cluster: Vec<GenomicRange>| {
        let chrom = cluster[0].chrom().to_string();
        let start = cluster.iter().map(|x| x.start()).min().unwrap();
        let end = cluster.iter().map(|x| x.end()).max().unwrap();
        GenomicRange::new(chrom, start, end)
    })
    .collect()
}

/// Replace each region by a window of size `2 * window` centered on its
/// midpoint, clipped at chromosome boundaries when sizes are known.
pub fn extend_midpoints<'a, I>(
    regions: I,
    window: u64,
    chrom_sizes: Option<&ChromSizes>,
) -> Vec<GenomicRange>
where
    I: IntoIterator<Item = &'a GenomicRange>,
{
    regions
        .into_iter()
        .map(|region| {
            let mid = region.start() + region.len() / 2;
            let extended = GenomicRange::new(
                region.chrom(),
                mid.saturating_sub(window),
                mid + window,
            );
            match chrom_sizes {
                Some(sizes) => sizes.clip(extended),
                None => extended,
            }
        })
        .collect()
}

/// Majority-vote consensus: union regions overlapped by strictly more than
/// `threshold` of the input sets.
pub fn consensus(sets: &[RegionSet], threshold: u64) -> Vec<GenomicRange> {
    let merged = RegionSet::new(union(sets.iter().map(|s| s.regions())));
    let mut votes = vec![0u64; merged.len()];
    for set in sets {
        merged
            .count_overlaps(set.iter().cloned())
            .into_iter()
            .enumerate()
            .for_each(|(i, n)| {
                if n > 0 {
                    votes[i] += 1;
                }
            });
    }
    merged
        .iter()
        .zip(votes)
        .filter(|(_, n)| *n > threshold)
        .map(|(region, _)| region.clone())
        .collect()
}

/// Read several BED files and merge them into one region set. A single file
/// is passed through without merging, preserving its order.
pub fn load_union<P: AsRef<Path>>(paths: &[P]) -> Result<RegionSet> {
    if paths.is_empty() {
        bail!("no BED files given");
    }
    if paths.len() == 1 {
        return RegionSet::from_bed(&paths[0]);
    }
    let sets = paths.iter().map(read_bed).collect::<Result<Vec<_>>>()?;
    let merged = union(sets.iter().map(|s| s.as_slice()));
    info!(
        "union of {} files: {} regions",
        paths.len(),
        merged.len()
    );
    Ok(RegionSet::new(merged))
}

/// Labels for a list of sample files, either user supplied or derived from
/// the file names. The number of labels must match the number of files.
pub fn resolve_labels<P: AsRef<Path>>(
    files: &[P],
    labels: Option<&str>,
) -> Result<Vec<String>> {
    match labels {
        None => Ok(files.iter().map(sample_label).collect()),
        Some(s) => {
            let labels = s.split(',').map(|x| x.trim().to_string()).collect_vec();
            if labels.len() != files.len() {
                bail!(
                    "wrong number of labels: {} labels for {} files",
                    labels.len(),
                    files.len()
                );
            }
            Ok(labels)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gr(chrom: &str, start: u64, end: u64) -> GenomicRange {
        GenomicRange::new(chrom, start, end)
    }

    #[test]
    fn test_union_merges_overlaps() {
        let a = vec![gr("chr1", 100, 200), gr("chr2", 0, 50)];
        let b = vec![gr("chr1", 150, 300), gr("chr1", 500, 600)];
        let merged = union([a.as_slice(), b.as_slice()]);
        assert_eq!(
            merged,
            vec![gr("chr1", 100, 300), gr("chr1", 500, 600), gr("chr2", 0, 50)]
        );
    }

    #[test]
    fn test_extend_midpoints() {
        let regions = vec![gr("chr1", 100, 200), gr("chr1", 0, 10)];
        let extended = extend_midpoints(&regions, 1000, None);
        // midpoint of [100, 200) is 150; left edge clamps at zero
        assert_eq!(extended[0], gr("chr1", 0, 1150));
        assert_eq!(extended[1], gr("chr1", 0, 1005));

        let sizes: ChromSizes = [("chr1", 1100u64)].into_iter().collect();
        let clipped = extend_midpoints(&regions, 1000, Some(&sizes));
        assert_eq!(clipped[0], gr("chr1", 0, 1100));
    }

    #[test]
    fn test_extend_width() {
        let regions = vec![gr("chr1", 5000, 5100)];
        let extended = extend_midpoints(&regions, 250, None);
        assert_eq!(extended[0].len(), 500);
        assert_eq!(extended[0], gr("chr1", 4800, 5300));
    }

    #[test]
    fn test_count_overlaps() {
        let set = RegionSet::new(vec![gr("chr1", 0, 100), gr("chr1", 200, 300)]);
        let tags = vec![gr("chr1", 50, 60), gr("chr1", 90, 210), gr("chr2", 0, 10)];
        assert_eq!(set.count_overlaps(tags), vec![2, 1]);
    }

    #[test]
    fn test_overlap_pairs() {
        let a = RegionSet::new(vec![gr("chr1", 0, 100), gr("chr1", 200, 300)]);
        let b = RegionSet::new(vec![gr("chr1", 50, 250)]);
        assert_eq!(a.n_overlap_pairs(&b), 2);
        let c = RegionSet::new(vec![gr("chr5", 0, 10)]);
        assert_eq!(a.n_overlap_pairs(&c), 0);
    }

    #[test]
    fn test_consensus_threshold() {
        let sets = vec![
            RegionSet::new(vec![gr("chr1", 0, 100), gr("chr1", 500, 600)]),
            RegionSet::new(vec![gr("chr1", 50, 150)]),
            RegionSet::new(vec![gr("chr1", 90, 120), gr("chr2", 0, 10)]),
        ];
        // union: chr1:0-150, chr1:500-600, chr2:0-10 with 3, 1, 1 votes
        let result = consensus(&sets, 1);
        assert_eq!(result, vec![gr("chr1", 0, 150)]);
        // threshold 0 keeps everything present at least once
        let result = consensus(&sets, 0);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_read_bed_gz_and_plain() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let content = "# comment\ntrack name=peaks\nchr1\t100\t200\tpeak1\t55\t+\nchr2\t0\t50\n";

        let plain = dir.path().join("a.bed");
        std::fs::write(&plain, content).unwrap();
        let regions = read_bed(&plain).unwrap();
        assert_eq!(regions, vec![gr("chr1", 100, 200), gr("chr2", 0, 50)]);

        let gz = dir.path().join("a.bed.gz");
        let mut enc = GzEncoder::new(File::create(&gz).unwrap(), Compression::default());
        enc.write_all(content.as_bytes()).unwrap();
        enc.finish().unwrap();
        assert_eq!(read_bed(&gz).unwrap(), regions);
    }

    #[test]
    fn test_read_named_bed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("named.bed");
        std::fs::write(&path, "chr1\t100\t200\tpromoter\nchr1\t300\t400\tenhancer\n").unwrap();
        let records = read_named_bed(&path, 3).unwrap();
        assert_eq!(records[0], (gr("chr1", 100, 200), "promoter".to_string()));
        assert_eq!(records[1].1, "enhancer");
        assert!(read_named_bed(&path, 7).is_err());
    }

    #[test]
    fn test_write_bed_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bed");
        let regions = vec![gr("chr1", 10, 20), gr("chrX", 0, 5)];
        write_bed(&path, regions.iter().cloned()).unwrap();
        assert_eq!(read_bed(&path).unwrap(), regions);
    }

    #[test]
    fn test_resolve_labels() {
        let files = ["data/s1.sorted.bam", "data/s2.bam"];
        assert_eq!(resolve_labels(&files, None).unwrap(), vec!["s1", "s2"]);
        assert_eq!(
            resolve_labels(&files, Some("a, b")).unwrap(),
            vec!["a", "b"]
        );
        assert!(resolve_labels(&files, Some("onlyone")).is_err());
    }
}
