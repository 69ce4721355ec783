use anyhow::{Context, Result};
use bed_utils::bed::BEDLike;
use indicatif::ParallelProgressIterator;
use log::info;
use ndarray::Array2;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::path::Path;

use crate::bam;
use crate::progress;
use crate::regions::RegionSet;

/// Read-count normalization applied to coverage tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Raw,
    Fpkm,
    Cpm,
}

impl Measure {
    /// Normalized value for `count` reads in a region of `region_len` bases
    /// from a library of `mapped` reads. FPKM and CPM are reported on a
    /// `log2(1 + x)` scale.
    pub fn apply(self, count: u64, region_len: u64, mapped: u64) -> f64 {
        let count = count as f64;
        match self {
            Measure::Raw => count,
            Measure::Fpkm => {
                (1.0 + count * 1e9 / (region_len as f64 * mapped as f64)).log2()
            }
            Measure::Cpm => (1.0 + count * 1e9 / mapped as f64).log2(),
        }
    }
}

/// Coverage matrix: one row per region, one column per BAM file. Each file
/// is streamed once on its own worker; the run aborts on the first failing
/// file.
pub fn coverage_matrix<P: AsRef<Path> + Sync>(
    regions: &RegionSet,
    bam_files: &[P],
    measure: Measure,
    fragment: Option<u64>,
) -> Result<Array2<f64>> {
    info!(
        "counting reads of {} files over {} regions",
        bam_files.len(),
        regions.len()
    );
    let bar = progress::start(bam_files.len() as u64, "counting");
    let columns: Result<Vec<(Vec<u64>, u64)>> = bam_files
        .par_iter()
        .progress_with(bar)
        .map(|path| {
            let (counts, flagstat) = bam::count_in_regions(path, regions, fragment)?;
            Ok((counts, flagstat.mapped))
        })
        .collect();
    progress::finish();
    let columns = columns?;

    let mut mat = Array2::zeros((regions.len(), bam_files.len()));
    for (j, (counts, mapped)) in columns.into_iter().enumerate() {
        for (i, (count, region)) in counts.into_iter().zip(regions.iter()).enumerate() {
            mat[[i, j]] = measure.apply(count, region.len(), mapped);
        }
    }
    Ok(mat)
}

/// Binary occupancy of interval sets against a reference set: 1.0 where any
/// interval of the set overlaps the reference region.
pub fn occupancy_matrix(reference: &RegionSet, sets: &[RegionSet]) -> Array2<f64> {
    let mut mat = Array2::zeros((reference.len(), sets.len()));
    for (j, set) in sets.iter().enumerate() {
        reference
            .count_overlaps(set.iter().cloned())
            .into_iter()
            .enumerate()
            .for_each(|(i, n)| {
                if n > 0 {
                    mat[[i, j]] = 1.0;
                }
            });
    }
    mat
}

/// Write a region-by-sample table as tab-delimited text, with the region
/// coordinates as the three leading columns and one header row.
pub fn write_table<P: AsRef<Path>>(
    path: P,
    regions: &RegionSet,
    labels: &[String],
    mat: &Array2<f64>,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("cannot create file: {}", path.as_ref().display()))?;
    let mut header = vec!["chrom".to_string(), "start".to_string(), "end".to_string()];
    header.extend_from_slice(labels);
    writer.write_record(&header)?;
    for (region, row) in regions.iter().zip(mat.rows()) {
        let mut record = vec![
            region.chrom().to_string(),
            region.start().to_string(),
            region.end().to_string(),
        ];
        record.extend(row.iter().map(|x| x.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bed_utils::bed::GenomicRange;

    fn gr(chrom: &str, start: u64, end: u64) -> GenomicRange {
        GenomicRange::new(chrom, start, end)
    }

    #[test]
    fn test_measure_formulas() {
        assert_eq!(Measure::Raw.apply(7, 500, 1_000_000), 7.0);
        let fpkm = Measure::Fpkm.apply(10, 1000, 1_000_000);
        assert!((fpkm - (1.0f64 + 10.0 * 1e9 / (1000.0 * 1e6)).log2()).abs() < 1e-12);
        let cpm = Measure::Cpm.apply(10, 1000, 1_000_000);
        assert!((cpm - (1.0f64 + 10.0 * 1e9 / 1e6).log2()).abs() < 1e-12);
    }

    #[test]
    fn test_occupancy_shape_and_values() {
        let reference = RegionSet::new(vec![gr("chr1", 0, 100), gr("chr1", 200, 300)]);
        let sets = vec![
            RegionSet::new(vec![gr("chr1", 50, 60)]),
            RegionSet::new(vec![gr("chr1", 250, 260), gr("chr1", 10, 20)]),
            RegionSet::new(vec![gr("chr9", 0, 10)]),
        ];
        let mat = occupancy_matrix(&reference, &sets);
        assert_eq!(mat.dim(), (2, 3));
        assert_eq!(mat[[0, 0]], 1.0);
        assert_eq!(mat[[1, 0]], 0.0);
        assert_eq!(mat[[0, 1]], 1.0);
        assert_eq!(mat[[1, 1]], 1.0);
        assert_eq!(mat[[0, 2]], 0.0);
    }

    #[test]
    fn test_write_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.tsv");
        let regions = RegionSet::new(vec![gr("chr1", 0, 100)]);
        let mat = ndarray::array![[1.5, 2.0]];
        write_table(&path, &regions, &["a".into(), "b".into()], &mat).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "chrom\tstart\tend\ta\tb\nchr1\t0\t100\t1.5\t2\n");
    }
}
