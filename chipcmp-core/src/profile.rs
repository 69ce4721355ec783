use anyhow::{anyhow, bail, Context, Result};
use bed_utils::bed::BEDLike;
use bigtools::BigWigRead;
use indicatif::ParallelProgressIterator;
use log::{info, warn};
use ndarray::{Array3, Axis};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::path::Path;

use crate::bam;
use crate::progress;
use crate::regions::RegionSet;

/// Average per-base depth within `bins` equal slices of a region.
fn summarize_bins(depth: &[f64], bins: usize) -> Vec<f64> {
    let n = depth.len();
    (0..bins)
        .map(|k| {
            let lo = k * n / bins;
            let hi = ((k + 1) * n / bins).max(lo + 1).min(n);
            if lo >= n {
                0.0
            } else {
                depth[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
            }
        })
        .collect()
}

/// Width of the output profile: the longest region. Regions clipped at a
/// chromosome boundary are shorter and get zero-padded on the right.
fn profile_width(regions: &RegionSet) -> usize {
    regions.iter().map(|r| r.len() as usize).max().unwrap_or(0)
}

fn stack_profiles(
    per_sample: Vec<Vec<Vec<f64>>>,
    n_regions: usize,
    width: usize,
    bins: Option<usize>,
) -> Array3<f64> {
    let n_bins = bins.unwrap_or(width);
    let mut arr = Array3::zeros((per_sample.len(), n_regions, n_bins));
    for (s, regions) in per_sample.into_iter().enumerate() {
        for (r, mut depth) in regions.into_iter().enumerate() {
            depth.resize(width, 0.0);
            let row = match bins {
                None => depth,
                Some(b) => summarize_bins(&depth, b),
            };
            arr.index_axis_mut(Axis(0), s)
                .index_axis_mut(Axis(0), r)
                .iter_mut()
                .zip(row)
                .for_each(|(slot, v)| *slot = v);
        }
    }
    arr
}

/// Per-base (or binned) read-depth profiles over `regions` for every BAM
/// file: array shape `[samples, regions, positions]`.
pub fn bam_profiles<P: AsRef<Path> + Sync>(
    bam_files: &[P],
    regions: &RegionSet,
    bins: Option<usize>,
    fragment: Option<u64>,
) -> Result<Array3<f64>> {
    if bins == Some(0) {
        bail!("bins must be positive");
    }
    info!(
        "computing depth profiles of {} files over {} regions",
        bam_files.len(),
        regions.len()
    );
    let bar = progress::start(bam_files.len() as u64, "profiling");
    let per_sample: Result<Vec<Vec<Vec<f64>>>> = bam_files
        .par_iter()
        .progress_with(bar)
        .map(|path| bam::base_depth(path, regions, fragment))
        .collect();
    progress::finish();
    Ok(stack_profiles(
        per_sample?,
        regions.len(),
        profile_width(regions),
        bins,
    ))
}

/// Per-base signal values over `regions` from a bigWig file. Positions not
/// covered by any interval of the track count as zero, as do chromosomes
/// absent from the track.
fn bigwig_depth<P: AsRef<Path>>(bw_file: P, regions: &RegionSet) -> Result<Vec<Vec<f64>>> {
    let path = bw_file.as_ref();
    let mut reader = BigWigRead::open_file(&*path.to_string_lossy())
        .map_err(|e| anyhow!("cannot open bigwig file {}: {}", path.display(), e))?;
    regions
        .iter()
        .map(|region| {
            let mut depth = vec![0.0; region.len() as usize];
            let values = match reader.get_interval(
                region.chrom(),
                region.start() as u32,
                region.end() as u32,
            ) {
                Ok(iter) => iter,
                Err(e) => {
                    warn!(
                        "{}: no values for {}:{}-{} ({}); filling with zeros",
                        path.display(),
                        region.chrom(),
                        region.start(),
                        region.end(),
                        e
                    );
                    return Ok(depth);
                }
            };
            for value in values {
                let value = value
                    .map_err(|e| anyhow!("error reading {}: {}", path.display(), e))?;
                let lo = (value.start as u64).max(region.start());
                let hi = (value.end as u64).min(region.end());
                for pos in lo..hi {
                    depth[(pos - region.start()) as usize] = value.value as f64;
                }
            }
            Ok(depth)
        })
        .collect()
}

/// Like [`bam_profiles`], reading signal from bigWig tracks instead of
/// counting alignments.
pub fn bigwig_profiles<P: AsRef<Path> + Sync>(
    bw_files: &[P],
    regions: &RegionSet,
    bins: Option<usize>,
) -> Result<Array3<f64>> {
    if bins == Some(0) {
        bail!("bins must be positive");
    }
    info!(
        "extracting signal of {} tracks over {} regions",
        bw_files.len(),
        regions.len()
    );
    let bar = progress::start(bw_files.len() as u64, "extracting");
    let per_sample: Result<Vec<Vec<Vec<f64>>>> = bw_files
        .par_iter()
        .progress_with(bar)
        .map(|path| bigwig_depth(path, regions))
        .collect();
    progress::finish();
    Ok(stack_profiles(
        per_sample?,
        regions.len(),
        profile_width(regions),
        bins,
    ))
}

/// Save a profile array as an `.npy` container (f64, C order).
pub fn write_profiles<P: AsRef<Path>>(path: P, profiles: &Array3<f64>) -> Result<()> {
    ndarray_npy::write_npy(&path, profiles)
        .with_context(|| format!("cannot write array: {}", path.as_ref().display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_bins_means() {
        let depth = vec![1.0, 1.0, 3.0, 3.0, 5.0, 5.0];
        assert_eq!(summarize_bins(&depth, 3), vec![1.0, 3.0, 5.0]);
        assert_eq!(summarize_bins(&depth, 1), vec![3.0]);
        assert_eq!(summarize_bins(&depth, 6), depth);
    }

    #[test]
    fn test_stack_profiles_shape() {
        let per_sample = vec![
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![0.0, 0.0]],
            vec![vec![5.0; 4], vec![2.0; 4]],
        ];
        let arr = stack_profiles(per_sample, 2, 4, Some(2));
        assert_eq!(arr.dim(), (2, 2, 2));
        assert_eq!(arr[[0, 0, 0]], 1.5);
        assert_eq!(arr[[0, 0, 1]], 3.5);
        // short region is zero padded before binning
        assert_eq!(arr[[0, 1, 0]], 0.0);
        assert_eq!(arr[[1, 1, 1]], 2.0);
    }

    #[test]
    fn test_zero_bins_rejected() {
        use bed_utils::bed::GenomicRange;
        let regions = RegionSet::new(vec![GenomicRange::new("chr1", 0, 10)]);
        assert!(bam_profiles(&["x.bam"], &regions, Some(0), None).is_err());
        assert!(bigwig_profiles(&["x.bw"], &regions, Some(0)).is_err());
    }

    #[test]
    fn test_npy_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.npy");
        let arr = Array3::from_shape_fn((2, 3, 4), |(i, j, k)| (i + j * k) as f64);
        write_profiles(&path, &arr).unwrap();
        let back: Array3<f64> = ndarray_npy::read_npy(&path).unwrap();
        assert_eq!(back, arr);
    }
}
