use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chipcmp_core::bam;
use chipcmp_core::genome::ChromSizes;
use chipcmp_core::profile;
use chipcmp_core::regions::{self, RegionSet};
use log::info;

use crate::cli::CoverageSitesArgs;

/// Resolve the data files to read: either the positional inputs directly,
/// or the IDs of a column in one or more sample tables, decorated with a
/// common prefix/suffix.
fn resolve_inputs(args: &CoverageSitesArgs) -> Result<Vec<PathBuf>> {
    if !args.table {
        return Ok(args.inputs.iter().map(PathBuf::from).collect());
    }
    let mut files = Vec::new();
    for table in &args.inputs {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .from_path(table)
            .with_context(|| format!("cannot open sample table: {}", table))?;
        let col = reader
            .headers()?
            .iter()
            .position(|h| h == args.id_column)
            .ok_or_else(|| anyhow!("no column {:?} in table {}", args.id_column, table))?;
        for row in reader.records() {
            let row = row?;
            let id = row
                .get(col)
                .ok_or_else(|| anyhow!("short row in table {}", table))?;
            files.push(PathBuf::from(format!(
                "{}{}{}",
                args.prefix.as_deref().unwrap_or(""),
                id,
                args.suffix.as_deref().unwrap_or("")
            )));
        }
    }
    Ok(files)
}

pub fn run(args: &CoverageSitesArgs) -> Result<()> {
    let files = resolve_inputs(args)?;
    if files.is_empty() {
        anyhow::bail!("no input files resolved");
    }
    let chrom_sizes = match &args.chrom_sizes {
        Some(path) => Some(ChromSizes::from_file(path)?),
        None if !args.bigwig => Some(bam::chrom_sizes(&files[0])?),
        None => None,
    };
    let sites = regions::read_bed(&args.bed)?;
    let windows = RegionSet::new(regions::extend_midpoints(
        &sites,
        args.window,
        chrom_sizes.as_ref(),
    ));

    let profiles = if args.bigwig {
        profile::bigwig_profiles(&files, &windows, args.bins)?
    } else {
        profile::bam_profiles(&files, &windows, args.bins, args.fragment)?
    };

    for (i, file) in files.iter().enumerate() {
        info!("sample {}: {}", i, file.display());
    }
    profile::write_profiles(&args.output, &profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(line: &[&str]) -> CoverageSitesArgs {
        match Cli::parse_from(line).command {
            crate::cli::Commands::CoverageSites(args) => args,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_resolve_inputs_direct() {
        let args = parse(&["chipcmp", "coverage-sites", "sites.bed", "out.npy", "a.bam", "b.bam"]);
        assert_eq!(
            resolve_inputs(&args).unwrap(),
            vec![PathBuf::from("a.bam"), PathBuf::from("b.bam")]
        );
    }

    #[test]
    fn test_resolve_inputs_from_table() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("samples.tsv");
        std::fs::write(&table, "name\tIDs\nfirst\tSRX1\nsecond\tSRX2\n").unwrap();
        let args = parse(&[
            "chipcmp",
            "coverage-sites",
            "sites.bed",
            "out.npy",
            table.to_str().unwrap(),
            "--table",
            "--prefix",
            "data/",
            "--suffix",
            ".bw",
            "--bigwig",
        ]);
        assert_eq!(
            resolve_inputs(&args).unwrap(),
            vec![PathBuf::from("data/SRX1.bw"), PathBuf::from("data/SRX2.bw")]
        );
    }

    #[test]
    fn test_run_clips_windows_to_bam_header() {
        use noodles::sam::header::record::value::{map::ReferenceSequence, Map};
        use std::num::NonZeroUsize;

        let dir = tempfile::tempdir().unwrap();
        let bam_path = dir.path().join("empty.bam");
        let header = noodles::sam::Header::builder()
            .add_reference_sequence(
                "chr1",
                Map::<ReferenceSequence>::new(NonZeroUsize::new(1000).unwrap()),
            )
            .build();
        let mut writer =
            noodles::bam::io::Writer::new(std::fs::File::create(&bam_path).unwrap());
        writer.write_header(&header).unwrap();
        writer.try_finish().unwrap();

        let bed = dir.path().join("sites.bed");
        std::fs::write(&bed, "chr1\t940\t960\n").unwrap();
        let out = dir.path().join("profiles.npy");
        let args = parse(&[
            "chipcmp",
            "coverage-sites",
            bed.to_str().unwrap(),
            out.to_str().unwrap(),
            bam_path.to_str().unwrap(),
            "--window",
            "100",
        ]);
        run(&args).unwrap();

        // the window around the midpoint (850-1050) is clipped at the
        // 1000 bp chromosome recorded in the BAM header
        let arr: ndarray::Array3<f64> = ndarray_npy::read_npy(&out).unwrap();
        assert_eq!(arr.dim(), (1, 1, 150));
    }

    #[test]
    fn test_resolve_inputs_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("samples.tsv");
        std::fs::write(&table, "name\tother\nfirst\tx\n").unwrap();
        let args = parse(&[
            "chipcmp",
            "coverage-sites",
            "sites.bed",
            "out.npy",
            table.to_str().unwrap(),
            "--table",
        ]);
        assert!(resolve_inputs(&args).is_err());
    }
}
