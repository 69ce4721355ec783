use anyhow::{Context, Result};
use bed_utils::bed::{BEDLike, GenomicRange};
use indexmap::IndexMap;
use std::io::BufRead;
use std::path::Path;

/// Ordered map from chromosome name to chromosome length.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ChromSizes(IndexMap<String, u64>);

impl ChromSizes {
    pub fn get(&self, chrom: &str) -> Option<u64> {
        self.0.get(chrom).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Read a two-column `chrom.sizes` file (name, length).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = crate::regions::open_maybe_gzip(&path)?;
        reader
            .lines()
            .filter_map(|line| match line {
                Ok(l) if l.trim().is_empty() => None,
                Ok(l) => Some(Ok(l)),
                Err(e) => Some(Err(e)),
            })
            .map(|line| {
                let line = line?;
                let mut fields = line.split_whitespace();
                let chrom = fields
                    .next()
                    .context("missing chromosome name")?
                    .to_string();
                let size = fields
                    .next()
                    .with_context(|| format!("missing size for chromosome {}", chrom))?
                    .parse::<u64>()
                    .with_context(|| format!("invalid size for chromosome {}", chrom))?;
                Ok((chrom, size))
            })
            .collect::<Result<_>>()
            .with_context(|| {
                format!("cannot read chromosome sizes: {}", path.as_ref().display())
            })
    }

    /// Chromosome names and lengths from a SAM/BAM header.
    pub fn from_header(header: &noodles::sam::Header) -> Self {
        header
            .reference_sequences()
            .iter()
            .map(|(name, seq)| (name.to_string(), seq.length().get() as u64))
            .collect()
    }

    /// Clamp a region to `[0, chromosome length)`. Regions on unknown
    /// chromosomes are returned unchanged.
    pub fn clip(&self, mut region: GenomicRange) -> GenomicRange {
        if let Some(size) = self.get(region.chrom()) {
            let start = region.start().min(size);
            let end = region.end().min(size);
            region.set_start(start);
            region.set_end(end.max(start));
        }
        region
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for ChromSizes {
    fn from_iter<T: IntoIterator<Item = (S, u64)>>(iter: T) -> Self {
        ChromSizes(iter.into_iter().map(|(s, l)| (s.into(), l)).collect())
    }
}

impl<'a> IntoIterator for &'a ChromSizes {
    type Item = (&'a String, &'a u64);
    type IntoIter = indexmap::map::Iter<'a, String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ChromSizes {
    type Item = (String, u64);
    type IntoIter = indexmap::map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip() {
        let sizes: ChromSizes = [("chr1", 1000u64)].into_iter().collect();
        let clipped = sizes.clip(GenomicRange::new("chr1", 800, 1200));
        assert_eq!(clipped, GenomicRange::new("chr1", 800, 1000));

        // unknown chromosome passes through
        let clipped = sizes.clip(GenomicRange::new("chr2", 800, 1200));
        assert_eq!(clipped, GenomicRange::new("chr2", 800, 1200));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.chrom.sizes");
        std::fs::write(&path, "chr1\t248956422\nchr2\t242193529\n").unwrap();
        let sizes = ChromSizes::from_file(&path).unwrap();
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes.get("chr2"), Some(242193529));
        assert_eq!(sizes.get("chrX"), None);
    }
}
