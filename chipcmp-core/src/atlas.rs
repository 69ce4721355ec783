//! ChIP-Atlas metadata queries and bulk download of peak/signal files.

use anyhow::{bail, Context, Result};
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Latest experiment table published by ChIP-Atlas.
pub const DEFAULT_TABLE_URL: &str =
    "http://dbarchive.biosciencedbc.jp/kyushu-u/metadata/experimentList.tab";

const ARCHIVE_BASE: &str = "http://dbarchive.biosciencedbc.jp/kyushu-u";
const N_COLUMNS: usize = 13;

/// One experiment of the ChIP-Atlas table (the first 13 columns; the table
/// carries a variable number of trailing metadata columns that are ignored).
#[derive(Debug, Clone, Serialize)]
pub struct AtlasRecord {
    pub id: String,
    pub assembly: String,
    pub antigen_class: String,
    pub antigen: String,
    pub cell_type_class: String,
    pub cell_type: String,
    pub cell_description: String,
    pub process_log: String,
    pub title: String,
    pub meta_by_author: String,
    pub meta2: String,
    pub meta3: String,
    pub meta4: String,
}

impl AtlasRecord {
    fn from_fields(fields: &csv::StringRecord) -> Self {
        let get = |i: usize| fields.get(i).unwrap_or("").to_string();
        AtlasRecord {
            id: get(0),
            assembly: get(1),
            antigen_class: get(2),
            antigen: get(3),
            cell_type_class: get(4),
            cell_type: get(5),
            cell_description: get(6),
            process_log: get(7),
            title: get(8),
            meta_by_author: get(9),
            meta2: get(10),
            meta3: get(11),
            meta4: get(12),
        }
    }

    fn meta_fields(&self) -> [&str; 4] {
        [&self.meta_by_author, &self.meta2, &self.meta3, &self.meta4]
    }

    /// Peak list URL at the given Q-value threshold (e.g. "05" for 10e-5).
    pub fn bed_url(&self, threshold: &str) -> String {
        format!(
            "{}/{}/eachData/bed{}/{}.{}.bed",
            ARCHIVE_BASE, self.assembly, threshold, self.id, threshold
        )
    }

    pub fn bigwig_url(&self) -> String {
        format!("{}/{}/eachData/bw/{}.bw", ARCHIVE_BASE, self.assembly, self.id)
    }
}

/// Which per-experiment files to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Bed,
    Bigwig,
    Both,
}

impl DataType {
    pub fn wants_bed(self) -> bool {
        matches!(self, DataType::Bed | DataType::Both)
    }

    pub fn wants_bigwig(self) -> bool {
        matches!(self, DataType::Bigwig | DataType::Both)
    }
}

impl std::str::FromStr for DataType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bed" => Ok(DataType::Bed),
            "bigwig" => Ok(DataType::Bigwig),
            "both" => Ok(DataType::Both),
            other => bail!("unknown data type: {} (expected bed, bigwig or both)", other),
        }
    }
}

fn parse_table<R: Read>(reader: R) -> Result<Vec<AtlasRecord>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        if row.len() < N_COLUMNS {
            continue;
        }
        records.push(AtlasRecord::from_fields(&row));
    }
    Ok(records)
}

/// Download and parse the experiment table.
pub fn fetch_table(agent: &ureq::Agent, url: &str) -> Result<Vec<AtlasRecord>> {
    info!("parsing table: {}", url);
    let response = agent
        .get(url)
        .call()
        .with_context(|| format!("cannot fetch table: {}", url))?;
    parse_table(response.into_reader())
}

/// Keep records of the given cell type; when `meta_filters` is non-empty, a
/// record must additionally carry at least one of the filter strings in any
/// of its four metadata columns.
pub fn filter_records(
    records: Vec<AtlasRecord>,
    cell_type: &str,
    meta_filters: &[String],
) -> Vec<AtlasRecord> {
    let kept: Vec<AtlasRecord> = records
        .into_iter()
        .filter(|r| r.cell_type == cell_type)
        .filter(|r| {
            meta_filters.is_empty()
                || meta_filters
                    .iter()
                    .any(|f| r.meta_fields().iter().any(|m| m.contains(f.as_str())))
        })
        .collect();
    info!("{} entries remained", kept.len());
    kept
}

/// Write the filtered table as tab-delimited text with a header row.
pub fn write_table<P: AsRef<Path>>(path: P, records: &[AtlasRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&path)
        .with_context(|| format!("cannot create file: {}", path.as_ref().display()))?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Download `url` to `dest` unless the file is already present.
pub fn download<P: AsRef<Path>>(agent: &ureq::Agent, url: &str, dest: P) -> Result<()> {
    let dest = dest.as_ref();
    if dest.is_file() {
        return Ok(());
    }
    let response = agent
        .get(url)
        .call()
        .with_context(|| format!("cannot fetch: {}", url))?;
    let mut file =
        File::create(dest).with_context(|| format!("cannot create file: {}", dest.display()))?;
    std::io::copy(&mut response.into_reader(), &mut file)?;
    Ok(())
}

/// Fetch the peak lists and/or signal tracks of every record into
/// `<prefix>/bed` and `<prefix>/bigwig`, skipping files already on disk.
pub fn fetch_data<P: AsRef<Path>>(
    agent: &ureq::Agent,
    records: &[AtlasRecord],
    prefix: P,
    datatype: DataType,
    threshold: &str,
) -> Result<()> {
    let prefix = prefix.as_ref();
    if datatype.wants_bed() {
        let dir = prefix.join("bed");
        std::fs::create_dir_all(&dir)?;
        info!(
            "obtaining peak lists with Q value threshold 10e-{}",
            threshold
        );
        for record in records {
            let dest = dir.join(format!("{}.{}.bed", record.id, threshold));
            download(agent, &record.bed_url(threshold), dest)?;
        }
    }
    if datatype.wants_bigwig() {
        let dir = prefix.join("bigwig");
        std::fs::create_dir_all(&dir)?;
        info!("obtaining signal tracks");
        for record in records {
            let dest = dir.join(format!("{}.bw", record.id));
            download(agent, &record.bigwig_url(), dest)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Vec<AtlasRecord> {
        let text = "SRX100001\thg19\tTFs\tCTCF\tBlood\tK-562\tleukemia\tlog\ttitle\tsource_name=K562\tchronic\t\textra\nSRX100002\thg19\tTFs\tGATA1\tBlood\tK-562\tleukemia\tlog\ttitle\tsource_name=HeLa\t\t\t\nSRX100003\tmm9\tTFs\tCTCF\tBlood\tMEL\terythroleukemia\tlog\ttitle\tsource=MEL\t\t\t\nbadrow\tonly\tthree\n";
        parse_table(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_parse_table_skips_short_rows() {
        let records = table();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id, "SRX100001");
        assert_eq!(records[2].assembly, "mm9");
    }

    #[test]
    fn test_filter_by_cell_type() {
        let kept = filter_records(table(), "K-562", &[]);
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().all(|r| r.cell_type == "K-562"));
    }

    #[test]
    fn test_filter_by_metadata() {
        let kept = filter_records(table(), "K-562", &["K562".to_string()]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "SRX100001");
        // any filter matching any metadata column keeps the record
        let kept = filter_records(
            table(),
            "K-562",
            &["nonsense".to_string(), "HeLa".to_string()],
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "SRX100002");
    }

    #[test]
    fn test_urls() {
        let record = &table()[0];
        assert_eq!(
            record.bed_url("05"),
            "http://dbarchive.biosciencedbc.jp/kyushu-u/hg19/eachData/bed05/SRX100001.05.bed"
        );
        assert_eq!(
            record.bigwig_url(),
            "http://dbarchive.biosciencedbc.jp/kyushu-u/hg19/eachData/bw/SRX100001.bw"
        );
    }

    #[test]
    fn test_datatype_parse() {
        assert_eq!("both".parse::<DataType>().unwrap(), DataType::Both);
        assert!(DataType::Bed.wants_bed());
        assert!(!DataType::Bed.wants_bigwig());
        assert!("netcdf".parse::<DataType>().is_err());
    }
}
