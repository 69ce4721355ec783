//! Directory-listing scrapes and NCBI accession lookups.

use anyhow::{anyhow, bail, Context, Result};
use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::info;
use regex::Regex;
use std::path::PathBuf;
use std::process::{Command, Stdio};

lazy_static! {
    static ref HREF: Regex = Regex::new(r#"href=["']([^"']+)["']"#).unwrap();
}

fn hrefs(html: &str) -> impl Iterator<Item = &str> {
    HREF.captures_iter(html)
        .map(|c| c.get(1).map(|m| m.as_str()).unwrap_or(""))
}

/// Scan HTML directory listings for files whose name contains one of the
/// given IDs and ends with `ext`. Returns the ID to full-URL mapping in
/// input order; every ID must resolve or the scan fails.
pub fn scan_listings(
    agent: &ureq::Agent,
    ids: &[String],
    listing_urls: &[String],
    ext: &str,
) -> Result<IndexMap<String, String>> {
    let mut found: IndexMap<String, String> = IndexMap::new();
    for url in listing_urls {
        info!("reading path: {}", url);
        let html = agent
            .get(url)
            .call()
            .with_context(|| format!("cannot fetch listing: {}", url))?
            .into_string()?;
        for name in hrefs(&html) {
            for id in ids {
                if name.contains(id.as_str()) && name.ends_with(ext) {
                    found.insert(id.clone(), format!("{}{}", url, name));
                }
            }
        }
    }
    for id in ids {
        if !found.contains_key(id) {
            bail!("{} is not found at the given paths", id);
        }
    }
    Ok(found)
}

/// Wrapper around the NCBI EDirect command line tools (`esearch`, `efetch`,
/// `xtract`), used to map GEO sample accessions to sequence-archive
/// accessions.
#[derive(Debug, Clone, Default)]
pub struct EDirect {
    /// Directory holding the EDirect binaries; `None` means `$PATH`.
    pub dir: Option<PathBuf>,
}

impl EDirect {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    fn command(&self, name: &str) -> Command {
        match &self.dir {
            Some(dir) => Command::new(dir.join(name)),
            None => Command::new(name),
        }
    }

    /// Run `esearch -db <db> | efetch -format docsum | xtract -pattern
    /// <pattern> -element <element>` and return xtract's stdout.
    fn pipeline(&self, db: &str, query: &str, pattern: &str, element: &str) -> Result<String> {
        let mut esearch = self
            .command("esearch")
            .args(["-db", db, "-query", &format!("\"{}\"", query)])
            .stdout(Stdio::piped())
            .spawn()
            .context("cannot run esearch (is EDirect installed?)")?;
        let mut efetch = self
            .command("efetch")
            .args(["-format", "docsum"])
            .stdin(Stdio::from(
                esearch.stdout.take().ok_or_else(|| anyhow!("esearch stdout not captured"))?,
            ))
            .stdout(Stdio::piped())
            .spawn()
            .context("cannot run efetch")?;
        let output = self
            .command("xtract")
            .args(["-pattern", pattern, "-element", element])
            .stdin(Stdio::from(
                efetch.stdout.take().ok_or_else(|| anyhow!("efetch stdout not captured"))?,
            ))
            .output()
            .context("cannot run xtract")?;
        esearch.wait()?;
        efetch.wait()?;
        if !output.status.success() {
            bail!("xtract exited with {}", output.status);
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    /// Experiment accession (SRX) linked to a GEO sample accession.
    pub fn srx_of(&self, gsm: &str) -> Result<String> {
        let out = self.pipeline("gds", gsm, "ExtRelations", "TargetObject")?;
        out.lines()
            .filter(|l| !l.trim().is_empty())
            .last()
            .map(str::to_string)
            .ok_or_else(|| anyhow!("no experiment accession found for {}", gsm))
    }

    /// Run accessions (SRR) linked to a GEO sample accession, deduplicated.
    pub fn srr_of(&self, gsm: &str) -> Result<Vec<String>> {
        let out = self.pipeline("sra", gsm, "DocumentSummary", "Run@acc")?;
        let mut runs: Vec<String> = out
            .split(['\t', '\n'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        runs.sort();
        runs.dedup();
        if runs.is_empty() {
            bail!("no run accessions found for {}", gsm);
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hrefs_extraction() {
        let html = r#"<a href="sample1.bam">x</a> <a href='sample2.bai'>y</a> <a>none</a>"#;
        let links: Vec<&str> = hrefs(html).collect();
        assert_eq!(links, vec!["sample1.bam", "sample2.bai"]);
    }

    #[test]
    fn test_scan_requires_all_ids() {
        // no listings at all: every ID is missing
        let agent = ureq::AgentBuilder::new().build();
        let err = scan_listings(&agent, &["GSM1".to_string()], &[], "bam").unwrap_err();
        assert!(err.to_string().contains("GSM1"));
    }

    #[test]
    fn test_edirect_command_dir() {
        let ed = EDirect::new(Some(PathBuf::from("/opt/edirect")));
        let cmd = ed.command("esearch");
        assert_eq!(cmd.get_program(), std::path::Path::new("/opt/edirect/esearch"));
        let ed = EDirect::default();
        assert_eq!(ed.command("esearch").get_program(), "esearch");
    }
}
