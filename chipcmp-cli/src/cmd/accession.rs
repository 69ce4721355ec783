use anyhow::Result;
use chipcmp_core::remote::EDirect;

use crate::cli::AccessionArgs;

pub fn run(args: &AccessionArgs) -> Result<()> {
    let edirect = EDirect::new(args.edirect.clone());
    for accession in &args.accessions {
        let srx = edirect.srx_of(accession)?;
        let srr = edirect.srr_of(accession)?;
        println!("{}\t{}\t{}", accession, srx, srr.join(","));
    }
    Ok(())
}
