use anyhow::Result;
use chipcmp_core::remote;

use crate::cli::ScanRemoteArgs;

pub fn run(args: &ScanRemoteArgs) -> Result<()> {
    let agent = ureq::AgentBuilder::new().build();
    let found = remote::scan_listings(&agent, &args.ids, &args.urls, &args.ext)?;
    for (id, url) in &found {
        println!("{}\t{}", id, url);
    }
    Ok(())
}
