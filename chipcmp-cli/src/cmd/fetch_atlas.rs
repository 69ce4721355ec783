use anyhow::Result;
use chipcmp_core::atlas::{self, DataType};
use log::info;

use crate::cli::FetchAtlasArgs;

pub fn run(args: &FetchAtlasArgs) -> Result<()> {
    let datatype: DataType = args.datatype.parse()?;
    let filters: Vec<String> = args
        .filter
        .as_deref()
        .map(|s| s.split(',').map(|f| f.trim().to_string()).collect())
        .unwrap_or_default();

    let agent = ureq::AgentBuilder::new().build();
    let records = atlas::fetch_table(&agent, &args.table)?;
    let kept = atlas::filter_records(records, &args.celltype, &filters);

    std::fs::create_dir_all(&args.prefix)?;
    let table_out = args.prefix.join("table.tab");
    info!("saving filtered table at {}", table_out.display());
    atlas::write_table(&table_out, &kept)?;

    atlas::fetch_data(&agent, &kept, &args.prefix, datatype, &args.threshold)
}
