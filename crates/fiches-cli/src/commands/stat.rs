use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::fs;

#[derive(Debug, Args)]
pub struct StatArgs {}

#[derive(Debug, Serialize)]
struct StoreStat<'a> {
    records: usize,
    path: String,
    exists: bool,
    size_bytes: Option<u64>,
    format: &'static str,
    warnings: &'a [String],
}

pub fn stat(ctx: &Context<'_>, _args: StatArgs) -> Result<()> {
    let metadata = fs::metadata(ctx.store_path).ok();
    let stat = StoreStat {
        records: ctx.store.len(),
        path: ctx.store_path.display().to_string(),
        exists: metadata.is_some(),
        size_bytes: metadata.map(|meta| meta.len()),
        format: ctx.store.format().as_str(),
        warnings: &ctx.open_report.warnings,
    };

    if ctx.json {
        return print_json(&stat);
    }

    println!("records: {}", stat.records);
    println!("store:   {} ({})", stat.path, stat.format);
    match stat.size_bytes {
        Some(size) => println!("size:    {size} bytes"),
        None => println!("size:    not written yet"),
    }
    for warning in stat.warnings {
        println!("warning: {warning}");
    }
    Ok(())
}
