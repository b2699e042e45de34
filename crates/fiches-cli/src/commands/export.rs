use crate::commands::{print_json, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Write the document here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct ExportReport {
    output: String,
    records: usize,
}

pub fn export(ctx: &Context<'_>, args: ExportArgs) -> Result<()> {
    let snapshot = ctx.store.snapshot();
    let document = snapshot.export_text();

    let Some(out) = args.out else {
        let mut stdout = io::stdout().lock();
        stdout.write_all(document.as_bytes())?;
        return Ok(());
    };

    fs::write(&out, &document).with_context(|| format!("write export {}", out.display()))?;
    if ctx.json {
        return print_json(&ExportReport {
            output: out.display().to_string(),
            records: snapshot.len(),
        });
    }
    println!("Exported {} records to {}", snapshot.len(), out.display());
    Ok(())
}
