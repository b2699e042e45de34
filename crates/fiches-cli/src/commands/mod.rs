use anyhow::Result;
use fiches_store::{FicheStore, OpenReport};
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;

pub mod backup;
pub mod completions;
pub mod export;
pub mod import;
pub mod show;
pub mod stat;

pub struct Context<'a> {
    pub store: &'a FicheStore,
    pub store_path: &'a Path,
    pub open_report: &'a OpenReport,
    pub json: bool,
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}
