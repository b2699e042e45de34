use crate::commands::{print_json, Context};
use anyhow::{Context as _, Result};
use clap::Args;
use fiches_store::ImportReport;
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Text files to import; stdin is read when none are given
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SourceReport {
    source: String,
    #[serde(flatten)]
    report: ImportReport,
}

pub fn import(ctx: &Context<'_>, args: ImportArgs) -> Result<()> {
    let sources: Vec<(String, Vec<u8>)> = if args.files.is_empty() {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .with_context(|| "read stdin")?;
        vec![("stdin".to_string(), buf)]
    } else {
        args.files
            .iter()
            .map(|path| {
                fs::read(path)
                    .map(|bytes| (path.display().to_string(), bytes))
                    .with_context(|| format!("read {}", path.display()))
            })
            .collect::<Result<_>>()?
    };

    let mut reports = Vec::new();
    for (source, bytes) in sources {
        let text = String::from_utf8_lossy(&bytes);
        match ctx.store.import(&text) {
            Ok(report) => reports.push(SourceReport { source, report }),
            Err(err) => {
                if let Some(report) = err.import_report() {
                    reports.push(SourceReport {
                        source: source.clone(),
                        report: report.clone(),
                    });
                    print_reports(ctx, &reports)?;
                }
                return Err(err).with_context(|| format!("import {source}"));
            }
        }
    }

    print_reports(ctx, &reports)
}

fn print_reports(ctx: &Context<'_>, reports: &[SourceReport]) -> Result<()> {
    if ctx.json {
        return print_json(&reports);
    }

    for SourceReport { source, report } in reports {
        println!(
            "{source}: added {}, updated {}, duplicate {}, skipped {} (total {}, {})",
            report.added,
            report.updated,
            report.duplicate,
            report.skipped,
            report.total,
            report.format.as_str()
        );
        if report.is_empty() {
            eprintln!(
                "hint: no record found in {source}; expected `|` separated rows, \
                 `Fiche N` blocks or text containing French phone numbers"
            );
        }
    }
    Ok(())
}
