use crate::commands::{print_json, Context};
use crate::error::not_found;
use anyhow::{Context as _, Result};
use clap::Args;
use fiches_core::domain::{FicheFields, PhoneKey};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Phone number, in any accepted French form
    pub number: String,
}

#[derive(Debug, Serialize)]
struct FicheDetail {
    key: PhoneKey,
    body: String,
    fields: FicheFields,
}

pub fn show(ctx: &Context<'_>, args: ShowArgs) -> Result<()> {
    let body = ctx
        .store
        .lookup(&args.number)
        .with_context(|| format!("look up {}", args.number))?
        .ok_or_else(|| not_found(format!("no record for {}", args.number)))?;

    if ctx.json {
        let key = PhoneKey::parse(&args.number)?;
        let fields = FicheFields::from_body(&body);
        return print_json(&FicheDetail { key, body, fields });
    }

    println!("{body}");
    Ok(())
}
