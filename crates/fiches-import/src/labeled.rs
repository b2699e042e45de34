use crate::batch::{ImportOptions, Unit};
use crate::detect::{HeaderKind, InputFormat};
use crate::free_text;
use fiches_core::domain::{Fiche, PhoneKey};
use fiches_core::extract::{digit_run, labeled_phone};
use fiches_core::CoreError;
use tracing::debug;

struct Header<'a> {
    start: usize,
    end: usize,
    key: Option<&'a str>,
}

pub(crate) fn build_units(text: &str, format: InputFormat, options: &ImportOptions) -> Vec<Unit> {
    let InputFormat::LabeledBlock(kind) = format else {
        return Vec::new();
    };

    let headers: Vec<Header<'_>> = kind
        .pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(Header {
                start: whole.start(),
                end: whole.end(),
                key: caps.get(1).map(|m| m.as_str()),
            })
        })
        .collect();

    let mut units = headers
        .first()
        .map(|first| preamble_units(&text[..first.start], options))
        .unwrap_or_default();

    units.extend(headers.iter().enumerate().map(|(index, header)| {
        let block_end = headers.get(index + 1).map_or(text.len(), |next| next.start);
        let label = format!("block {}", index + 1);
        match kind {
            HeaderKind::ExportDelimiter => {
                build_exported(label, header.key, &text[header.end..block_end])
            }
            HeaderKind::FicheHeader => build_fiche(label, &text[header.start..block_end]),
        }
    }));
    units
}

/// Text ahead of the first header is read as free text so nothing is lost silently.
fn preamble_units(preamble: &str, options: &ImportOptions) -> Vec<Unit> {
    if preamble.trim().is_empty() {
        return Vec::new();
    }
    debug!("reading text before the first block header as free text");
    free_text::build_units(preamble, InputFormat::FreeText, options)
        .into_iter()
        .map(|unit| Unit {
            label: format!("preamble {}", unit.label),
            ..unit
        })
        .collect()
}

/// The delimiter line is framing, not part of the record.
fn build_exported(label: String, header_key: Option<&str>, rest: &str) -> Unit {
    let body = rest.trim();
    if body.is_empty() {
        return Unit::dropped(label, CoreError::MalformedUnit("empty record".to_string()));
    }

    let key = match header_key.and_then(|raw| PhoneKey::parse(raw).ok()) {
        Some(key) => Ok(key),
        None => locate_phone(body),
    };
    match key {
        Ok(key) => Unit::built(label, vec![Fiche::new(key, body)]),
        Err(err) => Unit::dropped(label, err),
    }
}

fn build_fiche(label: String, block: &str) -> Unit {
    match locate_phone(block) {
        Ok(key) => Unit::built(label, vec![Fiche::new(key, block.trim())]),
        Err(err) => Unit::dropped(label, err),
    }
}

fn locate_phone(block: &str) -> Result<PhoneKey, CoreError> {
    let labeled = labeled_phone(block);
    if let Some(key) = labeled.as_deref().and_then(|raw| PhoneKey::parse(raw).ok()) {
        return Ok(key);
    }
    if let Some(raw) = digit_run(block) {
        return PhoneKey::parse(raw);
    }
    Err(match labeled {
        Some(raw) => CoreError::InvalidPhone(raw),
        None => CoreError::MalformedUnit("no phone label or digit run".to_string()),
    })
}
