use crate::detect::{self, InputFormat};
use crate::layout::RowLayout;
use fiches_core::domain::{Fiche, PhoneKey};
use fiches_core::CoreError;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub layout: RowLayout,
}

#[derive(Debug, Clone)]
pub struct ParsedBatch {
    pub format: InputFormat,
    pub candidates: Vec<Fiche>,
    pub warnings: Vec<String>,
    pub skipped: usize,
}

/// One line, block or paragraph of input and the records built from it.
#[derive(Debug)]
pub(crate) struct Unit {
    pub label: String,
    pub outcome: Result<Vec<Fiche>, CoreError>,
}

impl Unit {
    pub fn built(label: String, fiches: Vec<Fiche>) -> Self {
        Self {
            label,
            outcome: Ok(fiches),
        }
    }

    pub fn dropped(label: String, err: CoreError) -> Self {
        Self {
            label,
            outcome: Err(err),
        }
    }
}

pub fn parse_text(text: &str, options: &ImportOptions) -> ParsedBatch {
    let text = normalize_newlines(text);
    let (format, build) = detect::select(&text, options);
    let units = build(&text, format, options);
    debug!(format = format.as_str(), units = units.len(), "input classified");

    let mut candidates = Vec::new();
    let mut warnings = Vec::new();
    let mut skipped = 0;
    let mut seen: HashSet<PhoneKey> = HashSet::new();

    for unit in units {
        let fiches = match unit.outcome {
            Ok(fiches) => fiches,
            Err(err) => {
                warn!(unit = %unit.label, error = %err, "skipping unit");
                warnings.push(format!("{}: {err}", unit.label));
                skipped += 1;
                continue;
            }
        };

        for fiche in fiches {
            if seen.insert(fiche.key.clone()) {
                candidates.push(fiche);
            } else {
                warnings.push(format!(
                    "{}: number {} already seen in this batch, keeping the first occurrence",
                    unit.label, fiche.key
                ));
                skipped += 1;
            }
        }
    }

    debug!(candidates = candidates.len(), skipped, "batch parsed");

    ParsedBatch {
        format,
        candidates,
        warnings,
        skipped,
    }
}

pub(crate) fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Keeps the first record for each key, preserving order.
pub(crate) fn dedupe_first(fiches: Vec<Fiche>) -> Vec<Fiche> {
    let mut seen = HashSet::new();
    fiches
        .into_iter()
        .filter(|fiche| seen.insert(fiche.key.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_text, ImportOptions};
    use crate::detect::InputFormat;

    #[test]
    fn repeated_key_across_units_keeps_first() {
        let text = "Jean 0612345678 premier\n\nJean 06 12 34 56 78 second";
        let parsed = parse_text(text, &ImportOptions::default());
        assert_eq!(parsed.format, InputFormat::FreeText);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].body, "Jean 0612345678 premier");
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn unit_without_number_is_skipped_not_fatal() {
        let text = "rien ici\n\nClaire 0712345678";
        let parsed = parse_text(text, &ImportOptions::default());
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].key.as_str(), "0712345678");
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn carriage_returns_are_normalized() {
        let parsed = parse_text("Claire\r\n0712345678\r\n", &ImportOptions::default());
        assert_eq!(parsed.candidates[0].body, "Claire\n0712345678");
    }

    #[test]
    fn header_without_labels_is_read_as_free_text() {
        let parsed = parse_text("Fiche 1\nJean DUPONT 06 12 34 56 78\n", &ImportOptions::default());
        assert_eq!(parsed.format, InputFormat::FreeText);
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.candidates[0].key.as_str(), "0612345678");
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn stray_header_line_keeps_surrounding_paragraphs() {
        let text = "Jean 0612345678\n\nvoir la\nFiche 2\n\nClaire 07 12 34 56 78";
        let parsed = parse_text(text, &ImportOptions::default());
        let keys: Vec<&str> = parsed.candidates.iter().map(|f| f.key.as_str()).collect();
        assert_eq!(keys, ["0612345678", "0712345678"]);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn text_before_first_header_is_accounted_for() {
        let text = "Liste du 12/03\n\nFiche 1\nNom: DUPONT\nMobile: 0612345678\n";
        let parsed = parse_text(text, &ImportOptions::default());
        assert_eq!(parsed.candidates.len(), 1);
        assert_eq!(parsed.skipped, 1);
        assert!(parsed.warnings[0].starts_with("preamble"));
    }

    #[test]
    fn empty_input_yields_nothing() {
        let parsed = parse_text("   \n\n", &ImportOptions::default());
        assert!(parsed.candidates.is_empty());
        assert_eq!(parsed.skipped, 0);
    }
}
