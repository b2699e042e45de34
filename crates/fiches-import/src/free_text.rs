use crate::batch::{dedupe_first, ImportOptions, Unit};
use crate::detect::InputFormat;
use fiches_core::domain::{Fiche, PhoneKey};
use fiches_core::extract::{phone_candidates, ten_digit_run};
use fiches_core::CoreError;
use regex::Regex;
use std::sync::LazyLock;

static RE_PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern"));

pub(crate) fn build_units(text: &str, _format: InputFormat, _options: &ImportOptions) -> Vec<Unit> {
    RE_PARAGRAPH_BREAK
        .split(text.trim())
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .enumerate()
        .map(|(index, paragraph)| build_paragraph(index + 1, paragraph))
        .collect()
}

/// Every distinct number of a paragraph gets the whole paragraph as its body.
fn build_paragraph(index: usize, paragraph: &str) -> Unit {
    let label = format!("paragraph {index}");
    let raw_numbers = phone_candidates(paragraph);

    let mut fiches: Vec<Fiche> = raw_numbers
        .iter()
        .filter_map(|raw| PhoneKey::parse(raw).ok())
        .map(|key| Fiche::new(key, paragraph))
        .collect();
    fiches = dedupe_first(fiches);

    if fiches.is_empty() {
        if let Some(key) = ten_digit_run(paragraph).and_then(|raw| PhoneKey::parse(raw).ok()) {
            fiches.push(Fiche::new(key, paragraph));
        }
    }

    if !fiches.is_empty() {
        return Unit::built(label, fiches);
    }

    let err = match raw_numbers.first() {
        Some(raw) => CoreError::InvalidPhone(raw.trim().to_string()),
        None => CoreError::MalformedUnit("no phone number found".to_string()),
    };
    Unit::dropped(label, err)
}

#[cfg(test)]
mod tests {
    use super::build_units;
    use crate::batch::ImportOptions;
    use crate::detect::InputFormat;
    use fiches_core::CoreError;

    fn build(text: &str) -> Vec<super::Unit> {
        build_units(text, InputFormat::FreeText, &ImportOptions::default())
    }

    #[test]
    fn paragraph_with_two_numbers_yields_two_records() {
        let text = "Jean DUPONT\nperso 06 12 34 56 78\npro +33 1 23 45 67 89\nrappel 0612345678";
        let units = build(text);
        assert_eq!(units.len(), 1);
        let fiches = units[0].outcome.as_ref().expect("built");
        let keys: Vec<&str> = fiches.iter().map(|fiche| fiche.key.as_str()).collect();
        assert_eq!(keys, vec!["0612345678", "0123456789"]);
        assert!(fiches.iter().all(|fiche| fiche.body == text));
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let units = build("A 0612345678\n  \t\nB 0712345678\n\n\n");
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].label, "paragraph 2");
    }

    #[test]
    fn paragraph_without_number_is_malformed() {
        let units = build("juste du texte");
        assert!(matches!(units[0].outcome, Err(CoreError::MalformedUnit(_))));
    }
}
