use crate::batch::{ImportOptions, Unit};
use crate::detect::InputFormat;
use crate::layout::RowLayout;
use fiches_core::domain::{Fiche, PhoneKey};
use fiches_core::extract::{
    extract_bic, extract_birth_date, extract_email, extract_iban, scan_names,
};
use fiches_core::CoreError;

/// Name positions used when the layout pins none and the scan finds nothing.
const FALLBACK_NAME: usize = 0;
const FALLBACK_GIVEN_NAME: usize = 1;

pub(crate) fn build_units(text: &str, _format: InputFormat, options: &ImportOptions) -> Vec<Unit> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| build_row(index + 1, line, &options.layout))
        .collect()
}

fn build_row(line_no: usize, line: &str, layout: &RowLayout) -> Unit {
    let label = format!("line {line_no}");
    let fields: Vec<&str> = line.split(layout.separator).map(str::trim).collect();
    if fields.len() < layout.min_fields {
        return Unit::dropped(
            label,
            CoreError::MalformedUnit(format!(
                "expected at least {} fields, found {}",
                layout.min_fields,
                fields.len()
            )),
        );
    }

    let Some(raw_phone) = fields.get(layout.phone) else {
        return Unit::dropped(
            label,
            CoreError::MalformedUnit(format!("no field at phone position {}", layout.phone)),
        );
    };
    match PhoneKey::parse(raw_phone) {
        Ok(key) => Unit::built(label, vec![Fiche::new(key, render_row(&fields, layout))]),
        Err(err) => Unit::dropped(label, err),
    }
}

/// Title line first, then only the optional lines that have a value.
fn render_row(fields: &[&str], layout: &RowLayout) -> String {
    let field = |position: Option<usize>| {
        position
            .and_then(|pos| fields.get(pos))
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
    };

    let (name, given_name) = if layout.pins_names() {
        (field(layout.name), field(layout.given_name))
    } else {
        match scan_names(fields) {
            Some((name, given_name)) => (Some(name), Some(given_name)),
            None => (field(Some(FALLBACK_NAME)), field(Some(FALLBACK_GIVEN_NAME))),
        }
    };

    let title = ["Fiche pour"]
        .into_iter()
        .chain(name.as_deref())
        .chain(given_name.as_deref())
        .collect::<Vec<_>>()
        .join(" ");
    let mut lines = vec![title];

    if let Some(date) = field(layout.birth_date) {
        lines.push(format!(
            "Date de naissance: {}",
            canonical(&date, extract_birth_date)
        ));
    }

    let address = layout
        .address
        .iter()
        .filter_map(|pos| field(Some(*pos)))
        .collect::<Vec<_>>()
        .join(" ");
    if !address.is_empty() {
        lines.push(format!("Adresse: {address}"));
    }

    if let Some(email) = field(layout.email) {
        lines.push(format!("Email: {}", canonical(&email, extract_email)));
    }
    if let Some(iban) = field(layout.iban) {
        lines.push(format!("IBAN: {}", canonical(&iban, extract_iban)));
    }
    if let Some(bic) = field(layout.bic) {
        lines.push(format!("BIC: {}", canonical(&bic, extract_bic)));
    }

    lines.join("\n")
}

fn canonical(raw: &str, extractor: fn(&str) -> Option<String>) -> String {
    extractor(raw).unwrap_or_else(|| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::build_units;
    use crate::batch::ImportOptions;
    use crate::detect::InputFormat;
    use crate::layout::RowLayout;
    use fiches_core::CoreError;

    fn build(text: &str, options: &ImportOptions) -> Vec<super::Unit> {
        build_units(text, InputFormat::DelimitedRow, options)
    }

    #[test]
    fn full_row_renders_every_line() {
        let text = "DUPONT|Jean|01/02/1980|3 rue Haute|75001|Paris|06 12 34 56 78|Jean@Example.fr|FR7611111111111111111111111|BNPAFRPPXXX|";
        let units = build(text, &ImportOptions::default());
        let fiches = units[0].outcome.as_ref().expect("built");
        assert_eq!(fiches[0].key.as_str(), "0612345678");
        assert_eq!(
            fiches[0].body,
            "Fiche pour DUPONT Jean\nDate de naissance: 01/02/1980\nAdresse: 3 rue Haute 75001 Paris\nEmail: jean@example.fr\nIBAN: FR7611111111111111111111111\nBIC: BNPAFR"
        );
    }

    #[test]
    fn empty_optional_fields_are_omitted() {
        let text = "MARTIN|Claire||||Lyon|0712345678||||";
        let units = build(text, &ImportOptions::default());
        let fiches = units[0].outcome.as_ref().expect("built");
        assert_eq!(fiches[0].body, "Fiche pour MARTIN Claire\nAdresse: Lyon");
    }

    #[test]
    fn unrecognized_values_are_kept_verbatim() {
        let text = "LEROY|Paul|1980|1 place Nette|69001|Lyon|0712345678|pas-un-email|FR76 1111|xx|";
        let units = build(text, &ImportOptions::default());
        let body = &units[0].outcome.as_ref().expect("built")[0].body;
        assert!(body.contains("Date de naissance: 1980"));
        assert!(body.contains("Email: pas-un-email"));
        assert!(body.contains("IBAN: FR76 1111"));
        assert!(body.contains("BIC: xx"));
    }

    #[test]
    fn scan_finds_names_away_from_the_front() {
        let text = "123|DUPONT|Jean|x|x|x|0612345678|||";
        let units = build(text, &ImportOptions::default());
        let body = &units[0].outcome.as_ref().expect("built")[0].body;
        assert!(body.starts_with("Fiche pour DUPONT Jean\n"));
    }

    #[test]
    fn pinned_positions_skip_the_scan() {
        let options = ImportOptions {
            layout: RowLayout {
                name: Some(1),
                given_name: Some(0),
                ..RowLayout::default()
            },
        };
        let text = "jean|dupont|||||0612345678|||";
        let units = build(text, &options);
        let body = &units[0].outcome.as_ref().expect("built")[0].body;
        assert_eq!(body, "Fiche pour dupont jean");
    }

    #[test]
    fn short_rows_and_bad_numbers_are_dropped() {
        let units = build("A|B|C\nX|Y||||||0000||", &ImportOptions::default());
        assert!(matches!(units[0].outcome, Err(CoreError::MalformedUnit(_))));
        assert!(matches!(units[1].outcome, Err(CoreError::InvalidPhone(_))));
    }

    #[test]
    fn phone_position_past_the_row_drops_the_row() {
        let options = ImportOptions {
            layout: RowLayout {
                phone: 12,
                ..RowLayout::default()
            },
        };
        let text = "DUPONT|Jean|01/02/1980|3 rue Haute|75001|Paris|0612345678|a@b.fr|x|y\nMARTIN|Claire|||||0712345678|||";
        let units = build(text, &options);
        assert_eq!(units.len(), 2);
        for unit in &units {
            assert!(
                matches!(unit.outcome, Err(CoreError::MalformedUnit(ref msg)) if msg.contains("12"))
            );
        }
    }
}
