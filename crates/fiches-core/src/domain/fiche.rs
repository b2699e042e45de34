use crate::domain::phone::PhoneKey;
use crate::extract::{
    extract_address, extract_bic, extract_birth_date, extract_email, extract_iban,
    extract_labeled_names, first_capture, scan_names, Names,
};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static RE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Fiche pour[ \t]+(.+)$").expect("title pattern"));

static RE_ADDRESS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*adresse[ \t]*:[ \t]*(.+)$").expect("address label pattern")
});

static RE_IBAN_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*iban[ \t]*:[ \t]*(.+)$").expect("iban label pattern"));

static RE_BIC_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:bic|swift)[ \t]*:[ \t]*(.+)$").expect("bic label pattern")
});

/// A candidate record: canonical key plus the text stored for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fiche {
    pub key: PhoneKey,
    pub body: String,
}

impl Fiche {
    pub fn new(key: PhoneKey, body: impl Into<String>) -> Self {
        Self {
            key,
            body: body.into(),
        }
    }
}

/// Structured view over a stored body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FicheFields {
    pub name: Option<String>,
    pub given_name: Option<String>,
    pub birth_date: Option<String>,
    pub address: Option<String>,
    pub email: Option<String>,
    pub iban: Option<String>,
    pub bic: Option<String>,
}

impl FicheFields {
    pub fn from_body(body: &str) -> Self {
        let names = resolve_names(body);
        let address = first_capture(&RE_ADDRESS_LABEL, body).or_else(|| extract_address(body));
        let iban = first_capture(&RE_IBAN_LABEL, body)
            .and_then(|value| extract_iban(&compact(&value)))
            .or_else(|| extract_iban(body));
        let bic = first_capture(&RE_BIC_LABEL, body)
            .and_then(|value| extract_bic(&value))
            .or_else(|| {
                body.split_whitespace()
                    .filter(|token| Some(*token) != names.name.as_deref())
                    .find_map(extract_bic)
            });

        Self {
            name: names.name,
            given_name: names.given_name,
            birth_date: extract_birth_date(body),
            address,
            email: extract_email(body),
            iban,
            bic,
        }
    }
}

fn resolve_names(body: &str) -> Names {
    let labeled = extract_labeled_names(body);
    if !labeled.is_empty() {
        return labeled;
    }

    if let Some(title) = first_capture(&RE_TITLE, body) {
        let tokens: Vec<&str> = title.split_whitespace().collect();
        if let Some((name, given_name)) = scan_names(&tokens) {
            return Names {
                name: Some(name),
                given_name: Some(given_name),
            };
        }
        let mut iter = tokens.into_iter();
        let name = iter.next().map(str::to_string);
        let rest = iter.collect::<Vec<_>>().join(" ");
        return Names {
            name,
            given_name: (!rest.is_empty()).then_some(rest),
        };
    }

    let tokens: Vec<&str> = body.split_whitespace().collect();
    match scan_names(&tokens) {
        Some((name, given_name)) => Names {
            name: Some(name),
            given_name: Some(given_name),
        },
        None => Names::default(),
    }
}

fn compact(value: &str) -> String {
    value.chars().filter(|ch| !ch.is_whitespace()).collect()
}
