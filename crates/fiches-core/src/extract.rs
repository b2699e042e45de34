use regex::Regex;
use std::sync::LazyLock;

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").expect("email pattern")
});

static RE_IBAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bFR\d{25}\b").expect("iban pattern"));

static RE_BIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Z]{6})(?:[A-Z0-9]{2,5})?\b").expect("bic pattern")
});

static RE_BIRTH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}/\d{2}/\d{4}\b").expect("date pattern"));

static RE_LAST_NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:nom(?:[ \t]+de[ \t]+famille)?|last[ \t]*name|surname)[ \t]*:[ \t]*(.*?)[ \t]*$")
        .expect("last name label pattern")
});

static RE_GIVEN_NAME_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:pr[ée]nom|first[ \t]*name|given[ \t]*name)[ \t]*:[ \t]*(.*?)[ \t]*$")
        .expect("given name label pattern")
});

static RE_STREET_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\d{1,4}(?:\s*(?:bis|ter))?[\s,]").expect("street number pattern")
});

static RE_ROAD_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:rue|avenue|av|boulevard|bd|chemin|all[ée]e|impasse|place|route|quai|cours|square|lieu-dit|r[ée]sidence|lotissement|hameau)\b|\b\d{5}\b",
    )
    .expect("road keyword pattern")
});

static RE_PHONE_CANDIDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+?33|0)?\s*[1-9](?:[ .-]?\d){8}").expect("phone pattern")
});

static RE_MOBILE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:t[ée]l[ée]phone[ \t]*mobile|mobile|portable)[ \t]*:[ \t]*(.+)$")
        .expect("mobile label pattern")
});

static RE_PHONE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(?:t[ée]l[ée]phone(?:[ \t]*fixe)?|t[ée]l\.?|fixe)[ \t]*:[ \t]*(.+)$")
        .expect("phone label pattern")
});

static RE_DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{9,14}\b").expect("digit run pattern"));

static RE_TEN_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{10}\b").expect("ten digit pattern"));

pub fn extract_email(text: &str) -> Option<String> {
    RE_EMAIL.find(text).map(|m| m.as_str().to_lowercase())
}

pub fn extract_iban(text: &str) -> Option<String> {
    RE_IBAN.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_bic(text: &str) -> Option<String> {
    RE_BIC
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Labeled fields may repeat inside a unit, so the last date wins.
pub fn extract_birth_date(text: &str) -> Option<String> {
    RE_BIRTH_DATE
        .find_iter(text)
        .last()
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Names {
    pub name: Option<String>,
    pub given_name: Option<String>,
}

impl Names {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.given_name.is_none()
    }
}

pub fn extract_labeled_names(text: &str) -> Names {
    Names {
        name: first_capture(&RE_LAST_NAME_LABEL, text),
        given_name: first_capture(&RE_GIVEN_NAME_LABEL, text),
    }
}

/// Finds the first fully uppercase token directly followed by a capitalized one.
pub fn scan_names<S: AsRef<str>>(tokens: &[S]) -> Option<(String, String)> {
    tokens.windows(2).find_map(|pair| {
        let last = pair[0].as_ref().trim();
        let given = pair[1].as_ref().trim();
        if is_uppercase_name(last) && is_capitalized_name(given) {
            Some((last.to_string(), given.to_string()))
        } else {
            None
        }
    })
}

pub fn extract_address(text: &str) -> Option<String> {
    text.lines()
        .find(|line| RE_STREET_NUMBER.is_match(line) && RE_ROAD_KEYWORD.is_match(line))
        .map(|line| line.trim().to_string())
}

/// Every phone-shaped substring, in order of appearance. Windows cut out of a
/// longer digit run (IBANs, references) are not candidates; scanning resumes
/// one character further so a real number right after one is still found.
pub fn phone_candidates(text: &str) -> Vec<&str> {
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(m) = RE_PHONE_CANDIDATE.find_at(text, pos) {
        if is_standalone(text, m.start(), m.end()) {
            found.push(m.as_str());
            pos = m.end();
        } else {
            pos = m.start() + text[m.start()..].chars().next().map_or(1, char::len_utf8);
        }
    }
    found
}

fn is_standalone(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|ch| ch.is_ascii_digit()) && !after.is_some_and(|ch| ch.is_ascii_digit())
}

/// Value of the first explicit phone label, mobile labels first.
pub fn labeled_phone(text: &str) -> Option<String> {
    first_capture(&RE_MOBILE_LABEL, text).or_else(|| first_capture(&RE_PHONE_LABEL, text))
}

/// First standalone run of 9 to 14 digits.
pub fn digit_run(text: &str) -> Option<&str> {
    RE_DIGIT_RUN.find(text).map(|m| m.as_str())
}

pub fn ten_digit_run(text: &str) -> Option<&str> {
    RE_TEN_DIGITS.find(text).map(|m| m.as_str())
}

pub(crate) fn first_capture(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text).find_map(|caps| {
        let value = caps.get(1)?.as_str().trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    })
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphabetic() || matches!(ch, '-' | '\'' | ' ')
}

fn is_uppercase_name(token: &str) -> bool {
    token.chars().filter(|ch| ch.is_alphabetic()).count() >= 2
        && token.chars().all(is_name_char)
        && !token.chars().any(char::is_lowercase)
}

fn is_capitalized_name(token: &str) -> bool {
    let mut chars = token.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_uppercase() && token.chars().all(is_name_char) && chars.any(char::is_lowercase)
}
