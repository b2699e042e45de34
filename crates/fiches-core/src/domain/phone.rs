use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const PHONE_KEY_LEN: usize = 10;

/// Canonicalizes a French phone number to its 10-digit national form.
///
/// Everything except ASCII digits and `+` is dropped, a leading `+33` or `33`
/// becomes `0`, and a 9-digit remainder without a leading `0` gets one
/// prepended. Anything that does not end up as ten digits starting with `0`
/// is rejected.
pub fn normalize_fr_phone(raw: &str) -> Option<String> {
    let stripped: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '+')
        .collect();

    let mut out = if let Some(rest) = stripped.strip_prefix("+33") {
        format!("0{rest}")
    } else if let Some(rest) = stripped.strip_prefix("33") {
        format!("0{rest}")
    } else {
        stripped
    };

    if out.len() == PHONE_KEY_LEN - 1 && !out.starts_with('0') {
        out.insert(0, '0');
    }

    if is_canonical(&out) {
        Some(out)
    } else {
        None
    }
}

fn is_canonical(value: &str) -> bool {
    value.len() == PHONE_KEY_LEN
        && value.starts_with('0')
        && value.bytes().all(|b| b.is_ascii_digit())
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneKey(String);

impl PhoneKey {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        normalize_fr_phone(raw)
            .map(Self)
            .ok_or_else(|| CoreError::InvalidPhone(raw.trim().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PhoneKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for PhoneKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PhoneKey> for String {
    fn from(key: PhoneKey) -> Self {
        key.0
    }
}

impl AsRef<str> for PhoneKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
