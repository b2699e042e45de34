use fiches_core::domain::{FicheFields, PhoneKey};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryField {
    Iban,
    Email,
}

impl fmt::Display for SecondaryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecondaryField::Iban => f.write_str("IBAN"),
            SecondaryField::Email => f.write_str("email"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub field: SecondaryField,
    pub value: String,
    pub owner: PhoneKey,
}

/// IBAN and email values mapped to the keys whose bodies carry them.
#[derive(Debug, Clone, Default)]
pub struct SecondaryIndex {
    ibans: BTreeMap<String, BTreeSet<PhoneKey>>,
    emails: BTreeMap<String, BTreeSet<PhoneKey>>,
}

impl SecondaryIndex {
    pub fn build<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = (&'a PhoneKey, &'a String)>,
    {
        let mut index = Self::default();
        for (key, body) in records {
            index.claim(key, &FicheFields::from_body(body));
        }
        index
    }

    /// First owner, other than `key`, of the candidate's IBAN or email.
    pub fn conflict(&self, key: &PhoneKey, fields: &FicheFields) -> Option<Conflict> {
        let lookups = [
            (SecondaryField::Iban, &self.ibans, fields.iban.as_ref()),
            (SecondaryField::Email, &self.emails, fields.email.as_ref()),
        ];
        lookups.into_iter().find_map(|(field, map, value)| {
            let value = value?;
            let owner = map.get(value)?.iter().find(|owner| *owner != key)?;
            Some(Conflict {
                field,
                value: value.clone(),
                owner: owner.clone(),
            })
        })
    }

    pub fn claim(&mut self, key: &PhoneKey, fields: &FicheFields) {
        if let Some(iban) = &fields.iban {
            self.ibans
                .entry(iban.clone())
                .or_default()
                .insert(key.clone());
        }
        if let Some(email) = &fields.email {
            self.emails
                .entry(email.clone())
                .or_default()
                .insert(key.clone());
        }
    }

    pub fn release(&mut self, key: &PhoneKey, fields: &FicheFields) {
        if let Some(iban) = &fields.iban {
            release_value(&mut self.ibans, iban, key);
        }
        if let Some(email) = &fields.email {
            release_value(&mut self.emails, email, key);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ibans.is_empty() && self.emails.is_empty()
    }
}

fn release_value(map: &mut BTreeMap<String, BTreeSet<PhoneKey>>, value: &str, key: &PhoneKey) {
    if let Some(owners) = map.get_mut(value) {
        owners.remove(key);
        if owners.is_empty() {
            map.remove(value);
        }
    }
}
