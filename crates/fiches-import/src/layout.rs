use crate::error::{ImportError, Result};

pub const DEFAULT_SEPARATOR: char = '|';
pub const DEFAULT_MIN_FIELDS: usize = 10;

/// Field positions of a delimited row. Positions are zero-based and must all
/// fall below `min_fields`, so every qualifying row carries them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowLayout {
    pub separator: char,
    pub min_fields: usize,
    pub phone: usize,
    pub birth_date: Option<usize>,
    pub address: Vec<usize>,
    pub email: Option<usize>,
    pub iban: Option<usize>,
    pub bic: Option<usize>,
    pub name: Option<usize>,
    pub given_name: Option<usize>,
}

impl Default for RowLayout {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            min_fields: DEFAULT_MIN_FIELDS,
            phone: 6,
            birth_date: Some(2),
            address: vec![3, 4, 5],
            email: Some(7),
            iban: Some(8),
            bic: Some(9),
            name: None,
            given_name: None,
        }
    }
}

impl RowLayout {
    pub fn validate(&self) -> Result<()> {
        if self.separator.is_whitespace() || self.separator.is_alphanumeric() {
            return Err(ImportError::InvalidLayout(format!(
                "separator {:?} cannot be whitespace or alphanumeric",
                self.separator
            )));
        }
        if self.min_fields < 2 {
            return Err(ImportError::InvalidLayout(format!(
                "min_fields must be at least 2, got {}",
                self.min_fields
            )));
        }

        let named = [
            ("phone", Some(self.phone)),
            ("birth_date", self.birth_date),
            ("email", self.email),
            ("iban", self.iban),
            ("bic", self.bic),
            ("name", self.name),
            ("given_name", self.given_name),
        ];
        let address = self.address.iter().map(|pos| ("address", Some(*pos)));
        for (field, position) in named.into_iter().chain(address) {
            if let Some(position) = position {
                if position >= self.min_fields {
                    return Err(ImportError::InvalidLayout(format!(
                        "{field} position {position} is outside the {} guaranteed fields",
                        self.min_fields
                    )));
                }
            }
        }
        Ok(())
    }

    /// Separator count a line needs to qualify as a row.
    pub fn min_separators(&self) -> usize {
        self.min_fields - 1
    }

    pub fn pins_names(&self) -> bool {
        self.name.is_some() || self.given_name.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::RowLayout;
    use crate::error::ImportError;

    #[test]
    fn default_layout_is_valid() {
        let layout = RowLayout::default();
        assert!(layout.validate().is_ok());
        assert_eq!(layout.min_separators(), 9);
        assert!(!layout.pins_names());
    }

    #[test]
    fn position_outside_guaranteed_fields_is_rejected() {
        let layout = RowLayout {
            bic: Some(12),
            ..RowLayout::default()
        };
        let err = layout.validate().unwrap_err();
        assert!(matches!(err, ImportError::InvalidLayout(ref msg) if msg.contains("bic")));
    }

    #[test]
    fn whitespace_separator_is_rejected() {
        let layout = RowLayout {
            separator: ' ',
            ..RowLayout::default()
        };
        assert!(layout.validate().is_err());
    }
}
