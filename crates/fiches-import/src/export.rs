use fiches_core::domain::PhoneKey;

/// Renders records as `===== <key> =====` framed blocks, in the order given.
/// The output is itself an import-recognized labeled-block document.
pub fn export_text<'a, I>(records: I) -> String
where
    I: IntoIterator<Item = (&'a PhoneKey, &'a str)>,
{
    records
        .into_iter()
        .map(|(key, body)| format!("===== {key} =====\n{body}\n"))
        .collect::<Vec<_>>()
        .join("\n")
}
