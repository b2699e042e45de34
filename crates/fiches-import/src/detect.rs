use crate::batch::{normalize_newlines, ImportOptions, Unit};
use crate::{delimited, free_text, labeled};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

pub(crate) static RE_EXPORT_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*=====[ \t]*([+\d][\d .-]*?)[ \t]*=====[ \t]*$")
        .expect("export delimiter pattern")
});

pub(crate) static RE_FICHE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*Fiche[ \t]+\d+[ \t]*$").expect("fiche header pattern"));

static RE_LABEL_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*[^:\n]+:[ \t]*\S").expect("label line pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderKind {
    /// `===== 0612345678 =====`, as written by the exporter.
    ExportDelimiter,
    /// `Fiche 12`
    FicheHeader,
}

impl HeaderKind {
    pub(crate) fn pattern(self) -> &'static Regex {
        match self {
            HeaderKind::ExportDelimiter => &RE_EXPORT_DELIMITER,
            HeaderKind::FicheHeader => &RE_FICHE_HEADER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "header")]
pub enum InputFormat {
    DelimitedRow,
    LabeledBlock(HeaderKind),
    FreeText,
}

impl InputFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            InputFormat::DelimitedRow => "delimited-row",
            InputFormat::LabeledBlock(HeaderKind::ExportDelimiter) => "labeled-block/export",
            InputFormat::LabeledBlock(HeaderKind::FicheHeader) => "labeled-block/fiche",
            InputFormat::FreeText => "free-text",
        }
    }
}

type Detector = fn(&str, &ImportOptions) -> Option<InputFormat>;
pub(crate) type Builder = fn(&str, InputFormat, &ImportOptions) -> Vec<Unit>;

/// Tried in order; the first detector that claims the text picks the builder.
const STRATEGIES: [(Detector, Builder); 3] = [
    (detect_delimited_rows, delimited::build_units),
    (detect_labeled_blocks, labeled::build_units),
    (detect_free_text, free_text::build_units),
];

pub fn detect_format(text: &str, options: &ImportOptions) -> InputFormat {
    select(&normalize_newlines(text), options).0
}

/// Expects text whose line endings are already `\n`.
pub(crate) fn select(text: &str, options: &ImportOptions) -> (InputFormat, Builder) {
    STRATEGIES
        .iter()
        .find_map(|(detect, build)| detect(text, options).map(|format| (format, *build)))
        .unwrap_or((InputFormat::FreeText, free_text::build_units as Builder))
}

fn detect_delimited_rows(text: &str, options: &ImportOptions) -> Option<InputFormat> {
    let min_separators = options.layout.min_separators();
    let separator = options.layout.separator;
    let mut total = 0usize;
    let mut rows = 0usize;
    for line in text.lines().filter(|line| !line.trim().is_empty()) {
        total += 1;
        if line.matches(separator).count() >= min_separators {
            rows += 1;
        }
    }

    // strictly more than 80% of the non-empty lines
    (total > 1 && rows * 5 > total * 4).then_some(InputFormat::DelimitedRow)
}

/// Export bodies are arbitrary stored text, so a delimiter alone claims the input.
/// `Fiche N` headers need at least one block carrying a `Label: value` line.
fn detect_labeled_blocks(text: &str, _options: &ImportOptions) -> Option<InputFormat> {
    if RE_EXPORT_DELIMITER.is_match(text) {
        return Some(InputFormat::LabeledBlock(HeaderKind::ExportDelimiter));
    }
    has_labeled_fiche_block(text).then_some(InputFormat::LabeledBlock(HeaderKind::FicheHeader))
}

fn has_labeled_fiche_block(text: &str) -> bool {
    let headers: Vec<_> = RE_FICHE_HEADER.find_iter(text).collect();
    headers.iter().enumerate().any(|(i, header)| {
        let end = headers.get(i + 1).map_or(text.len(), |next| next.start());
        RE_LABEL_LINE.is_match(&text[header.end()..end])
    })
}

fn detect_free_text(_text: &str, _options: &ImportOptions) -> Option<InputFormat> {
    Some(InputFormat::FreeText)
}
