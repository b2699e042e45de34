use crate::fiches::Fiches;
use crate::index::SecondaryIndex;
use fiches_core::domain::{Fiche, FicheFields};
use fiches_import::{InputFormat, ParsedBatch};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SecondaryUniqueness {
    #[default]
    Off,
    /// Reject a candidate whose IBAN or email already belongs to another key.
    Enforce,
}

impl SecondaryUniqueness {
    pub fn from_flag(enforce: bool) -> Self {
        if enforce {
            SecondaryUniqueness::Enforce
        } else {
            SecondaryUniqueness::Off
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub added: usize,
    pub updated: usize,
    pub duplicate: usize,
    pub unchanged: usize,
    pub warnings: Vec<String>,
}

impl MergeReport {
    pub fn is_mutated(&self) -> bool {
        self.added + self.updated > 0
    }
}

/// Outcome of one imported text blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub format: InputFormat,
    pub added: usize,
    pub updated: usize,
    pub duplicate: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub total: usize,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn new(
        format: InputFormat,
        skipped: usize,
        parse_warnings: Vec<String>,
        merge: MergeReport,
    ) -> Self {
        let total = merge.added + merge.updated + merge.duplicate + merge.unchanged + skipped;
        let mut warnings = parse_warnings;
        warnings.extend(merge.warnings);
        Self {
            format,
            added: merge.added,
            updated: merge.updated,
            duplicate: merge.duplicate,
            unchanged: merge.unchanged,
            skipped,
            total,
            warnings,
        }
    }

    pub fn is_mutated(&self) -> bool {
        self.added + self.updated > 0
    }

    /// Nothing usable came out of the text.
    pub fn is_empty(&self) -> bool {
        self.total == self.skipped
    }
}

impl Fiches {
    /// Applies candidates in order. Identical bodies are left alone; with
    /// `Enforce`, a candidate carrying another key's IBAN or email is rejected.
    pub fn merge<I>(&mut self, candidates: I, policy: SecondaryUniqueness) -> MergeReport
    where
        I: IntoIterator<Item = Fiche>,
    {
        let mut report = MergeReport::default();
        if policy == SecondaryUniqueness::Enforce && self.index.is_none() {
            self.index = Some(SecondaryIndex::build(&self.records));
        }

        for Fiche { key, body } in candidates {
            if self.records.get(&key) == Some(&body) {
                report.unchanged += 1;
                continue;
            }

            let fields = self.index.as_ref().map(|_| FicheFields::from_body(&body));
            if policy == SecondaryUniqueness::Enforce {
                let conflict = self
                    .index
                    .as_ref()
                    .zip(fields.as_ref())
                    .and_then(|(index, fields)| index.conflict(&key, fields));
                if let Some(conflict) = conflict {
                    report.warnings.push(format!(
                        "{key}: {} {} already belongs to {}",
                        conflict.field, conflict.value, conflict.owner
                    ));
                    report.duplicate += 1;
                    continue;
                }
            }

            let previous = self.records.insert(key.clone(), body);
            if let (Some(index), Some(fields)) = (self.index.as_mut(), fields.as_ref()) {
                if let Some(previous) = &previous {
                    index.release(&key, &FicheFields::from_body(previous));
                }
                index.claim(&key, fields);
            }
            match previous {
                Some(_) => report.updated += 1,
                None => report.added += 1,
            }
        }

        debug!(
            added = report.added,
            updated = report.updated,
            duplicate = report.duplicate,
            "merged candidates"
        );
        report
    }

    /// Merges a parsed batch and folds its parse counts into the report.
    pub fn merge_batch(&mut self, batch: ParsedBatch, policy: SecondaryUniqueness) -> ImportReport {
        let merged = self.merge(batch.candidates, policy);
        ImportReport::new(batch.format, batch.skipped, batch.warnings, merged)
    }
}
