//! Turning corpus records into indexable documents.

use crate::corpus::{non_empty, CorpusRecord};
use crate::types::Metadata;
use std::collections::HashMap;

/// Metadata fields copied from a record, with the value used when the
/// record leaves them empty.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataPolicy {
    defaults: Vec<(String, String)>,
}

impl Default for MetadataPolicy {
    fn default() -> Self {
        Self {
            defaults: vec![
                ("subject".to_string(), "General".to_string()),
                ("topic".to_string(), "General".to_string()),
                ("solution".to_string(), String::new()),
            ],
        }
    }
}

impl MetadataPolicy {
    /// Override or add the default for a field.
    pub fn with_default(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let field = field.into();
        let value = value.into();
        match self.defaults.iter_mut().find(|(f, _)| *f == field) {
            Some(entry) => entry.1 = value,
            None => self.defaults.push((field, value)),
        }
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.defaults.iter().map(|(f, _)| f.as_str())
    }

    /// Build the metadata map for a record.
    pub fn apply(&self, record: &CorpusRecord) -> Metadata {
        self.defaults
            .iter()
            .map(|(field, default)| {
                let value = record_field(record, field)
                    .map(str::to_string)
                    .unwrap_or_else(|| default.clone());
                (field.clone(), value)
            })
            .collect()
    }
}

fn record_field<'a>(record: &'a CorpusRecord, field: &str) -> Option<&'a str> {
    match field {
        "subject" => non_empty(&record.subject),
        "topic" => non_empty(&record.topic),
        "solution" => non_empty(&record.solution),
        "prompt" => non_empty(&record.prompt),
        "lecture" => non_empty(&record.lecture),
        "image" => non_empty(&record.image),
        _ => None,
    }
}

/// The only text that is embedded and returned on retrieval.
pub fn document_text(prompt: &str, lecture: &str) -> String {
    format!("Question: {} Context: {}", prompt, lecture)
}

/// A document ready for embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentDraft {
    pub id: String,
    pub text: String,
    pub metadata: Metadata,
}

/// Result of preparing a corpus for ingestion.
#[derive(Debug, Clone, Default)]
pub struct PreparedCorpus {
    /// Drafts in original record order, one per id
    pub drafts: Vec<DocumentDraft>,

    /// Records dropped for a missing prompt or lecture
    pub dropped: u32,
}

/// Filter records and build one draft per eligible id.
///
/// A repeated id keeps its first position and takes the later record's
/// content, mirroring upsert-by-id.
pub fn prepare_documents(records: &[CorpusRecord], policy: &MetadataPolicy) -> PreparedCorpus {
    let mut prepared = PreparedCorpus::default();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        if !record.is_indexable() {
            tracing::debug!("Dropping record '{}': missing prompt or lecture", record.id);
            prepared.dropped += 1;
            continue;
        }

        let draft = DocumentDraft {
            id: record.id.clone(),
            text: document_text(
                record.prompt.as_deref().unwrap_or_default(),
                record.lecture.as_deref().unwrap_or_default(),
            ),
            metadata: policy.apply(record),
        };

        match positions.get(&record.id) {
            Some(&pos) => {
                tracing::debug!("Duplicate record id '{}', later record wins", record.id);
                prepared.drafts[pos] = draft;
            }
            None => {
                positions.insert(record.id.clone(), prepared.drafts.len());
                prepared.drafts.push(draft);
            }
        }
    }

    prepared
}
