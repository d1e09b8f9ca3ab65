//! Corpus records: the cleaned exam questions the index is built from.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tutor_core::{AppError, AppResult};

/// Option columns folded into `choices` when present on a raw row.
const OPTION_LABELS: [&str; 5] = ["A", "B", "C", "D", "E"];

/// One exam item from the cleaned corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorpusRecord {
    /// Stable identifier; integer ids are normalized to strings
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Question text
    #[serde(default)]
    pub prompt: Option<String>,

    /// Supporting lecture notes
    #[serde(default)]
    pub lecture: Option<String>,

    #[serde(default)]
    pub solution: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,

    #[serde(default)]
    pub topic: Option<String>,

    /// Option label -> option text, only non-empty options
    #[serde(default, deserialize_with = "deserialize_choices")]
    pub choices: BTreeMap<String, String>,

    /// Correct answer as stored by the cleaning step (label or index)
    #[serde(default)]
    pub answer: Option<serde_json::Value>,

    /// Optional image reference
    #[serde(default)]
    pub image: Option<String>,

    #[serde(rename = "A", default, skip_serializing)]
    option_a: Option<serde_json::Value>,
    #[serde(rename = "B", default, skip_serializing)]
    option_b: Option<serde_json::Value>,
    #[serde(rename = "C", default, skip_serializing)]
    option_c: Option<serde_json::Value>,
    #[serde(rename = "D", default, skip_serializing)]
    option_d: Option<serde_json::Value>,
    #[serde(rename = "E", default, skip_serializing)]
    option_e: Option<serde_json::Value>,
}

impl CorpusRecord {
    /// Create a record with only an id, prompt and lecture.
    pub fn new(id: impl Into<String>, prompt: impl Into<String>, lecture: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prompt: Some(prompt.into()),
            lecture: Some(lecture.into()),
            solution: None,
            subject: None,
            topic: None,
            choices: BTreeMap::new(),
            answer: None,
            image: None,
            option_a: None,
            option_b: None,
            option_c: None,
            option_d: None,
            option_e: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.solution = Some(solution.into());
        self
    }

    /// A record is indexable only when both prompt and lecture carry text.
    pub fn is_indexable(&self) -> bool {
        non_empty(&self.prompt).is_some() && non_empty(&self.lecture).is_some()
    }

    /// Fold raw `A`..`E` option columns into `choices`.
    fn fold_option_columns(&mut self) {
        let columns = [
            self.option_a.take(),
            self.option_b.take(),
            self.option_c.take(),
            self.option_d.take(),
            self.option_e.take(),
        ];

        for (label, value) in OPTION_LABELS.iter().zip(columns) {
            if let Some(text) = value.as_ref().and_then(value_to_text) {
                self.choices.entry(label.to_string()).or_insert(text);
            }
        }
    }
}

/// Return the trimmed-non-empty contents of an optional field.
pub(crate) fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.trim().is_empty())
}

/// Parse a corpus from a JSON array of records.
pub fn parse_corpus(json: &str) -> AppResult<Vec<CorpusRecord>> {
    let mut records: Vec<CorpusRecord> = serde_json::from_str(json)
        .map_err(|e| AppError::Corpus(format!("Invalid corpus structure: {}", e)))?;

    for record in &mut records {
        record.fold_option_columns();
    }

    Ok(records)
}

/// Load the cleaned corpus file.
pub fn load_corpus(path: &Path) -> AppResult<Vec<CorpusRecord>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::Corpus(format!("Failed to read corpus {:?}: {}", path, e)))?;

    let records = parse_corpus(&content)?;
    tracing::info!("Loaded {} corpus records from {:?}", records.len(), path);
    Ok(records)
}

fn value_to_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if !s.trim().is_empty() => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!(
            "record id must be a non-empty string or an integer, got {}",
            other
        ))),
    }
}

fn deserialize_choices<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, serde_json::Value>> = Option::deserialize(deserializer)?;

    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(label, value)| value_to_text(&value).map(|text| (label, text)))
        .collect())
}
