//! Per-topic feedback from graded quiz answers.

use serde::{Deserialize, Serialize};

pub const NO_DATA: &str = "No data to analyze.";

const DEFAULT_TOPIC: &str = "General";

/// One graded answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResultItem {
    #[serde(default)]
    pub question_id: String,

    #[serde(default)]
    pub topic: Option<String>,

    pub is_correct: bool,
}

impl ResultItem {
    pub fn new(question_id: impl Into<String>, topic: impl Into<String>, is_correct: bool) -> Self {
        Self {
            question_id: question_id.into(),
            topic: Some(topic.into()),
            is_correct,
        }
    }
}

/// One sentence per topic, topics in first-seen order, joined by a space.
pub fn analyze_performance(results: &[ResultItem]) -> String {
    if results.is_empty() {
        return NO_DATA.to_string();
    }

    // (topic, correct, total)
    let mut scores: Vec<(&str, u32, u32)> = Vec::new();
    for result in results {
        let topic = result
            .topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TOPIC);

        let entry = match scores.iter().position(|(t, _, _)| *t == topic) {
            Some(pos) => &mut scores[pos],
            None => {
                scores.push((topic, 0, 0));
                let last = scores.len() - 1;
                &mut scores[last]
            }
        };
        entry.1 += u32::from(result.is_correct);
        entry.2 += 1;
    }

    scores
        .iter()
        .map(|(topic, correct, total)| {
            if *correct == *total {
                format!("Perfect score in {}! Moving to advanced mode.", topic)
            } else if (*correct as f64) / (*total as f64) < 0.5 {
                format!("Weakness detected in {}. Review the lecture notes.", topic)
            } else {
                format!("Good progress in {}. Keep practicing.", topic)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_results() {
        assert_eq!(analyze_performance(&[]), "No data to analyze.");
    }

    #[test]
    fn test_feedback_per_topic_in_first_seen_order() {
        let results = vec![
            ResultItem::new("1", "Biology", true),
            ResultItem::new("2", "Biology", false),
            ResultItem::new("3", "Physics", false),
            ResultItem::new("4", "Chemistry", true),
        ];

        assert_eq!(
            analyze_performance(&results),
            "Good progress in Biology. Keep practicing. \
             Weakness detected in Physics. Review the lecture notes. \
             Perfect score in Chemistry! Moving to advanced mode."
        );
    }

    #[test]
    fn test_below_half_is_weakness() {
        let results = vec![
            ResultItem::new("1", "Physics", true),
            ResultItem::new("2", "Physics", false),
            ResultItem::new("3", "Physics", false),
        ];
        assert_eq!(
            analyze_performance(&results),
            "Weakness detected in Physics. Review the lecture notes."
        );
    }

    #[test]
    fn test_missing_topic_is_general() {
        let results: Vec<ResultItem> =
            serde_json::from_str(r#"[{"question_id": "9", "is_correct": true}]"#).unwrap();
        assert_eq!(
            analyze_performance(&results),
            "Perfect score in General! Moving to advanced mode."
        );
    }
}
