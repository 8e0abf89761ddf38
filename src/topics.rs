use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::generator::{StructuredGenerator, StructuredRequest};
use crate::schema::{Field, SchemaNode};

const SYSTEM_MSG: &str = "Extract a student's learning intent into a main topic and subtopics. \
Order the subtopics so prerequisites come first. Respond ONLY in JSON.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicBreakdown {
    pub main_topic: String,
    pub subtopics: Vec<String>,
}

pub fn breakdown_schema() -> SchemaNode {
    SchemaNode::Object(vec![
        Field::required("main_topic", SchemaNode::String),
        Field::required("subtopics", SchemaNode::StringArray),
    ])
}

pub async fn decompose(
    generator: &dyn StructuredGenerator,
    free_text: &str,
    subtopic_hint: Option<usize>,
) -> Result<TopicBreakdown, GenerationError> {
    let mut user_message = format!("Break this down: \"{}\"", free_text.trim());
    if let Some(hint) = subtopic_hint.filter(|n| *n > 0) {
        user_message.push_str(&format!("\nAim for about {hint} subtopics."));
    }

    let request = StructuredRequest {
        system_instruction: SYSTEM_MSG.to_owned(),
        user_message,
        schema: breakdown_schema(),
        max_tokens: 1000,
        temperature: 0.2,
        live_search: false,
    };

    let value = generator.generate(&request).await?;
    let raw: TopicBreakdown =
        serde_json::from_value(value).map_err(|err| GenerationError::MalformedOutput {
            expected: "topic breakdown",
            detail: err.to_string(),
        })?;

    let breakdown = normalize(raw)?;
    tracing::info!(
        main_topic = %breakdown.main_topic,
        subtopics = breakdown.subtopics.len(),
        "topic breakdown"
    );
    Ok(breakdown)
}

/// Trim, drop empties, dedupe case-insensitively keeping the first spelling.
fn normalize(raw: TopicBreakdown) -> Result<TopicBreakdown, GenerationError> {
    let main_topic = raw.main_topic.trim().to_owned();
    if main_topic.is_empty() {
        return Err(GenerationError::MalformedOutput {
            expected: "topic breakdown",
            detail: "main_topic is empty".to_owned(),
        });
    }

    let mut seen = HashSet::new();
    let mut subtopics = raw
        .subtopics
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .map(str::to_owned)
        .collect::<Vec<_>>();

    if subtopics.is_empty() {
        subtopics.push(main_topic.clone());
    }

    Ok(TopicBreakdown {
        main_topic,
        subtopics,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(main: &str, subs: &[&str]) -> TopicBreakdown {
        TopicBreakdown {
            main_topic: main.to_owned(),
            subtopics: subs.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    #[test]
    fn normalize_dedupes_and_keeps_learning_order() -> anyhow::Result<()> {
        let out = normalize(raw(
            " Linear Algebra ",
            &["Vector Spaces", "  ", "Gram-Schmidt", "vector spaces", "Matrix Operations"],
        ))?;
        assert_eq!(out.main_topic, "Linear Algebra");
        assert_eq!(
            out.subtopics,
            vec!["Vector Spaces", "Gram-Schmidt", "Matrix Operations"]
        );
        Ok(())
    }

    #[test]
    fn normalize_falls_back_to_main_topic_when_no_subtopics() -> anyhow::Result<()> {
        let out = normalize(raw("Vectors", &["", " "]))?;
        assert_eq!(out.subtopics, vec!["Vectors"]);
        Ok(())
    }

    #[test]
    fn normalize_rejects_empty_main_topic() {
        let err = normalize(raw("  ", &["a"])).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedOutput { .. }));
    }
}
