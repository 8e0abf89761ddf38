use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::generator::{StructuredGenerator, StructuredRequest};
use crate::schema::{Field, SchemaNode};

const SYSTEM_MSG: &str = "You are a master educator. Write like a concise textbook: clean, precise, structured. \
Short paragraphs (plain text), minimal jargon, clear notation. \
No citations, links, or markdown. Return ONLY valid JSON.";

const FALLBACK_READ_MINUTES: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonPacket {
    pub title: String,
    pub learning_path: Vec<String>,
    pub sections: Vec<Section>,
    pub summary: String,
    #[serde(rename = "estimated_total_read_time_minutes")]
    pub estimated_read_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub overview: String,
    pub key_points: Vec<String>,
    pub formulas: Vec<String>,
    #[serde(
        rename = "derivations",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub derivation: Option<String>,
    pub diagram: Diagram,
    pub worked_example: WorkedExample,
    pub common_pitfalls: Vec<String>,
    pub mini_quiz: Vec<QuizItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagram {
    pub caption: String,
    pub instructions: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkedExample {
    pub prompt: String,
    pub steps: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    #[serde(rename = "q")]
    pub question: String,
    #[serde(rename = "a")]
    pub answer: String,
}

#[derive(Debug, Clone)]
pub struct LessonRequest {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub grade_level: String,
    pub max_sections: usize,
    pub quiz_per_section: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

pub fn lesson_schema() -> SchemaNode {
    let section = SchemaNode::Object(vec![
        Field::required("title", SchemaNode::String),
        Field::required("overview", SchemaNode::String),
        Field::required("key_points", SchemaNode::StringArray),
        Field::required("formulas", SchemaNode::StringArray),
        Field::optional("derivations", SchemaNode::String),
        Field::required(
            "diagram",
            SchemaNode::Object(vec![
                Field::required("caption", SchemaNode::String),
                Field::required("instructions", SchemaNode::String),
            ]),
        ),
        Field::required(
            "worked_example",
            SchemaNode::Object(vec![
                Field::required("prompt", SchemaNode::String),
                Field::required("steps", SchemaNode::StringArray),
                Field::required("answer", SchemaNode::String),
            ]),
        ),
        Field::required("common_pitfalls", SchemaNode::StringArray),
        Field::required(
            "mini_quiz",
            SchemaNode::array_of(SchemaNode::Object(vec![
                Field::required("q", SchemaNode::String),
                Field::required("a", SchemaNode::String),
            ])),
        ),
    ]);

    SchemaNode::Object(vec![
        Field::required("title", SchemaNode::String),
        Field::required("learning_path", SchemaNode::StringArray),
        Field::required("sections", SchemaNode::array_of(section)),
        Field::required("summary", SchemaNode::String),
        Field::required(
            "estimated_total_read_time_minutes",
            SchemaNode::Integer { minimum: Some(0) },
        ),
    ])
}

fn build_user_message(request: &LessonRequest, schema: &SchemaNode) -> String {
    let subtopics_txt = if request.subtopics.is_empty() {
        "—".to_owned()
    } else {
        request.subtopics.join(", ")
    };

    format!(
        "Create a condensed, concise textbook-style packet for a {grade_level} student.\n\
\n\
Primary topic: \"{topic}\"\n\
Focus subtopics (include and integrate): {subtopics_txt}\n\
\n\
Constraints and style:\n\
- Clarity and density. Short paragraphs (plain text), precise definitions, minimal fluff.\n\
- Logical learning order (prerequisites first).\n\
- Each section: 120–220 word overview, 3–6 key points, essential formulas (LaTeX ok),\n  \
1 worked example with steps, 1 small diagram described by text (caption + drawing instructions),\n  \
2–4 common pitfalls, and {quiz} mini-quiz Q/A.\n\
- Keep derivations brief (5–10 lines) only when essential.\n\
- DO NOT include citations, URLs, references, or markdown.\n\
- Keep total number of sections ≤ {max_sections} by merging closely related subtopics.\n\
\n\
Output:\n\
Return ONLY valid JSON matching this schema (no prose outside JSON):\n\
{schema}",
        grade_level = request.grade_level,
        topic = request.topic,
        quiz = request.quiz_per_section,
        max_sections = request.max_sections,
        schema = schema.to_json_schema(),
    )
}

/// Generate a lesson packet. Never fails: any generation or decode error
/// yields [`LessonPacket::degraded`].
pub async fn synthesize(
    generator: &dyn StructuredGenerator,
    request: &LessonRequest,
) -> LessonPacket {
    match try_synthesize(generator, request).await {
        Ok(packet) => packet,
        Err(err) => {
            tracing::warn!(
                topic = %request.topic,
                error = %err,
                "lesson generation failed; using degraded packet"
            );
            LessonPacket::degraded(&request.topic, &request.subtopics)
        }
    }
}

async fn try_synthesize(
    generator: &dyn StructuredGenerator,
    request: &LessonRequest,
) -> Result<LessonPacket, GenerationError> {
    let schema = lesson_schema();
    let structured = StructuredRequest {
        system_instruction: SYSTEM_MSG.to_owned(),
        user_message: build_user_message(request, &schema),
        schema,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        live_search: false,
    };

    let value = generator.generate(&structured).await?;
    let mut packet: LessonPacket =
        serde_json::from_value(value).map_err(|err| GenerationError::MalformedOutput {
            expected: "lesson packet",
            detail: err.to_string(),
        })?;

    if packet.sections.is_empty() {
        return Err(GenerationError::MalformedOutput {
            expected: "lesson packet",
            detail: "no sections".to_owned(),
        });
    }
    if packet.sections.len() > request.max_sections {
        tracing::warn!(
            sections = packet.sections.len(),
            max_sections = request.max_sections,
            "lesson packet over section cap; dropping trailing sections"
        );
        packet.sections.truncate(request.max_sections.max(1));
    }

    tracing::info!(
        topic = %request.topic,
        sections = packet.sections.len(),
        minutes = packet.estimated_read_minutes,
        "lesson packet generated"
    );
    Ok(packet)
}

impl LessonPacket {
    pub fn degraded(topic: &str, subtopics: &[String]) -> Self {
        let learning_path = if subtopics.is_empty() {
            vec![topic.to_owned()]
        } else {
            subtopics.to_vec()
        };
        Self {
            title: format!("{topic} — Learning Packet"),
            learning_path,
            sections: vec![Section {
                title: "Overview".to_owned(),
                overview: "Lesson content is unavailable because generation failed.".to_owned(),
                key_points: Vec::new(),
                formulas: Vec::new(),
                derivation: None,
                diagram: Diagram {
                    caption: "—".to_owned(),
                    instructions: "—".to_owned(),
                },
                worked_example: WorkedExample {
                    prompt: "—".to_owned(),
                    steps: Vec::new(),
                    answer: "—".to_owned(),
                },
                common_pitfalls: Vec::new(),
                mini_quiz: Vec::new(),
            }],
            summary: "The lesson could not be generated, so this packet carries a placeholder \
section; the practice problems and sources are complete."
                .to_owned(),
            estimated_read_minutes: FALLBACK_READ_MINUTES,
        }
    }

    pub fn to_markdown(&self) -> String {
        let mut md = vec![format!("# {}\n", self.title)];
        md.push(format!(
            "**Estimated reading time:** {} minutes\n",
            self.estimated_read_minutes
        ));
        if !self.learning_path.is_empty() {
            md.push(format!(
                "**Learning order:** {}\n",
                self.learning_path.join(" → ")
            ));
        }

        for section in &self.sections {
            section.push_markdown(&mut md);
            md.push("\n".to_owned());
        }

        if !self.summary.trim().is_empty() {
            md.push(format!("## Summary\n\n{}", self.summary));
        }
        md.join("\n")
    }
}

impl Section {
    fn push_markdown(&self, md: &mut Vec<String>) {
        md.push(format!("## {}\n", self.title));
        if !self.overview.trim().is_empty() {
            md.push(format!("{}\n", self.overview));
        }
        push_list(md, "**Key points:**", &self.key_points);

        if !self.formulas.is_empty() {
            md.push("**Formulas:**\n".to_owned());
            for formula in &self.formulas {
                md.push(format!("- {}", as_math(formula)));
            }
            md.push(String::new());
        }

        if let Some(derivation) = self.derivation.as_deref()
            && !derivation.trim().is_empty()
        {
            md.push("**Sketch derivation:**\n".to_owned());
            md.push(format!("{derivation}\n"));
        }

        let example = &self.worked_example;
        md.push("**Worked Example:**\n".to_owned());
        if !is_placeholder(&example.prompt) {
            md.push(format!("*{}*\n", example.prompt.trim()));
        }
        for (idx, step) in example.steps.iter().enumerate() {
            md.push(format!("{}. {}", idx + 1, step));
        }
        if !example.steps.is_empty() {
            md.push(String::new());
        }
        if !is_placeholder(&example.answer) {
            md.push(format!("**Answer:** {}\n", example.answer));
        }

        if !is_placeholder(&self.diagram.caption) {
            md.push(format!("**Diagram:** {}\n", self.diagram.caption));
        }
        if !is_placeholder(&self.diagram.instructions) {
            md.push(format!("Instructions: {}\n", self.diagram.instructions));
        }

        push_list(md, "**Common Pitfalls:**", &self.common_pitfalls);

        if !self.mini_quiz.is_empty() {
            md.push("**Quick Quiz:**\n".to_owned());
            for item in &self.mini_quiz {
                md.push(format!("- {}  \n  **Ans:** {}", item.question, item.answer));
            }
            md.push(String::new());
        }
    }
}

fn push_list(md: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    md.push(format!("{heading}\n"));
    for item in items {
        md.push(format!("- {item}"));
    }
    md.push(String::new());
}

fn as_math(formula: &str) -> String {
    let formula = formula.trim();
    if formula.contains('$') {
        formula.to_owned()
    } else {
        format!("${formula}$")
    }
}

// The degraded packet uses an em dash for fields it cannot fill.
fn is_placeholder(text: &str) -> bool {
    let text = text.trim();
    text.is_empty() || text == "—"
}
