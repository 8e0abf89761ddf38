use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{SourcingError, ValidationError};
use crate::generator::{StructuredGenerator, StructuredRequest};
use crate::sanitize::strip_numbering_prefix;
use crate::schema::{Field, SchemaNode};

const SYSTEM_MSG: &str = "You are a meticulous web research assistant that returns ONLY verbatim practice problems \
and their official solutions from credible, preferably open-licensed sources. \
You must search the live web. Never paraphrase or invent content. Always cite the exact URL.";

pub const OPENLY_LICENSED_HINT: &str = "Prefer openly licensed or university sources where verbatim copying is permitted:
- ocw.mit.edu, web.mit.edu (MIT OCW)
- openstax.org
- physics.mit.edu, physics.ucsb.edu, physics.berkeley.edu
- stanford.edu, harvard.edu, berkeley.edu, cmu.edu, utexas.edu, ucsd.edu, illinois.edu
- arizona.edu, colorado.edu, umich.edu, cornell.edu
- Any *.edu domain with problem sets or PDF solutions
Avoid: paywalled sites, copyrighted textbooks without open licenses, commercial worksheets.";

const REQUIRED_FIELDS: [&str; 5] = ["question", "solution", "source_title", "source_url", "license"];

const PARAPHRASE_MARKER: &str = "paraphrase";

static RE_SOURCE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9+.-]*://\S+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeProblem {
    pub question: String,
    pub solution: String,
    pub source_title: String,
    pub source_url: String,
    pub license: String,
}

#[derive(Debug, Clone)]
pub struct ProblemRequest {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub grade_level: String,
    pub count: usize,
    pub max_tokens: u32,
    pub temperature: f32,
}

pub fn problems_schema(count: usize) -> SchemaNode {
    SchemaNode::exact_array_of(
        SchemaNode::Object(
            REQUIRED_FIELDS
                .into_iter()
                .map(|name| Field::required(name, SchemaNode::String))
                .collect(),
        ),
        count,
    )
}

fn build_user_message(request: &ProblemRequest, schema: &SchemaNode, today: NaiveDate) -> String {
    let count = request.count;
    let subtopics_txt = if request.subtopics.is_empty() {
        "—".to_owned()
    } else {
        request.subtopics.join(", ")
    };

    let goal = format!(
        "Goal:\n\
Find exactly {count} (no more, no less) high-quality practice problems for:\n\
- Topic: {topic}\n\
- Subtopics: {subtopics_txt}\n\
- Grade level: {grade_level}\n\
- Date context: {today}\n\
\n\
Requirements (critical):\n\
1) Search the web and pick problems from credible sources, ideally open-license.\n\
{OPENLY_LICENSED_HINT}\n\
2) Return the problem question and the official solution verbatim (copy text exactly; do NOT paraphrase or summarize).\n\
3) Include the source_title, source_url, and license/rights note if present on the page (e.g., 'CC BY-NC-SA').\n\
4) If a single page has multiple suitable problems, you may select more than one from that page.\n\
5) Exclude duplicates and trivial problems.\n\
6) If insufficient items are found on preferred domains, broaden to other .edu domains or archived PDFs until you reach exactly {count}.\n\
7) Output ONLY valid JSON matching this schema (no prose, no markdown): {schema}\n\
\n\
Important format rules:\n\
- Preserve original line breaks and math formatting.\n\
- Do NOT include any commentary, headings, numbering, or extra keys.\n\
- The array MUST contain exactly {count} items.",
        topic = request.topic,
        grade_level = request.grade_level,
        schema = schema.to_json_schema(),
    );

    let search_hint = format!(
        "Search hints (you may vary as needed): \
site:ocw.mit.edu OR site:web.mit.edu OR site:openstax.org OR site:*.edu filetype:pdf \
\"{topic}\" {subtopics} practice problems solutions",
        topic = request.topic,
        subtopics = request.subtopics.join(" "),
    );

    format!("{goal}\n\n{search_hint}")
}

/// Fetch exactly `request.count` cited problems. Any defect rejects the batch.
pub async fn source(
    generator: &dyn StructuredGenerator,
    request: &ProblemRequest,
) -> Result<Vec<PracticeProblem>, SourcingError> {
    if request.count == 0 {
        return Err(ValidationError::batch("requested problem count must be at least 1").into());
    }

    let schema = problems_schema(request.count);
    let structured = StructuredRequest {
        system_instruction: SYSTEM_MSG.to_owned(),
        user_message: build_user_message(request, &schema, Utc::now().date_naive()),
        schema,
        max_tokens: request.max_tokens,
        temperature: request.temperature,
        live_search: true,
    };

    let value = generator.generate(&structured).await?;
    let problems = validate_items(value, request.count)?;
    tracing::info!(
        topic = %request.topic,
        count = problems.len(),
        "practice problems sourced"
    );
    Ok(problems)
}

/// Hard gate over a generated batch.
pub fn validate_items(value: Value, count: usize) -> Result<Vec<PracticeProblem>, ValidationError> {
    let Value::Array(items) = value else {
        return Err(ValidationError::batch(format!(
            "expected exactly {count} items, got a non-array value"
        )));
    };
    if items.len() != count {
        return Err(ValidationError::batch(format!(
            "expected exactly {count} items, got {}",
            items.len()
        )));
    }

    let mut problems = Vec::with_capacity(count);
    for (idx, item) in items.into_iter().enumerate() {
        let index = idx + 1;
        let Value::Object(fields) = &item else {
            return Err(ValidationError::item(index, "not an object"));
        };
        for name in REQUIRED_FIELDS {
            let ok = fields
                .get(name)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !ok {
                return Err(ValidationError::item(
                    index,
                    format!("missing or empty field: {name}"),
                ));
            }
        }

        let problem: PracticeProblem = serde_json::from_value(item)
            .map_err(|err| ValidationError::item(index, err.to_string()))?;
        if !RE_SOURCE_URL.is_match(problem.source_url.trim()) {
            return Err(ValidationError::item(
                index,
                format!("invalid source_url: {}", problem.source_url),
            ));
        }
        if looks_paraphrased(&problem.question) || looks_paraphrased(&problem.solution) {
            return Err(ValidationError::item(index, "looks paraphrased"));
        }
        problems.push(problem);
    }
    Ok(problems)
}

fn looks_paraphrased(text: &str) -> bool {
    text.to_lowercase().contains(PARAPHRASE_MARKER)
}

pub fn questions_markup(problems: &[PracticeProblem]) -> String {
    numbered_markup("# Practice Problems", problems, |p| p.question.as_str())
}

pub fn solutions_markup(problems: &[PracticeProblem]) -> String {
    numbered_markup("# Solutions", problems, |p| p.solution.as_str())
}

pub fn sources_markup(problems: &[PracticeProblem]) -> String {
    let mut out = String::from("# Sources\n\n");
    for p in problems {
        out.push_str(&format!(
            "- {} — {} | {}\n",
            p.source_title.trim(),
            p.source_url.trim(),
            p.license.trim()
        ));
    }
    out
}

fn numbered_markup(
    heading: &str,
    problems: &[PracticeProblem],
    text: impl Fn(&PracticeProblem) -> &str,
) -> String {
    let mut blocks = vec![heading.to_owned()];
    for (idx, problem) in problems.iter().enumerate() {
        let body = strip_numbering_prefix(text(problem).trim());
        blocks.push(format!("## Problem {}\n\n{}", idx + 1, body.trim_end()));
    }
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}
