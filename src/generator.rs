use async_trait::async_trait;
use serde_json::Value;

use crate::config::GeneratorConfig;
use crate::error::GenerationError;
use crate::schema::{SchemaNode, Shape};

const BODY_EXCERPT_CHARS: usize = 800;

/// One schema-constrained request.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub system_instruction: String,
    pub user_message: String,
    pub schema: SchemaNode,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Let the service browse the live web while answering.
    pub live_search: bool,
}

#[async_trait]
pub trait StructuredGenerator: Send + Sync {
    async fn generate(&self, request: &StructuredRequest) -> Result<Value, GenerationError>;
}

/// Chat-completions client (Perplexity wire format).
#[derive(Debug, Clone)]
pub struct ChatCompletionsGenerator {
    client: reqwest::Client,
    endpoint: String,
    config: GeneratorConfig,
}

impl ChatCompletionsGenerator {
    pub fn new(config: GeneratorConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| anyhow::anyhow!("build http client: {err}"))?;
        Ok(Self {
            client,
            endpoint: config.chat_completions_endpoint(),
            config,
        })
    }

    fn request_body(&self, request: &StructuredRequest) -> Value {
        serde_json::json!({
            "model": self.config.model,
            "messages": [
                { "role": "system", "content": request.system_instruction },
                { "role": "user", "content": request.user_message },
            ],
            "temperature": request.temperature.clamp(0.0, 1.0),
            "top_p": self.config.top_p,
            "max_tokens": request.max_tokens,
            "stream": false,
            "response_format": {
                "type": "json_schema",
                "json_schema": { "schema": request.schema.to_json_schema() },
            },
            "disable_search": !request.live_search,
            "return_search_results": request.live_search,
        })
    }
}

#[async_trait]
impl StructuredGenerator for ChatCompletionsGenerator {
    async fn generate(&self, request: &StructuredRequest) -> Result<Value, GenerationError> {
        let body = self.request_body(request);
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(GenerationError::Transport)?;

        let status = response.status();
        let raw = response.text().await.map_err(GenerationError::Transport)?;
        let head = excerpt(&raw);
        if self.config.log_bodies {
            tracing::info!(status = status.as_u16(), body_head = %head, "generation response");
        } else {
            tracing::debug!(status = status.as_u16(), body_head = %head, "generation response");
        }

        if !status.is_success() {
            return Err(GenerationError::Service {
                status: status.as_u16(),
                body_excerpt: head,
            });
        }

        let content = message_content(&raw).ok_or(GenerationError::EmptyResponse)?;
        extract_json(&content, request.schema.shape())
    }
}

fn message_content(raw_json: &str) -> Option<String> {
    let value: Value = serde_json::from_str(raw_json).ok()?;
    let content = value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()?;
    if content.trim().is_empty() {
        return None;
    }
    Some(content.to_owned())
}

fn excerpt(raw: &str) -> String {
    match raw.char_indices().nth(BODY_EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}…", &raw[..idx]),
        None => raw.to_owned(),
    }
}

/// Parse model output, recovering the outermost bracketed span when the
/// model wraps its JSON in prose or fences.
pub fn extract_json(text: &str, expected: Shape) -> Result<Value, GenerationError> {
    let direct_err = match serde_json::from_str::<Value>(text.trim()) {
        Ok(value) if expected.matches(&value) => return Ok(value),
        Ok(_) => format!("top-level value is not a {}", expected.describe()),
        Err(err) => err.to_string(),
    };

    let malformed = |detail: String| GenerationError::MalformedOutput {
        expected: expected.describe(),
        detail,
    };

    let Some((open, close)) = expected.brackets() else {
        return Err(malformed(direct_err));
    };
    let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) else {
        return Err(malformed(direct_err));
    };
    if end <= start {
        return Err(malformed(direct_err));
    }

    match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value) if expected.matches(&value) => Ok(value),
        Ok(_) => Err(malformed(format!(
            "recovered span is not a {}",
            expected.describe()
        ))),
        Err(err) => Err(malformed(err.to_string())),
    }
}
