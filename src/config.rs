use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.perplexity.ai";
pub const DEFAULT_MODEL: &str = "sonar-pro";
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;

const API_KEY_VARS: [&str; 2] = ["PERPLEXITY_API_KEY", "PPLX_API_KEY"];

/// Connection settings for the text-generation service.
#[derive(Clone)]
pub struct GeneratorConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
    pub top_p: f32,
    /// Log response status and body head at `info` instead of `debug`.
    pub log_bodies: bool,
}

impl std::fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("top_p", &self.top_p)
            .field("log_bodies", &self.log_bodies)
            .finish()
    }
}

impl GeneratorConfig {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: DEFAULT_MODEL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            top_p: 0.9,
            log_bodies: false,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = first_api_key(|var| std::env::var(var).ok());
        let base_url =
            std::env::var("STUDYPACK_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_owned());

        let mut config = Self::new(api_key, base_url);
        if let Ok(model) = std::env::var("STUDYPACK_MODEL")
            && !model.trim().is_empty()
        {
            config.model = model.trim().to_owned();
        }
        if let Ok(raw) = std::env::var("STUDYPACK_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| ConfigError::InvalidValue {
                    var: "STUDYPACK_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
            config.timeout = Duration::from_secs(secs);
        }
        config.log_bodies = std::env::var("STUDYPACK_LOG_BODIES")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(config)
    }

    /// Run once at startup so a missing key fails before any request starts.
    pub fn assert_api_key(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey {
                var: API_KEY_VARS[0],
            });
        }
        Ok(())
    }

    pub fn chat_completions_endpoint(&self) -> String {
        let base_url = self.base_url.trim_end_matches('/');
        format!("{base_url}/chat/completions")
    }
}

fn first_api_key(lookup: impl Fn(&str) -> Option<String>) -> String {
    API_KEY_VARS
        .iter()
        .filter_map(|&var| lookup(var))
        .find(|value| !value.trim().is_empty())
        .unwrap_or_default()
}

/// Directives handed to the renderer alongside the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatDirectives {
    pub margin: String,
    pub engine: String,
    pub header_includes: Vec<String>,
    pub input_format: String,
}

impl Default for FormatDirectives {
    fn default() -> Self {
        Self {
            margin: "1in".to_owned(),
            engine: "xelatex".to_owned(),
            header_includes: Vec::new(),
            input_format: "markdown+raw_tex+tex_math_dollars+tex_math_single_backslash".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub pandoc: String,
    pub directives: FormatDirectives,
}

impl RenderConfig {
    pub fn from_env() -> Self {
        let mut directives = FormatDirectives::default();
        if let Ok(engine) = std::env::var("STUDYPACK_PDF_ENGINE") {
            directives.engine = engine;
        }
        if let Ok(margin) = std::env::var("STUDYPACK_MARGIN") {
            directives.margin = margin;
        }
        if let Ok(raw) = std::env::var("STUDYPACK_HEADER_INCLUDES") {
            directives.header_includes = parse_header_includes(&raw);
        }
        Self {
            pandoc: std::env::var("STUDYPACK_PANDOC").unwrap_or_else(|_| "pandoc".to_owned()),
            directives,
        }
    }
}

/// One LaTeX preamble line per non-blank line of `raw`.
pub fn parse_header_includes(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Knobs for one packet build.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub output_dir: PathBuf,
    pub quiz_per_section: usize,
    /// Sections allowed beyond one per subtopic.
    pub extra_sections: usize,
    pub lesson_max_tokens: u32,
    pub problems_max_tokens: u32,
    pub temperature: f32,
    pub directives: FormatDirectives,
}

impl PipelineSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            quiz_per_section: 3,
            extra_sections: 2,
            lesson_max_tokens: 8000,
            problems_max_tokens: 8000,
            temperature: 0.2,
            directives: FormatDirectives::default(),
        }
    }

    pub fn max_sections(&self, subtopic_count: usize) -> usize {
        subtopic_count + self.extra_sections
    }
}
