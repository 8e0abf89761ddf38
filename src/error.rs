use std::process::ExitStatus;

use thiserror::Error;

/// A single structured-generation call failed.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("request to generation service failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("generation service returned {status}: {body_excerpt}")]
    Service { status: u16, body_excerpt: String },

    #[error("generation service returned no content")]
    EmptyResponse,

    /// Content was returned but no JSON of the expected shape could be recovered.
    #[error("generation output is not valid {expected}: {detail}")]
    MalformedOutput {
        expected: &'static str,
        detail: String,
    },
}

#[derive(Debug, Error)]
#[error("{}", describe_validation(.reason, .item_index))]
pub struct ValidationError {
    pub reason: String,
    /// 1-based index of the offending item, when one item is at fault.
    pub item_index: Option<usize>,
}

impl ValidationError {
    pub fn batch(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            item_index: None,
        }
    }

    pub fn item(index: usize, reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            item_index: Some(index),
        }
    }
}

fn describe_validation(reason: &str, item_index: &Option<usize>) -> String {
    match item_index {
        Some(idx) => format!("item {idx}: {reason}"),
        None => reason.to_owned(),
    }
}

/// Failure surface of the problem sourcer: it never degrades.
#[derive(Debug, Error)]
pub enum SourcingError {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("practice problems rejected: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("renderer `{program}` is not available")]
    Unavailable { program: String },

    #[error("renderer exited with {status}: {log}")]
    Failed { status: ExitStatus, log: String },

    #[error("renderer i/o: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is missing or empty")]
    MissingApiKey { var: &'static str },

    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("topic breakdown: {0}")]
    Topics(#[source] GenerationError),

    #[error("practice problems: {0}")]
    Problems(#[from] SourcingError),

    #[error("render: {0}")]
    Render(#[from] RenderError),

    #[error("output directory {path}: {source}")]
    OutputDir {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("render task: {0}")]
    Join(#[from] tokio::task::JoinError),
}
