use std::ffi::OsString;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest as _, Sha256};

use crate::config::FormatDirectives;
use crate::error::RenderError;

/// Explicit page break between the four blocks of a packet.
pub const PAGE_BREAK: &str = "\n\n\\newpage\n\n";

/// Join lesson, problems, solutions and sources in that order.
pub fn assemble(lesson: &str, problems: &str, solutions: &str, sources: &str) -> String {
    [lesson, problems, solutions, sources].join(PAGE_BREAK)
}

/// `{topic}_Packet_for_{grade}_{sha256(now)}.pdf`, with both labels reduced to
/// file-name-safe characters.
pub fn packet_file_name(topic: &str, grade_level: &str, now: DateTime<Utc>) -> String {
    let stamp = now.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let digest = hex::encode(Sha256::digest(stamp.as_bytes()));
    format!(
        "{}_Packet_for_{}_{digest}.pdf",
        file_label(topic),
        file_label(grade_level)
    )
}

fn file_label(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub file_name: String,
    pub file_path: PathBuf,
}

/// Turns assembled markup into a document on disk. Blocking.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        markup: &str,
        output: &Path,
        directives: &FormatDirectives,
    ) -> Result<(), RenderError>;
}

#[derive(Debug, Clone)]
pub struct PandocRenderer {
    program: String,
}

impl PandocRenderer {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn run(
        &self,
        markup: &str,
        output: &Path,
        directives: &FormatDirectives,
    ) -> Result<(), RenderError> {
        let mut input = tempfile::Builder::new()
            .prefix("studypack-")
            .suffix(".md")
            .tempfile()?;
        input.write_all(markup.as_bytes())?;
        input.flush()?;

        let header = if directives.header_includes.is_empty() {
            None
        } else {
            let mut header = tempfile::Builder::new()
                .prefix("studypack-header-")
                .suffix(".tex")
                .tempfile()?;
            header.write_all(directives.header_includes.join("\n").as_bytes())?;
            header.write_all(b"\n")?;
            header.flush()?;
            Some(header)
        };

        let args = build_pandoc_args(
            input.path(),
            output,
            directives,
            header.as_ref().map(|h| h.path()),
        );
        tracing::info!(
            pandoc = %self.program,
            pdf_engine = %directives.engine,
            out = %output.display(),
            "render via pandoc"
        );

        let result = match Command::new(&self.program).args(&args).output() {
            Ok(result) => result,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(RenderError::Unavailable {
                    program: self.program.clone(),
                });
            }
            Err(err) => return Err(RenderError::Io(err)),
        };

        if !result.status.success() {
            return Err(RenderError::Failed {
                status: result.status,
                log: String::from_utf8_lossy(&result.stderr).trim().to_owned(),
            });
        }
        Ok(())
    }
}

impl Renderer for PandocRenderer {
    fn render(
        &self,
        markup: &str,
        output: &Path,
        directives: &FormatDirectives,
    ) -> Result<(), RenderError> {
        let result = self.run(markup, output, directives);
        if result.is_err() {
            remove_partial_output(output);
        }
        result
    }
}

pub(crate) fn remove_partial_output(output: &Path) {
    match std::fs::remove_file(output) {
        Ok(()) => tracing::debug!(path = %output.display(), "removed partial output"),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => tracing::warn!(
            path = %output.display(),
            error = %err,
            "failed to remove partial output"
        ),
    }
}

fn build_pandoc_args(
    input: &Path,
    output: &Path,
    directives: &FormatDirectives,
    header: Option<&Path>,
) -> Vec<OsString> {
    let mut args = vec![
        input.as_os_str().to_owned(),
        OsString::from("-o"),
        output.as_os_str().to_owned(),
        OsString::from("--from"),
        OsString::from(&directives.input_format),
        OsString::from("--standalone"),
        OsString::from("-V"),
        OsString::from(format!("geometry:margin={}", directives.margin)),
        OsString::from(format!("--pdf-engine={}", directives.engine)),
    ];
    if let Some(header) = header {
        args.push(OsString::from("-H"));
        args.push(header.as_os_str().to_owned());
    }
    args
}
