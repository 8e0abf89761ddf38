use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;

use crate::assemble::{
    RenderedArtifact, Renderer, assemble, packet_file_name, remove_partial_output,
};
use crate::config::PipelineSettings;
use crate::error::PipelineError;
use crate::generator::StructuredGenerator;
use crate::lesson::{self, LessonRequest};
use crate::problems::{self, ProblemRequest};
use crate::sanitize::sanitize;
use crate::topics::{self, TopicBreakdown};

/// One end-user "make me a packet" action.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt_text: String,
    pub grade_level: String,
    pub subtopic_count_hint: Option<usize>,
    pub exercise_count: usize,
}

#[derive(Debug, Clone)]
pub struct CreatedPacket {
    pub breakdown: TopicBreakdown,
    pub file_name: String,
    pub file_path: PathBuf,
}

pub struct PacketPipeline {
    generator: Arc<dyn StructuredGenerator>,
    renderer: Arc<dyn Renderer>,
    settings: PipelineSettings,
}

impl PacketPipeline {
    pub fn new(
        generator: Arc<dyn StructuredGenerator>,
        renderer: Arc<dyn Renderer>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            generator,
            renderer,
            settings,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Free text in, rendered packet out. Failures are logged, never returned.
    pub async fn create(&self, request: &GenerationRequest) -> Option<CreatedPacket> {
        match self.try_create(request).await {
            Ok(created) => Some(created),
            Err(err) => {
                tracing::error!(?err, "packet creation failed");
                None
            }
        }
    }

    async fn try_create(&self, request: &GenerationRequest) -> Result<CreatedPacket, PipelineError> {
        let breakdown = topics::decompose(
            self.generator.as_ref(),
            &request.prompt_text,
            request.subtopic_count_hint,
        )
        .await
        .map_err(PipelineError::Topics)?;

        let artifact = self
            .build(
                &breakdown.main_topic,
                &breakdown.subtopics,
                &request.grade_level,
                request.exercise_count,
            )
            .await?;

        Ok(CreatedPacket {
            breakdown,
            file_name: artifact.file_name,
            file_path: artifact.file_path,
        })
    }

    /// Build a packet for an already decomposed topic. Returns the bare file
    /// name, or `None` after logging whatever went wrong.
    pub async fn search_topic(
        &self,
        topic: &str,
        subtopics: &[String],
        grade_level: &str,
        num_problems: usize,
    ) -> Option<String> {
        match self.build(topic, subtopics, grade_level, num_problems).await {
            Ok(artifact) => Some(artifact.file_name),
            Err(err) => {
                tracing::error!(topic, ?err, "packet build failed");
                None
            }
        }
    }

    pub async fn build(
        &self,
        topic: &str,
        subtopics: &[String],
        grade_level: &str,
        num_problems: usize,
    ) -> Result<RenderedArtifact, PipelineError> {
        let settings = &self.settings;
        let lesson_request = LessonRequest {
            topic: topic.to_owned(),
            subtopics: subtopics.to_vec(),
            grade_level: grade_level.to_owned(),
            max_sections: settings.max_sections(subtopics.len()),
            quiz_per_section: settings.quiz_per_section,
            max_tokens: settings.lesson_max_tokens,
            temperature: settings.temperature,
        };
        let problem_request = ProblemRequest {
            topic: topic.to_owned(),
            subtopics: subtopics.to_vec(),
            grade_level: grade_level.to_owned(),
            count: num_problems,
            max_tokens: settings.problems_max_tokens,
            temperature: settings.temperature,
        };

        tracing::info!(topic, grade_level, count = num_problems, "building packet");
        let generator = self.generator.as_ref();
        let (lesson, problems) = tokio::join!(
            lesson::synthesize(generator, &lesson_request),
            problems::source(generator, &problem_request),
        );
        let problems = problems?;

        let markup = assemble(
            &sanitize(&lesson.to_markdown()),
            &sanitize(&problems::questions_markup(&problems)),
            &sanitize(&problems::solutions_markup(&problems)),
            &sanitize(&problems::sources_markup(&problems)),
        );

        tokio::fs::create_dir_all(&settings.output_dir)
            .await
            .map_err(|source| PipelineError::OutputDir {
                path: settings.output_dir.display().to_string(),
                source,
            })?;
        let file_name = packet_file_name(topic, grade_level, Utc::now());
        let file_path = settings.output_dir.join(&file_name);

        let renderer = Arc::clone(&self.renderer);
        let directives = settings.directives.clone();
        let output = file_path.clone();
        let rendered =
            tokio::task::spawn_blocking(move || renderer.render(&markup, &output, &directives))
                .await?;
        if let Err(err) = rendered {
            remove_partial_output(&file_path);
            return Err(err.into());
        }

        tracing::info!(file_name = %file_name, "packet rendered");
        Ok(RenderedArtifact {
            file_name,
            file_path,
        })
    }
}
