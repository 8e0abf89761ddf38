use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use crate::assemble::PandocRenderer;
use crate::cli::{CreateArgs, ListArgs, PacketArgs, SanitizeArgs, VisibilityArgs};
use crate::config::{GeneratorConfig, PipelineSettings, RenderConfig};
use crate::generator::ChatCompletionsGenerator;
use crate::library::{LocalFsPacketLibrary, PacketLibrary as _, PacketRecord};
use crate::packet::{GenerationRequest, PacketPipeline};

fn pipeline_from_env(out_dir: &str) -> anyhow::Result<PacketPipeline> {
    let generator_config = GeneratorConfig::from_env().context("load generator config")?;
    generator_config
        .assert_api_key()
        .context("check generator credentials")?;
    tracing::debug!(config = ?generator_config, "generator config");
    let render_config = RenderConfig::from_env();

    let generator = ChatCompletionsGenerator::new(generator_config)?;
    let renderer = PandocRenderer::new(render_config.pandoc);
    let mut settings = PipelineSettings::new(out_dir);
    settings.directives = render_config.directives;

    Ok(PacketPipeline::new(
        Arc::new(generator),
        Arc::new(renderer),
        settings,
    ))
}

pub async fn create(args: CreateArgs) -> anyhow::Result<()> {
    let pipeline = pipeline_from_env(&args.out_dir)?;
    let request = GenerationRequest {
        prompt_text: args.prompt,
        grade_level: args.grade_level.clone(),
        subtopic_count_hint: args.subtopics_hint,
        exercise_count: args.problems,
    };

    let Some(created) = pipeline.create(&request).await else {
        anyhow::bail!("packet generation failed; see log for details");
    };

    let library = LocalFsPacketLibrary::new(&args.out_dir);
    let record = PacketRecord::new(
        created.breakdown.main_topic.clone(),
        created.breakdown.subtopics.clone(),
        args.grade_level,
        args.problems,
        created.file_path.clone(),
        args.public,
    );
    library.record(&record).await.context("record packet")?;

    print_json(&serde_json::json!({
        "status": "ok",
        "id": record.id,
        "pdf_path": created.file_path,
        "main_topic": created.breakdown.main_topic,
        "subtopics": created.breakdown.subtopics,
    }))
}

pub async fn packet(args: PacketArgs) -> anyhow::Result<()> {
    let pipeline = pipeline_from_env(&args.out_dir)?;
    let Some(file_name) = pipeline
        .search_topic(&args.topic, &args.subtopics, &args.grade_level, args.problems)
        .await
    else {
        anyhow::bail!("packet generation failed; see log for details");
    };

    print_json(&serde_json::json!({
        "status": "ok",
        "pdf_path": Path::new(&args.out_dir).join(file_name),
    }))
}

pub fn sanitize(args: SanitizeArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("read input: {}", args.input))?;
    let cleaned = if args.item {
        crate::sanitize::sanitize_item(&raw)
    } else {
        crate::sanitize::sanitize(&raw)
    };
    tracing::info!(
        input = %args.input,
        out = %args.out,
        bytes_in = raw.len(),
        bytes_out = cleaned.len(),
        "sanitized"
    );

    if let Some(parent) = Path::new(&args.out).parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir: {}", parent.display()))?;
    }
    let mut options = OpenOptions::new();
    options.write(true);
    if args.force {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }
    let mut file = options
        .open(&args.out)
        .with_context(|| format!("open output: {}", args.out))?;
    file.write_all(cleaned.as_bytes())
        .with_context(|| format!("write output: {}", args.out))?;
    file.flush()
        .with_context(|| format!("flush output: {}", args.out))?;
    Ok(())
}

pub async fn list(args: ListArgs) -> anyhow::Result<()> {
    let library = LocalFsPacketLibrary::new(&args.out_dir);
    let records = if args.public {
        library.list_public().await?
    } else {
        library.list().await?
    };
    print_json(&records)
}

pub async fn visibility(args: VisibilityArgs) -> anyhow::Result<()> {
    let library = LocalFsPacketLibrary::new(&args.out_dir);
    let Some(record) = library.set_visibility(&args.id, args.public).await? else {
        anyhow::bail!("packet not found: {}", args.id);
    };
    print_json(&record)
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}
