use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    studypack::logging::init().context("init logging")?;

    let cli = studypack::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        studypack::cli::Command::Create(args) => {
            studypack::commands::create(args).await.context("create")?;
        }
        studypack::cli::Command::Packet(args) => {
            studypack::commands::packet(args).await.context("packet")?;
        }
        studypack::cli::Command::Sanitize(args) => {
            studypack::commands::sanitize(args).context("sanitize")?;
        }
        studypack::cli::Command::List(args) => {
            studypack::commands::list(args).await.context("list")?;
        }
        studypack::cli::Command::Visibility(args) => {
            studypack::commands::visibility(args)
                .await
                .context("visibility")?;
        }
    }

    Ok(())
}
