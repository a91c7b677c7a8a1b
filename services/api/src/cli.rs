use crate::server;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use grant_intake::error::AppError;
use grant_intake::workflows::submission::{
    compose, form_from_submission, ApplicationId, ApplicationRecord, ApplicationSubmission,
};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

#[derive(Parser, Debug)]
#[command(
    name = "Grant Intake",
    about = "Receive, store, and render grant applications",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Validate a submission payload and write the printable markup it would produce
    Preview(PreviewArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct PreviewArgs {
    /// JSON submission payload, as posted to /api/submit
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Where to write the HTML (stdout when omitted)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Preview(args) => run_preview(args).await,
    }
}

async fn run_preview(args: PreviewArgs) -> Result<(), AppError> {
    let raw = tokio::fs::read(&args.input).await?;
    let markup = preview_markup(&raw)?;

    match args.output {
        Some(path) => {
            tokio::fs::write(&path, markup).await?;
            println!("Preview written to {}", path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(markup.as_bytes()).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

/// Validate a payload and compose it as if it had just been stored.
pub(crate) fn preview_markup(raw: &[u8]) -> Result<String, AppError> {
    let submission: ApplicationSubmission = serde_json::from_slice(raw)?;
    let form = form_from_submission(submission)?;
    let now = Utc::now();
    let record = ApplicationRecord {
        id: ApplicationId::generate(),
        created_at: now,
        updated_at: now,
        form,
    };
    Ok(compose(&record)?.markup)
}
