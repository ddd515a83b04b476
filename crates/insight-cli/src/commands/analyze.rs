use super::context::AppContext;
use super::input::{ArtifactArgs, write_download};
use crate::Cli;
use anyhow::Result;
use clap::Args;
use insight_application::{AnalysisSession, Report, SectionOutcome};
use std::path::PathBuf;

const PREVIEW_CHARS: usize = 2000;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: ArtifactArgs,

    /// Directory the report document is written to
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

pub async fn run(cli: &Cli, args: &AnalyzeArgs) -> Result<()> {
    let context = AppContext::build(cli).await?;
    execute(&context, &mut AnalysisSession::new(), args).await
}

/// Analyzes within `session`; sections already generated for the same file
/// are replayed.
pub async fn execute(
    context: &AppContext,
    session: &mut AnalysisSession,
    args: &AnalyzeArgs,
) -> Result<()> {
    let artifact = args.input.artifact()?;
    let service = context.file_analysis();

    let analysis = match service.analyze(session, &artifact).await {
        Ok(analysis) => analysis,
        Err(err) if err.is_not_found() => {
            tracing::warn!(error = %err, "Sample data unavailable");
            eprintln!("Warning: {err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    println!("{}\n", analysis.preview.table.to_text_preview(PREVIEW_CHARS));
    print_report(&analysis.report);

    match (&analysis.document, &args.out) {
        (Some(document), Some(dir)) => {
            let target = write_download(dir, &document.file_name, &document.bytes)?;
            println!("Report written to {}", target.display());
        }
        (Some(document), None) => {
            println!("Pass --out <DIR> to save the report as {}", document.file_name);
        }
        (None, _) => {}
    }
    Ok(())
}

pub fn print_report(report: &Report) {
    for entry in &report.entries {
        println!("### {}", entry.heading);
        match &entry.outcome {
            SectionOutcome::Generated(text) | SectionOutcome::Replayed(text) => {
                println!("{text}\n")
            }
            SectionOutcome::Failed(message) => eprintln!("{message}\n"),
        }
    }
}
