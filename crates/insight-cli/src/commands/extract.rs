use super::context::AppContext;
use super::input::{read_text, write_download};
use crate::Cli;
use anyhow::Result;
use clap::Args;
use insight_application::{AnalysisSession, ExtractionOutcome};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Text to convert; an example sentence is used when neither --text nor --file is given
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File holding the text
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Directory data.json is written to
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,
}

pub async fn run(cli: &Cli, args: &ExtractArgs) -> Result<()> {
    let context = AppContext::build(cli).await?;
    execute(&context, &mut AnalysisSession::new(), args).await
}

pub async fn execute(
    context: &AppContext,
    session: &mut AnalysisSession,
    args: &ExtractArgs,
) -> Result<()> {
    let text = read_text(args.text.as_deref(), args.file.as_deref())?;
    let service = context.text_to_json();

    let outcome = service.extract(session, &text).await;
    match &outcome {
        ExtractionOutcome::Structured { pretty, .. } => println!("{pretty}"),
        ExtractionOutcome::Raw { text, notice } => {
            eprintln!("{notice}");
            println!("{text}");
        }
        ExtractionOutcome::Failed(message) => eprintln!("{message}"),
    }

    if let (Some(download), Some(dir)) = (outcome.download(), &args.out) {
        let target = write_download(dir, &download.file_name, &download.bytes)?;
        println!("JSON written to {}", target.display());
    }
    Ok(())
}
