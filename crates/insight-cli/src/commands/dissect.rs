use super::analyze::print_report;
use super::context::AppContext;
use super::input::read_text;
use crate::Cli;
use anyhow::Result;
use clap::Args;
use insight_application::{AnalysisSession, CodeInput, CodeTask, SectionOutcome};
use insight_core::catalog::Dialect;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct DissectArgs {
    /// Data management system the code is written for
    #[arg(long, default_value_t = Dialect::Sql)]
    pub dialect: Dialect,

    /// Code snippet; the dialect's example is used when neither --code nor --file is given
    #[arg(long, conflicts_with = "file")]
    pub code: Option<String>,

    /// File holding the code snippet
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Extra observations passed to the model
    #[arg(long, default_value = "")]
    pub observations: String,

    /// Single task to run (explain, optimize, reduce-cost); all three when omitted
    #[arg(long)]
    pub task: Option<CodeTask>,
}

pub async fn run(cli: &Cli, args: &DissectArgs) -> Result<()> {
    let context = AppContext::build(cli).await?;
    execute(&context, &mut AnalysisSession::new(), args).await
}

pub async fn execute(
    context: &AppContext,
    session: &mut AnalysisSession,
    args: &DissectArgs,
) -> Result<()> {
    let code = read_text(args.code.as_deref(), args.file.as_deref())?;
    let input = CodeInput::new(args.dialect, code).with_observations(args.observations.clone());
    let service = context.code_dissection();

    println!("```\n{}\n```\n", input.effective_code());
    match args.task {
        Some(task) => {
            println!("### {}", task.section().heading());
            match service.generate(session, &input, task).await {
                SectionOutcome::Generated(text) | SectionOutcome::Replayed(text) => {
                    println!("{text}")
                }
                SectionOutcome::Failed(message) => eprintln!("{message}"),
            }
        }
        None => print_report(&service.generate_all(session, &input).await),
    }
    Ok(())
}
