use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{AnalyzeArgs, DissectArgs, ExamplesArgs, ExtractArgs, PreviewArgs, ReplArgs};

#[derive(Parser)]
#[command(name = "insight")]
#[command(about = "Data Insight - LLM-assisted analysis of data files, query snippets and free text", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ~/.config/insight/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Secret file holding the inference token (defaults to ~/.config/insight/secret.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub secret_file: Option<PathBuf>,

    /// Inference token for this run only
    #[arg(long, global = true, value_name = "TOKEN")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Explain a data file, look for security issues and suggest visualizations
    Analyze(AnalyzeArgs),
    /// Show a parsed data file without calling the model
    Preview(PreviewArgs),
    /// Explain, optimize or reduce the cost of a query snippet
    Dissect(DissectArgs),
    /// Turn unstructured text into JSON
    Extract(ExtractArgs),
    /// Print the example snippet of each data management system
    Examples(ExamplesArgs),
    /// Interactive shell that keeps results between commands
    Repl(ReplArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match &cli.command {
        Commands::Analyze(args) => commands::analyze::run(&cli, args).await?,
        Commands::Preview(args) => commands::preview::run(&cli, args)?,
        Commands::Dissect(args) => commands::dissect::run(&cli, args).await?,
        Commands::Extract(args) => commands::extract::run(&cli, args).await?,
        Commands::Examples(args) => commands::examples::run(args),
        Commands::Repl(args) => commands::repl::run(&cli, args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_sample_analysis() {
        let cli = Cli::try_parse_from(["insight", "analyze", "--sample", "parquet"]).unwrap();
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(
                    args.input.sample,
                    Some(insight_core::artifact::FileFormat::Parquet)
                );
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn parses_repl() {
        let cli = Cli::try_parse_from(["insight", "repl"]).unwrap();
        assert!(matches!(cli.command, Commands::Repl(_)));
    }

    #[test]
    fn path_and_sample_conflict() {
        let parsed = Cli::try_parse_from([
            "insight", "preview", "--path", "a.csv", "--sample", "csv",
        ]);
        assert!(parsed.is_err());
    }
}
